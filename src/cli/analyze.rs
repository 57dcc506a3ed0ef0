// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::predict_file;
use crate::config::{NarrativeConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MODEL_PATH};
use crate::vision::NarrativeClient;

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image to analyze
    #[arg(long)]
    pub image: PathBuf,

    /// ONNX model weights
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Minimum detection confidence
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f32,

    /// Text-generation API key (falls back to NARRATIVE_API_KEY / XAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

/// Detect, then ask the text-generation API to interpret the detections
pub async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = NarrativeConfig::from_env();
    if let Some(key) = args.api_key {
        config.api_key = Some(key);
    }
    config.validate()?;

    let client = NarrativeClient::new(&config)?;

    let response = predict_file(&args.image, &args.model, args.confidence, None).await?;
    info!(
        "Requesting analysis of {} detections from {}",
        response.predictions.len(),
        client.model()
    );

    let report = client.report(response.predictions).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
