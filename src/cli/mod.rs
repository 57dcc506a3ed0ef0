// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analyze;
pub mod detect;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::api::{run_prediction, PredictResponse};
use crate::vision::{AnnotationRenderer, YoloConfig, YoloDetector, MAX_IMAGE_SIZE};

/// Facial palsy detection CLI
#[derive(Parser, Debug)]
#[command(name = "palsy-cli")]
#[command(version)]
#[command(about = "Offline tools for the facial palsy detection model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run detection on a local image
    Detect(detect::DetectArgs),

    /// Run detection and request a narrative severity analysis
    Analyze(analyze::AnalyzeArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect(args) => detect::run_detect(args).await,
        Commands::Analyze(args) => analyze::run_analyze(args).await,
    }
}

/// Load the model and run the prediction pipeline on one file
pub(crate) async fn predict_file(
    image_path: &Path,
    model_path: &Path,
    confidence: f32,
    renderer: Option<AnnotationRenderer>,
) -> Result<PredictResponse> {
    let bytes = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let model_path: PathBuf = model_path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<PredictResponse> {
        let detector = YoloDetector::load(&model_path, YoloConfig::default())?;
        let response = run_prediction(
            &detector,
            renderer.as_ref(),
            &bytes,
            confidence,
            MAX_IMAGE_SIZE,
        )?;
        Ok(response)
    })
    .await
    .context("Prediction task failed")?
}
