// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::predict_file;
use crate::config::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MODEL_PATH};
use crate::vision::AnnotationRenderer;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Image to analyze
    #[arg(long)]
    pub image: PathBuf,

    /// ONNX model weights
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Minimum detection confidence
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f32,

    /// Write the annotated image (PNG) here
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Caption font (defaults to the embedded font)
    #[arg(long, env = "ANNOTATION_FONT_PATH")]
    pub font: Option<PathBuf>,
}

/// Detect palsy indicators in a local image and print the JSON result
pub async fn run_detect(args: DetectArgs) -> Result<()> {
    let renderer = args
        .output
        .as_ref()
        .map(|_| AnnotationRenderer::from_font_path(args.font.as_deref()));

    let mut response = predict_file(&args.image, &args.model, args.confidence, renderer).await?;

    if let (Some(output), Some(encoded)) = (&args.output, response.annotated_image.take()) {
        let png = STANDARD
            .decode(encoded)
            .context("Annotated image is not valid base64")?;
        std::fs::write(output, png)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Annotated image written to {}", output.display());
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
