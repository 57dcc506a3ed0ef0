// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection model interface
//!
//! The HTTP layer only sees `Arc<dyn Detector>`, so tests can inject a
//! detector returning canned detections without loading model weights.

use image::RgbImage;
use thiserror::Error;

/// One detection as produced by the model, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Model class index
    pub class_index: usize,
    /// Detection score (0.0-1.0)
    pub confidence: f32,
    /// [x1, y1, x2, y2] in original-image pixel coordinates
    pub bbox: Option<[f32; 4]>,
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),
}

/// A loaded detection model.
///
/// Implementations are loaded once and shared read-only across requests.
/// `detect` returns an empty list when nothing clears the threshold.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, DetectorError>;

    /// Short model name for logs and health output
    fn name(&self) -> &str;
}
