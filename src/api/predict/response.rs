// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction response types

use serde::{Deserialize, Serialize};

use crate::vision::{Detection, DetectionSummary};

/// Dimensions of the decoded upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Response from POST /predict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Detections above the confidence threshold, in model order
    pub predictions: Vec<Detection>,
    /// Per-tier counts
    pub summary: DetectionSummary,
    /// Base64 PNG with boxes drawn; absent when annotation is disabled,
    /// empty when encoding failed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub annotated_image: Option<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    pub image: ImageDimensions,
}

impl PredictResponse {
    pub fn new(
        predictions: Vec<Detection>,
        summary: DetectionSummary,
        annotated_image: Option<String>,
        processing_time_ms: u64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            predictions,
            summary,
            annotated_image,
            processing_time_ms,
            image: ImageDimensions { width, height },
        }
    }
}
