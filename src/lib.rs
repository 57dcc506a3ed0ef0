// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod version;
pub mod vision;

pub use api::{create_app, ApiError, AppState, PredictResponse};
pub use config::{ConfigError, NarrativeConfig, ServerConfig};
pub use vision::{
    AnnotationRenderer, Detection, DetectionSummary, Detector, DetectorError, PalsyLabel,
    RawDetection, SeverityTier, YoloDetector,
};
