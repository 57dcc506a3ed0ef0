// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Environment-driven configuration for the prediction server and the
//! narrative analysis client

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::vision::image_utils::MAX_IMAGE_SIZE;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;

pub const DEFAULT_NARRATIVE_API_URL: &str = "https://api.x.ai/v1/chat/completions";
pub const DEFAULT_NARRATIVE_MODEL: &str = "grok-beta";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("CONFIDENCE_THRESHOLD must be within [0, 1], got {0}")]
    InvalidConfidenceThreshold(f32),

    #[error("IOU_THRESHOLD must be within (0, 1], got {0}")]
    InvalidIouThreshold(f32),

    #[error("MODEL_INPUT_SIZE must be a positive multiple of 32, got {0}")]
    InvalidInputSize(u32),

    #[error("MAX_UPLOAD_BYTES must be greater than 0")]
    InvalidUploadLimit,

    #[error("Narrative API key not set (NARRATIVE_API_KEY or XAI_API_KEY)")]
    MissingApiKey,
}

/// Prediction server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
    /// Bind address; all interfaces
    pub host: IpAddr,
    /// ONNX weights of the detection model
    pub model_path: PathBuf,
    /// Minimum score for a detection to be reported
    pub confidence_threshold: f32,
    /// NMS IoU threshold
    pub iou_threshold: f32,
    /// Square model input size
    pub model_input_size: u32,
    /// Whether `/predict` returns an annotated image
    pub annotate_predictions: bool,
    /// Caption font override; the embedded font is used when unset
    pub annotation_font_path: Option<PathBuf>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            model_input_size: DEFAULT_MODEL_INPUT_SIZE,
            annotate_predictions: true,
            annotation_font_path: None,
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PORT`: listening port (default: 5000)
    /// - `MODEL_PATH`: ONNX weights (default: best.onnx)
    /// - `CONFIDENCE_THRESHOLD`: default 0.6
    /// - `IOU_THRESHOLD`: default 0.7
    /// - `MODEL_INPUT_SIZE`: default 640
    /// - `ANNOTATE_PREDICTIONS`: true/false (default: true)
    /// - `ANNOTATION_FONT_PATH`: caption font override (default: embedded DejaVu Sans)
    /// - `MAX_UPLOAD_BYTES`: default 10MB
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            host: defaults.host,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            confidence_threshold: lookup("CONFIDENCE_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.confidence_threshold),
            iou_threshold: lookup("IOU_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.iou_threshold),
            model_input_size: lookup("MODEL_INPUT_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.model_input_size),
            annotate_predictions: lookup("ANNOTATE_PREDICTIONS")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.annotate_predictions),
            annotation_font_path: lookup("ANNOTATION_FONT_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .or(defaults.annotation_font_path),
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(
                self.confidence_threshold,
            ));
        }
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            return Err(ConfigError::InvalidIouThreshold(self.iou_threshold));
        }
        if self.model_input_size == 0 || self.model_input_size % 32 != 0 {
            return Err(ConfigError::InvalidInputSize(self.model_input_size));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidUploadLimit);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Text-generation API used for narrative severity analysis
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// Chat-completions endpoint
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_NARRATIVE_API_URL.to_string(),
            model: DEFAULT_NARRATIVE_MODEL.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl NarrativeConfig {
    /// Load configuration from environment variables
    ///
    /// `NARRATIVE_API_KEY` takes precedence over `XAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            api_url: lookup("NARRATIVE_API_URL").unwrap_or(defaults.api_url),
            model: lookup("NARRATIVE_MODEL").unwrap_or(defaults.model),
            api_key: lookup("NARRATIVE_API_KEY")
                .or_else(|| lookup("XAI_API_KEY"))
                .filter(|k| !k.trim().is_empty()),
            timeout_secs: lookup("NARRATIVE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
