// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

use crate::vision::{DetectorError, ImageError};

/// Endpoints listed in 404 responses
pub const AVAILABLE_ENDPOINTS: &[&str] = &["/", "/health", "/predict"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<Vec<String>>,
}

/// Every failure a request can end in. Client errors are 4xx, processing
/// errors 5xx.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Malformed upload, rejected before decoding
    Validation(String),
    /// Upload body over the configured byte limit
    PayloadTooLarge { limit: usize },
    /// Bytes passed validation but are not a decodable image
    Decode(String),
    /// Model failed on a decoded image
    Inference(String),
    /// Wrong verb on a known route
    MethodNotAllowed { path: String, allowed: String },
    NotFound(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Decode(_) | ApiError::Inference(_) => 500,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::NotFound(_) => 404,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Stable machine-readable kind
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::Decode(_) => "decode_error",
            ApiError::Inference(_) => "inference_error",
            ApiError::MethodNotAllowed { .. } => "method_not_allowed",
            ApiError::NotFound(_) => "not_found",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error, message, available_endpoints) = match self {
            ApiError::Validation(msg)
            | ApiError::Decode(msg)
            | ApiError::Inference(msg)
            | ApiError::ServiceUnavailable(msg) => (msg.clone(), None, None),
            ApiError::PayloadTooLarge { limit } => (
                "Image too large".to_string(),
                Some(format!("Uploads are limited to {} bytes", limit)),
                None,
            ),
            ApiError::MethodNotAllowed { path, allowed } => (
                "Method not allowed".to_string(),
                Some(format!(
                    "Use {} {} with multipart/form-data containing an 'image' file field",
                    allowed, path
                )),
                None,
            ),
            ApiError::NotFound(path) => (
                "Not found".to_string(),
                Some(format!("The requested URL {} was not found on this server", path)),
                Some(AVAILABLE_ENDPOINTS.iter().map(|e| e.to_string()).collect()),
            ),
        };

        ErrorResponse {
            error,
            error_type: self.error_type().to_string(),
            message,
            available_endpoints,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::PayloadTooLarge { limit } => {
                write!(f, "Upload exceeds the {} byte limit", limit)
            }
            ApiError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ApiError::Inference(msg) => write!(f, "Inference error: {}", msg),
            ApiError::MethodNotAllowed { path, allowed } => {
                write!(f, "Method not allowed on {} (use {})", path, allowed)
            }
            ApiError::NotFound(path) => write!(f, "Not found: {}", path),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Client errors are logged where they are detected
        if !self.is_client_error() {
            error!("Request failed with {}: {}", self.status_code(), self);
        }
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::EmptyData => ApiError::Validation("Uploaded image is empty".to_string()),
            ImageError::TooLarge(_, limit) => ApiError::PayloadTooLarge { limit },
            other => ApiError::Decode(other.to_string()),
        }
    }
}

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        ApiError::Inference(err.to_string())
    }
}
