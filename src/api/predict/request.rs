// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction and validation for /predict

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_extra::extract::{multipart::MultipartError, Multipart};

use crate::api::errors::ApiError;
use crate::vision::image_utils::is_image_content_type;

/// Form field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image";

/// The `image` part of a multipart upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl ImageUpload {
    /// Read the first `image` field from the form; other fields are skipped.
    ///
    /// `max_bytes` is the body limit the router enforces, reported back when
    /// the upload trips it.
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_bytes: usize,
    ) -> Result<Option<Self>, ApiError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| read_error(e, "Invalid multipart body", max_bytes))?
        {
            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }

            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| read_error(e, "Failed to read image field", max_bytes))?;

            return Ok(Some(Self {
                file_name,
                content_type,
                data,
            }));
        }

        Ok(None)
    }

    /// Filename, then content type, then payload
    pub fn validate(&self) -> Result<(), ApiError> {
        let file_name = self.file_name.as_deref().unwrap_or("").trim();
        if file_name.is_empty() {
            return Err(ApiError::Validation("No image file selected".to_string()));
        }

        let content_type = self.content_type.as_deref().unwrap_or("");
        if !is_image_content_type(content_type) {
            let shown = if content_type.is_empty() {
                "unknown"
            } else {
                content_type
            };
            return Err(ApiError::Validation(format!(
                "Invalid file type '{}'. Please upload an image",
                shown
            )));
        }

        if self.data.is_empty() {
            return Err(ApiError::Validation("Uploaded image is empty".to_string()));
        }

        Ok(())
    }
}

fn read_error(err: MultipartError, context: &str, max_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit: max_bytes }
    } else {
        ApiError::Validation(format!("{}: {}", context, err.body_text()))
    }
}
