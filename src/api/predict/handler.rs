// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::request::ImageUpload;
use super::response::PredictResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::image_utils::decode_image_bytes_with_limit;
use crate::vision::{normalize, summarize, AnnotationRenderer, Detector};

/// POST /predict - Detect palsy indicators in an uploaded face image
///
/// # Request
/// `multipart/form-data` with an `image` file field.
///
/// # Response
/// - `predictions`: `[{class, confidence, bbox: [x1, y1, x2, y2]}]`
/// - `summary`: counts per severity tier and the worst tier seen
/// - `annotated_image`: base64 PNG (only when annotation is enabled)
/// - `processing_time_ms`, `image: {width, height}`
///
/// # Errors
/// - 400 Bad Request: not multipart, missing/empty file, non-image content type
/// - 413 Payload Too Large: body over `MAX_UPLOAD_BYTES`
/// - 503 Service Unavailable: detection model not loaded
/// - 500 Internal Server Error: decode or inference failure
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    // 1. Validate request
    let multipart = multipart.map_err(|e| {
        warn!("Predict request rejected: {}", e);
        ApiError::Validation(
            "Request must be multipart/form-data with an 'image' file field".to_string(),
        )
    })?;

    let upload = ImageUpload::from_multipart(multipart, state.max_upload_bytes)
        .await
        .map_err(|e| {
            warn!("Failed to read upload: {}", e);
            e
        })?
        .ok_or_else(|| {
            warn!("Predict request without image field");
            ApiError::Validation("No image file provided".to_string())
        })?;

    if let Err(e) = upload.validate() {
        warn!("Predict validation failed: {}", e);
        return Err(e);
    }

    debug!(
        "Received {:?} ({:?}, {} bytes)",
        upload.file_name,
        upload.content_type,
        upload.data.len()
    );

    // 2. Model must be loaded
    let detector = state.detector.clone().ok_or_else(|| {
        warn!("Detection model not loaded");
        ApiError::ServiceUnavailable("Detection model not loaded".to_string())
    })?;

    // 3. Decode, infer, render off the async runtime
    let renderer = state.renderer.clone();
    let threshold = state.confidence_threshold;
    let max_bytes = state.max_upload_bytes;

    let response = tokio::task::spawn_blocking(move || {
        run_prediction(
            detector.as_ref(),
            renderer.as_deref(),
            &upload.data,
            threshold,
            max_bytes,
        )
    })
    .await
    .map_err(|e| ApiError::Inference(format!("Prediction task failed: {}", e)))??;

    info!(
        "Prediction complete: {} detections, {}ms",
        response.predictions.len(),
        response.processing_time_ms
    );

    Ok(Json(response))
}

/// Decode, detect, normalize and optionally annotate one image.
///
/// Blocking; callers on an async runtime should use `spawn_blocking`.
pub fn run_prediction(
    detector: &dyn Detector,
    renderer: Option<&AnnotationRenderer>,
    bytes: &[u8],
    confidence_threshold: f32,
    max_bytes: usize,
) -> Result<PredictResponse, ApiError> {
    let start = Instant::now();

    let (image, info) = decode_image_bytes_with_limit(bytes, max_bytes)?;
    debug!(
        "Decoded {:?} image: {}x{} from {} bytes",
        info.format, info.width, info.height, info.size_bytes
    );

    let raw = detector.detect(&image, confidence_threshold)?;
    let predictions = normalize(&raw, confidence_threshold);
    let summary = summarize(&predictions);

    let annotated_image = renderer.map(|r| match r.render_base64(&image, &predictions) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!("Failed to encode annotated image: {}", e);
            String::new()
        }
    });

    Ok(PredictResponse::new(
        predictions,
        summary,
        annotated_image,
        start.elapsed().as_millis() as u64,
        info.width,
        info.height,
    ))
}
