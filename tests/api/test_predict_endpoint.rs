// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Prediction endpoint tests for POST /predict
//!
//! These tests drive the full router with a stub detector and verify:
//! - Request validation order and 400 messages
//! - Filtering of predictions by confidence and box shape
//! - Annotated image presence and content
//! - Mapping of decode/inference failures to 500 and a missing model to 503
//! - Bodies over the upload limit mapped to 413

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use palsy_detect::{
    api::{create_app, AppState},
    vision::{encode_png_base64, Detector},
};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use crate::common::{
    body_json, mixed_detections, multipart_request, png_bytes, raw, state_with, test_image,
    FailingDetector, Part, StubDetector,
};

#[cfg(test)]
mod predict_endpoint_tests {
    use super::*;

    // =============================================================================
    // Success path
    // =============================================================================

    /// Test 1: Valid PNG returns filtered predictions and image dimensions
    #[tokio::test]
    async fn test_predict_returns_filtered_predictions() {
        let detector = Arc::new(StubDetector::new(mixed_detections()));
        let app = create_app(state_with(detector.clone(), true));

        let png = png_bytes(200, 150);
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let predictions = json["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);

        assert_eq!(predictions[0]["class"], "Normal_Eyes");
        assert_eq!(predictions[0]["bbox"], serde_json::json!([10, 12, 80, 60]));
        assert_eq!(predictions[1]["class"], "StrongPalsy_Mouth");

        for p in predictions {
            assert!(p["confidence"].as_f64().unwrap() >= 0.6);
            let bbox: Vec<i64> = p["bbox"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_i64().unwrap())
                .collect();
            assert!(bbox[0] < bbox[2]);
            assert!(bbox[1] < bbox[3]);
        }

        assert_eq!(json["image"]["width"], 200);
        assert_eq!(json["image"]["height"], 150);
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["summary"]["overall"], "severe");
        assert!(json["processing_time_ms"].is_u64());
        assert_eq!(detector.calls(), 1);
    }

    /// Test 2: Annotated image is a decodable PNG of the same size
    #[tokio::test]
    async fn test_annotated_image_is_png() {
        let detector = Arc::new(StubDetector::new(mixed_detections()));
        let app = create_app(state_with(detector, true));

        let png = png_bytes(200, 150);
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);
        let json = body_json(app.oneshot(request).await.unwrap()).await;

        let encoded = json["annotated_image"].as_str().unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        let annotated = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(annotated.dimensions(), (200, 150));

        // Severe box outline at its top-left corner
        assert_eq!(annotated.get_pixel(90, 70).0, [220, 0, 0]);
    }

    /// Test 3: No detections yields an empty list and the unmodified image
    #[tokio::test]
    async fn test_zero_detections_returns_unmodified_image() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), true));

        let png = png_bytes(64, 48);
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["predictions"], serde_json::json!([]));
        assert_eq!(
            json["annotated_image"].as_str().unwrap(),
            encode_png_base64(&test_image(64, 48)).unwrap()
        );
        assert!(json["summary"]["overall"].is_null());
    }

    /// Test 4: Annotation disabled omits the field entirely
    #[tokio::test]
    async fn test_annotation_disabled_omits_field() {
        let app = create_app(state_with(Arc::new(StubDetector::new(mixed_detections())), false));

        let png = png_bytes(200, 150);
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);
        let json = body_json(app.oneshot(request).await.unwrap()).await;

        assert!(json.get("annotated_image").is_none());
        assert_eq!(json["predictions"].as_array().unwrap().len(), 2);
    }

    /// Test 5: Extra form fields are ignored
    #[tokio::test]
    async fn test_extra_fields_ignored() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), false));

        let png = png_bytes(10, 10);
        let request = multipart_request(
            "/predict",
            &[
                Part {
                    name: "note",
                    file_name: None,
                    content_type: None,
                    data: b"left side",
                },
                Part::image("face.png", "image/png", &png),
            ],
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // =============================================================================
    // Validation (400)
    // =============================================================================

    /// Test 6: Missing image field
    #[tokio::test]
    async fn test_missing_image_field() {
        let detector = Arc::new(StubDetector::empty());
        let app = create_app(state_with(detector.clone(), true));

        let request = multipart_request(
            "/predict",
            &[Part {
                name: "file",
                file_name: Some("face.png"),
                content_type: Some("image/png"),
                data: b"data",
            }],
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "No image file provided");
        assert_eq!(json["error_type"], "validation_error");
        assert_eq!(detector.calls(), 0);
    }

    /// Test 7: Empty filename
    #[tokio::test]
    async fn test_empty_filename() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), true));

        let png = png_bytes(4, 4);
        let request = multipart_request("/predict", &[Part::image("", "image/png", &png)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No image file selected");
    }

    /// Test 8: Non-image content type is rejected before decoding
    #[tokio::test]
    async fn test_non_image_content_type() {
        let detector = Arc::new(StubDetector::empty());
        let app = create_app(state_with(detector.clone(), true));

        let request = multipart_request(
            "/predict",
            &[Part::image("notes.txt", "text/plain", b"hello world")],
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("text/plain"));
        assert_eq!(detector.calls(), 0);
    }

    /// Test 9: Empty payload
    #[tokio::test]
    async fn test_empty_payload() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), true));

        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", b"")]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Uploaded image is empty");
    }

    /// Test 10: JSON body instead of multipart
    #[tokio::test]
    async fn test_non_multipart_body() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), true));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"image": "abc"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error_type"], "validation_error");
    }

    // =============================================================================
    // Processing errors (500 / 503)
    // =============================================================================

    /// Test 11: Corrupt bytes behind an image content type
    #[tokio::test]
    async fn test_corrupt_image_is_decode_error() {
        let detector = Arc::new(StubDetector::empty());
        let app = create_app(state_with(detector.clone(), true));

        let request = multipart_request(
            "/predict",
            &[Part::image("face.png", "image/png", b"\x89PNG\r\n\x1a\nnot really")],
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "decode_error");
        assert!(!json["error"].as_str().unwrap().is_empty());
        assert_eq!(detector.calls(), 0);
    }

    /// Test 12: Detector failure
    #[tokio::test]
    async fn test_inference_failure() {
        let detector: Arc<dyn Detector> = Arc::new(FailingDetector);
        let app = create_app(state_with(detector, true));

        let png = png_bytes(16, 16);
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "inference_error");
        assert!(json["error"].as_str().unwrap().contains("out of memory"));
    }

    /// Test 13: No model loaded
    #[tokio::test]
    async fn test_no_model_is_service_unavailable() {
        let app = create_app(Arc::new(AppState::new_for_test()));

        let png = png_bytes(16, 16);
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    /// Test 14: Threshold from state is applied
    #[tokio::test]
    async fn test_custom_threshold() {
        let detector = Arc::new(StubDetector::new(vec![
            raw(1, 0.3, [0.0, 0.0, 5.0, 5.0]),
            raw(1, 0.1, [0.0, 0.0, 5.0, 5.0]),
        ]));
        let mut state = AppState::new_for_test().with_detector(detector);
        state.confidence_threshold = 0.25;
        let app = create_app(Arc::new(state));

        let png = png_bytes(10, 10);
        let request = multipart_request("/predict", &[Part::image("face.jpg", "image/jpeg", &png)]);
        let json = body_json(app.oneshot(request).await.unwrap()).await;

        let predictions = json["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0]["class"], "Normal_Mouth");
    }

    // =============================================================================
    // Upload limit (413)
    // =============================================================================

    /// Test 15: Body over MAX_UPLOAD_BYTES is 413, not a malformed-request 400
    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let detector = Arc::new(StubDetector::empty());
        let mut state = AppState::new_for_test().with_detector(detector.clone());
        state.max_upload_bytes = 1024;
        let app = create_app(Arc::new(state));

        let data = vec![0x89u8; 4096];
        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &data)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let json = body_json(response).await;
        assert_eq!(json["error_type"], "payload_too_large");
        assert!(json["message"].as_str().unwrap().contains("1024 bytes"));
        assert_eq!(detector.calls(), 0);
    }

    /// Test 16: A small limit still admits uploads under it
    #[tokio::test]
    async fn test_upload_under_limit_accepted() {
        let detector = Arc::new(StubDetector::empty());
        let mut state = AppState::new_for_test().with_detector(detector.clone());
        let png = png_bytes(8, 8);
        state.max_upload_bytes = png.len() + 1024;
        let app = create_app(Arc::new(state));

        let request = multipart_request("/predict", &[Part::image("face.png", "image/png", &png)]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(detector.calls(), 1);
    }
}
