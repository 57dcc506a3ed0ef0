// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Health endpoint tests for GET /health
//!
//! /health reports the model as loaded only when a detector is present,
//! and 503 otherwise.

use axum::http::StatusCode;
use palsy_detect::api::{create_app, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

use crate::common::{body_json, get_request, state_with, StubDetector};

#[cfg(test)]
mod health_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_with_model() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), true));

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model_loaded"], true);
        assert_eq!(json["model"], "stub");
        assert_eq!(json["annotation_enabled"], true);
    }

    #[tokio::test]
    async fn test_health_reports_annotation_disabled() {
        let app = create_app(state_with(Arc::new(StubDetector::empty()), false));

        let json = body_json(app.oneshot(get_request("/health")).await.unwrap()).await;
        assert_eq!(json["annotation_enabled"], false);
    }

    #[tokio::test]
    async fn test_health_without_model() {
        let app = create_app(Arc::new(AppState::new_for_test()));

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(response).await;
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["model_loaded"], false);
        assert!(json.get("model").is_none());
    }
}
