// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route registration tests
//!
//! These tests verify that:
//! - `/`, `/health` and `/predict` are registered
//! - `/predict` rejects non-POST verbs with 405 and usage guidance
//! - Unknown routes return 404 listing the available endpoints

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` and `ready`

use palsy_detect::api::create_app;

use crate::common::{body_json, get_request, state_with, StubDetector};

fn app() -> axum::Router {
    create_app(state_with(Arc::new(StubDetector::empty()), true))
}

#[cfg(test)]
mod route_registration_tests {
    use super::*;

    /// Test 1: Root describes the service
    #[tokio::test]
    async fn test_root_route() {
        let response = app().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["message"].is_string());
        assert!(json["version"].is_string());
        assert!(json["endpoints"]["/predict"].is_string());
        assert!(json["usage"].as_str().unwrap().contains("/predict"));
    }

    /// Test 2: GET /predict returns 405 with guidance
    #[tokio::test]
    async fn test_predict_rejects_get() {
        let response = app().oneshot(get_request("/predict")).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "GET should not be allowed on /predict"
        );

        let json = body_json(response).await;
        assert_eq!(json["error"], "Method not allowed");
        assert!(json["message"].as_str().unwrap().contains("POST"));
    }

    /// Test 3: Other verbs on /predict are also 405
    #[tokio::test]
    async fn test_predict_rejects_put_and_delete() {
        for method in [Method::PUT, Method::DELETE] {
            let request = Request::builder()
                .method(method.clone())
                .uri("/predict")
                .body(Body::empty())
                .unwrap();

            let response = app().oneshot(request).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{} should not be allowed on /predict",
                method
            );
        }
    }

    /// Test 4: Unknown route returns 404 with the endpoint list
    #[tokio::test]
    async fn test_unknown_route() {
        let response = app().oneshot(get_request("/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Not found");
        assert!(json["message"].as_str().unwrap().contains("/nonexistent"));
        assert_eq!(
            json["available_endpoints"],
            serde_json::json!(["/", "/health", "/predict"])
        );
    }

    /// Test 5: Unknown route with POST is also 404
    #[tokio::test]
    async fn test_unknown_route_post() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/predict")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
