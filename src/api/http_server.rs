// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::errors::ApiError;
use super::predict::predict_handler;
use crate::version;
use crate::vision::{AnnotationRenderer, Detector, MAX_IMAGE_SIZE};

/// Shared, read-only state injected into every handler
#[derive(Clone)]
pub struct AppState {
    /// Loaded detection model; `None` only in degraded test setups
    pub detector: Option<Arc<dyn Detector>>,
    /// Present when annotation is enabled
    pub renderer: Option<Arc<AnnotationRenderer>>,
    pub confidence_threshold: f32,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        detector: Arc<dyn Detector>,
        renderer: Option<Arc<AnnotationRenderer>>,
        confidence_threshold: f32,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            detector: Some(detector),
            renderer,
            confidence_threshold,
            max_upload_bytes,
        }
    }

    /// State with no model loaded and annotation disabled
    pub fn new_for_test() -> Self {
        Self {
            detector: None,
            renderer: None,
            confidence_threshold: crate::config::DEFAULT_CONFIDENCE_THRESHOLD,
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_renderer(mut self, renderer: AnnotationRenderer) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn annotation_enabled(&self) -> bool {
        self.renderer.is_some()
    }
}

/// Build the router with all routes and layers
pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/predict",
            post(predict_handler).fallback(predict_method_not_allowed),
        )
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// GET /health - model presence check
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Some(detector) = &state.detector {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "model_loaded": true,
                "model": detector.name(),
                "annotation_enabled": state.annotation_enabled(),
            })),
        )
    } else {
        warn!("Health check: detection model not loaded");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "model_loaded": false,
            })),
        )
    }
}

/// GET / - service description
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": version::SERVICE_NAME,
        "version": version::VERSION_NUMBER,
        "endpoints": {
            "/": "API information",
            "/health": "Health check",
            "/predict": "POST image for facial palsy detection",
        },
        "usage": "Send POST request to /predict with multipart/form-data containing an 'image' file field",
    }))
}

async fn predict_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed {
        path: "/predict".to_string(),
        allowed: "POST".to_string(),
    }
}

async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
