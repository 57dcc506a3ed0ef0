// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use palsy_detect::{
    api::{start_server, AppState},
    config::ServerConfig,
    version,
    vision::{AnnotationRenderer, Detector, YoloConfig, YoloDetector},
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting {}", version::get_version_string());

    let config = ServerConfig::from_env();
    config.validate().context("Invalid server configuration")?;

    // Model load failure is fatal: never accept requests without a model
    info!("🧠 Loading detection model...");
    let yolo_config = YoloConfig {
        input_size: config.model_input_size,
        iou_threshold: config.iou_threshold,
        ..YoloConfig::default()
    };
    let model_path = config.model_path.clone();
    let detector = tokio::task::spawn_blocking(move || YoloDetector::load(&model_path, yolo_config))
        .await
        .context("Model loading task failed")?
        .with_context(|| {
            format!(
                "Failed to load detection model from {}",
                config.model_path.display()
            )
        })?;
    let detector: Arc<dyn Detector> = Arc::new(detector);
    info!("✅ Detection model loaded: {}", detector.name());

    let renderer = if config.annotate_predictions {
        let renderer = AnnotationRenderer::from_font_path(config.annotation_font_path.as_deref());
        info!("🖍️ Annotation enabled (captions: {})", renderer.has_font());
        Some(Arc::new(renderer))
    } else {
        info!("Annotation disabled");
        None
    };

    let state = AppState::new(
        detector,
        renderer,
        config.confidence_threshold,
        config.max_upload_bytes,
    );

    info!(
        "✅ Ready (confidence threshold: {}, annotation: {})",
        config.confidence_threshold,
        state.annotation_enabled()
    );

    start_server(state, config.socket_addr()).await
}
