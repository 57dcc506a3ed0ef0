// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 ONNX detection model
//!
//! Loads the exported palsy detector (`best.onnx`) into an ONNX Runtime
//! session and implements [`Detector`] on top of it.

use anyhow::{Context, Result};
use image::RgbImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

use super::postprocessing::{decode_output, DEFAULT_IOU_THRESHOLD};
use super::preprocessing::{letterbox, YOLO_INPUT_SIZE};
use crate::vision::detector::{Detector, DetectorError, RawDetection};
use crate::vision::labels::NUM_CLASSES;

/// Options for loading a YOLO model
#[derive(Debug, Clone)]
pub struct YoloConfig {
    /// Square model input size
    pub input_size: u32,
    /// NMS IoU threshold
    pub iou_threshold: f32,
    /// Number of classes in the model head
    pub num_classes: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            input_size: YOLO_INPUT_SIZE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            num_classes: NUM_CLASSES,
            intra_threads: 4,
        }
    }
}

/// YOLOv8 detector backed by ONNX Runtime (CPU only)
pub struct YoloDetector {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Mutex<Session>,
    /// Model input name
    input_name: String,
    config: YoloConfig,
    name: String,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detection model from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn load<P: AsRef<Path>>(model_path: P, config: YoloConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(model_path.display().to_string()).into());
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(output) = session.outputs.first() {
            debug!("Detection model output: {} {:?}", output.name, output.output_type);
        }

        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "yolo".to_string());

        info!(
            "✅ Detection model loaded (input: {}, size: {}, classes: {})",
            input_name, config.input_size, config.num_classes
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            config,
            name,
        })
    }

    pub fn config(&self) -> &YoloConfig {
        &self.config
    }
}

impl Detector for YoloDetector {
    fn detect(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        let start = Instant::now();
        let (tensor, params) = letterbox(image, self.config.input_size);

        let input_value = Value::from_array(tensor)
            .map_err(|e| DetectorError::InferenceFailed(format!("input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::InferenceFailed("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .map_err(|e| DetectorError::InferenceFailed(e.to_string()))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

        let detections = decode_output(
            output,
            self.config.num_classes,
            &params,
            confidence_threshold,
            self.config.iou_threshold,
        )?;

        debug!(
            "Detected {} objects in {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
