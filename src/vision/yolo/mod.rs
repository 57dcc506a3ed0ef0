// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 object detection over ONNX Runtime
//!
//! Components:
//! - `preprocessing` - Letterbox resize into the model input tensor
//! - `postprocessing` - Output decoding and class-aware NMS
//! - `model` - Session handle implementing `Detector`

pub mod model;
pub mod postprocessing;
pub mod preprocessing;

pub use model::{YoloConfig, YoloDetector};
pub use postprocessing::{decode_output, non_max_suppression, DEFAULT_IOU_THRESHOLD};
pub use preprocessing::{letterbox, LetterboxParams, YOLO_INPUT_SIZE};
