// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision pipeline for facial palsy detection
//!
//! This module provides:
//! - Image decoding and PNG/base64 encoding
//! - The palsy label table and severity tiers
//! - YOLOv8 detection via ONNX Runtime (CPU only)
//! - Normalization of raw detections into the public schema
//! - Annotated image rendering
//! - Narrative analysis through an external chat API

pub mod annotate;
pub mod detector;
pub mod image_utils;
pub mod labels;
pub mod narrative;
pub mod normalizer;
pub mod yolo;

pub use annotate::AnnotationRenderer;
pub use detector::{Detector, DetectorError, RawDetection};
pub use image_utils::{
    decode_image_bytes_with_limit, detect_format, encode_png_base64, ImageError, ImageInfo,
    MAX_IMAGE_SIZE,
};
pub use labels::{PalsyLabel, SeverityTier, NUM_CLASSES};
pub use narrative::{NarrativeClient, NarrativeError, NarrativeReport};
pub use normalizer::{normalize, summarize, Detection, DetectionSummary};
pub use yolo::{YoloConfig, YoloDetector};
