// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 output decoding and non-maximum suppression

use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use tracing::debug;

use super::preprocessing::LetterboxParams;
use crate::vision::detector::{DetectorError, RawDetection};

/// Default NMS IoU threshold of the training library
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;

/// Maximum detections kept per image
pub const MAX_DETECTIONS: usize = 300;

/// Decode a raw YOLOv8 output tensor into detections in original pixel space
///
/// Accepts `[1, 4 + nc, anchors]` (the default export) or the transposed
/// `[1, anchors, 4 + nc]`. Rows are `cx, cy, w, h, score_0 .. score_nc`.
pub fn decode_output(
    output: ArrayViewD<f32>,
    num_classes: usize,
    params: &LetterboxParams,
    confidence_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<RawDetection>, DetectorError> {
    let features = 4 + num_classes;
    let shape = output.shape().to_vec();

    if shape.len() != 3 || shape[0] != 1 {
        return Err(DetectorError::InvalidOutput(format!(
            "expected [1, {}, anchors], got {:?}",
            features, shape
        )));
    }

    let matrix = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

    // Normalize to [anchors, features]
    let rows: ArrayView2<f32> = if shape[1] == features {
        matrix.reversed_axes()
    } else if shape[2] == features {
        matrix
    } else {
        return Err(DetectorError::InvalidOutput(format!(
            "feature dim = {} not found in {:?}",
            features, shape
        )));
    };

    let mut candidates = Vec::new();

    for row in rows.outer_iter() {
        let (class_index, score) = row
            .iter()
            .skip(4)
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |best, (idx, &s)| {
                if s > best.1 {
                    (idx, s)
                } else {
                    best
                }
            });

        if !score.is_finite() || score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
            continue;
        }
        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let bbox = params.unletterbox([
            cx - w / 2.0,
            cy - h / 2.0,
            cx + w / 2.0,
            cy + h / 2.0,
        ]);

        candidates.push(RawDetection {
            class_index,
            confidence: score,
            bbox: Some(bbox),
        });
    }

    let before = candidates.len();
    let kept = non_max_suppression(candidates, iou_threshold, MAX_DETECTIONS);
    debug!("NMS kept {} of {} candidates", kept.len(), before);

    Ok(kept)
}

/// Intersection over union of two corner-form boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - inter;

    if union > f32::EPSILON {
        inter / union
    } else {
        0.0
    }
}

/// Class-aware non-maximum suppression.
///
/// Output is sorted by descending confidence and truncated to `max_detections`.
/// Boxes of different classes never suppress each other.
pub fn non_max_suppression(
    mut detections: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::new();
    for det in detections {
        if kept.len() >= max_detections {
            break;
        }
        let Some(bbox) = det.bbox else { continue };

        let suppressed = kept.iter().any(|k| {
            k.class_index == det.class_index
                && k.bbox
                    .map(|kb| iou(&kb, &bbox) > iou_threshold)
                    .unwrap_or(false)
        });

        if !suppressed {
            kept.push(det);
        }
    }

    kept
}
