// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Raw model output to public prediction records
//!
//! Malformed entries are dropped rather than failing the request, so one
//! bad box never costs the caller the rest of the detections.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::detector::RawDetection;
use super::labels::{PalsyLabel, SeverityTier};

/// A detection as returned to API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Resolved class label
    #[serde(rename = "class")]
    pub label: PalsyLabel,
    /// Detection score (threshold..=1.0)
    pub confidence: f32,
    /// [x1, y1, x2, y2] in integer pixels, x1 < x2 and y1 < y2
    pub bbox: [i32; 4],
}

impl Detection {
    pub fn severity(&self) -> SeverityTier {
        self.label.severity()
    }
}

/// Per-tier counts over one image's detections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub total: usize,
    pub normal: usize,
    pub mild: usize,
    pub severe: usize,
    /// Worst tier present, `None` when nothing was detected
    pub overall: Option<SeverityTier>,
}

/// Convert raw detections into public records.
///
/// Drops entries whose class index is unknown, whose box is missing or
/// non-finite, whose confidence is outside [0, 1] or below `confidence_threshold`,
/// and whose box is empty once truncated to integer pixels. Order is kept.
pub fn normalize(raw: &[RawDetection], confidence_threshold: f32) -> Vec<Detection> {
    let detections: Vec<Detection> = raw
        .iter()
        .filter_map(|r| normalize_one(r, confidence_threshold))
        .collect();

    if detections.len() != raw.len() {
        debug!(
            "Dropped {} of {} raw detections",
            raw.len() - detections.len(),
            raw.len()
        );
    }

    detections
}

fn normalize_one(raw: &RawDetection, confidence_threshold: f32) -> Option<Detection> {
    let label = PalsyLabel::from_class_index(raw.class_index)?;

    // Scores outside [0, 1] are not probabilities
    if !(0.0..=1.0).contains(&raw.confidence) || raw.confidence < confidence_threshold {
        return None;
    }

    let bbox = raw.bbox?;
    if bbox.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let [x1, y1, x2, y2] = bbox.map(|v| v.trunc() as i32);
    if x1 >= x2 || y1 >= y2 {
        return None;
    }

    Some(Detection {
        label,
        confidence: raw.confidence,
        bbox: [x1, y1, x2, y2],
    })
}

/// Count detections per severity tier
pub fn summarize(detections: &[Detection]) -> DetectionSummary {
    detections
        .iter()
        .fold(DetectionSummary::default(), |mut summary, det| {
            let tier = det.severity();
            match tier {
                SeverityTier::Normal => summary.normal += 1,
                SeverityTier::Mild => summary.mild += 1,
                SeverityTier::Severe => summary.severe += 1,
            }
            summary.total += 1;
            summary.overall = summary.overall.max(Some(tier));
            summary
        })
}
