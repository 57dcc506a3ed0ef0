// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class label table and severity tiers for the palsy detection model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of classes the detection model was trained on
pub const NUM_CLASSES: usize = 6;

/// Detection classes, in the order of the training manifest.
///
/// The discriminant is the model's class index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PalsyLabel {
    #[serde(rename = "Normal_Eyes")]
    NormalEyes,
    #[serde(rename = "Normal_Mouth")]
    NormalMouth,
    #[serde(rename = "SlightPalsy_Eyes")]
    SlightPalsyEyes,
    #[serde(rename = "SlightPalsy_Mouth")]
    SlightPalsyMouth,
    #[serde(rename = "StrongPalsy_Eyes")]
    StrongPalsyEyes,
    #[serde(rename = "StrongPalsy_Mouth")]
    StrongPalsyMouth,
}

/// Coarse severity bucket, used for annotation colors and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Normal,
    Mild,
    Severe,
}

impl PalsyLabel {
    /// All labels, indexed by class index
    pub const ALL: [PalsyLabel; NUM_CLASSES] = [
        PalsyLabel::NormalEyes,
        PalsyLabel::NormalMouth,
        PalsyLabel::SlightPalsyEyes,
        PalsyLabel::SlightPalsyMouth,
        PalsyLabel::StrongPalsyEyes,
        PalsyLabel::StrongPalsyMouth,
    ];

    /// Resolve a model class index; `None` for indices outside the table
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn class_index(&self) -> usize {
        *self as usize
    }

    /// Label string exactly as the model was trained with
    pub fn as_str(&self) -> &'static str {
        match self {
            PalsyLabel::NormalEyes => "Normal_Eyes",
            PalsyLabel::NormalMouth => "Normal_Mouth",
            PalsyLabel::SlightPalsyEyes => "SlightPalsy_Eyes",
            PalsyLabel::SlightPalsyMouth => "SlightPalsy_Mouth",
            PalsyLabel::StrongPalsyEyes => "StrongPalsy_Eyes",
            PalsyLabel::StrongPalsyMouth => "StrongPalsy_Mouth",
        }
    }

    /// Parse a label string; exact match against the table only
    pub fn from_label_str(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == label)
    }

    pub fn severity(&self) -> SeverityTier {
        match self {
            PalsyLabel::NormalEyes | PalsyLabel::NormalMouth => SeverityTier::Normal,
            PalsyLabel::SlightPalsyEyes | PalsyLabel::SlightPalsyMouth => SeverityTier::Mild,
            PalsyLabel::StrongPalsyEyes | PalsyLabel::StrongPalsyMouth => SeverityTier::Severe,
        }
    }
}

impl fmt::Display for PalsyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SeverityTier {
    /// Severity for an arbitrary label string.
    ///
    /// Known labels use the table; anything else falls back to substring
    /// matching: "Normal" is Normal, "Slight" is Mild, everything else Severe.
    pub fn from_label_str(label: &str) -> Self {
        if let Some(known) = PalsyLabel::from_label_str(label) {
            return known.severity();
        }
        if label.contains("Normal") {
            SeverityTier::Normal
        } else if label.contains("Slight") {
            SeverityTier::Mild
        } else {
            SeverityTier::Severe
        }
    }

    /// Annotation color (RGB)
    pub fn color(&self) -> [u8; 3] {
        match self {
            SeverityTier::Normal => [0, 200, 0],
            SeverityTier::Mild => [255, 165, 0],
            SeverityTier::Severe => [220, 0, 0],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "normal",
            SeverityTier::Mild => "mild",
            SeverityTier::Severe => "severe",
        }
    }
}
