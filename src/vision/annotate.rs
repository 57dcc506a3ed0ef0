// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Annotation renderer
//!
//! Draws severity-colored boxes and `"{label}: {confidence:.2}"` captions on a
//! copy of the decoded image, then encodes it as base64 PNG. DejaVu Sans is
//! compiled in for captions; `ANNOTATION_FONT_PATH` swaps in another font.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{info, warn};

use super::image_utils::{encode_png_base64, ImageError};
use super::normalizer::Detection;

/// Default caption font
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_PADDING: i32 = 2;
const BOX_THICKNESS: i32 = 2;
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// Renders detections onto images. Cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct AnnotationRenderer {
    font: Option<FontArc>,
    scale: PxScale,
}

impl std::fmt::Debug for AnnotationRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationRenderer")
            .field("has_font", &self.font.is_some())
            .field("scale", &self.scale.y)
            .finish()
    }
}

impl Default for AnnotationRenderer {
    fn default() -> Self {
        Self::embedded()
    }
}

impl AnnotationRenderer {
    /// Renderer captioning with the embedded font
    pub fn embedded() -> Self {
        match FontArc::try_from_slice(EMBEDDED_FONT) {
            Ok(font) => Self::with_font(font),
            Err(e) => {
                warn!("Embedded annotation font is invalid: {}; labels will not be drawn", e);
                Self::without_font()
            }
        }
    }

    /// Use the font at `font_path` when given, the embedded font otherwise
    pub fn from_font_path(font_path: Option<&Path>) -> Self {
        match font_path {
            Some(path) => Self::load(path),
            None => Self::embedded(),
        }
    }

    /// Load the caption font from `font_path`.
    ///
    /// A missing or unparsable font is not an error: the renderer keeps the
    /// embedded font and logs a single warning here.
    pub fn load<P: AsRef<Path>>(font_path: P) -> Self {
        let font_path = font_path.as_ref();
        match std::fs::read(font_path) {
            Ok(bytes) => match FontArc::try_from_vec(bytes) {
                Ok(font) => {
                    info!("Annotation font loaded from {}", font_path.display());
                    Self::with_font(font)
                }
                Err(e) => {
                    warn!(
                        "Invalid annotation font {}: {}; using embedded font",
                        font_path.display(),
                        e
                    );
                    Self::embedded()
                }
            },
            Err(e) => {
                warn!(
                    "Annotation font {} unavailable: {}; using embedded font",
                    font_path.display(),
                    e
                );
                Self::embedded()
            }
        }
    }

    pub fn with_font(font: FontArc) -> Self {
        Self {
            font: Some(font),
            scale: PxScale::from(LABEL_FONT_SIZE),
        }
    }

    pub fn without_font() -> Self {
        Self {
            font: None,
            scale: PxScale::from(LABEL_FONT_SIZE),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw all detections on a copy of `image`
    pub fn render(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        for det in detections {
            self.draw_detection(&mut canvas, det);
        }
        canvas
    }

    /// Render and encode as base64 PNG
    pub fn render_base64(
        &self,
        image: &RgbImage,
        detections: &[Detection],
    ) -> Result<String, ImageError> {
        if detections.is_empty() {
            return encode_png_base64(image);
        }
        encode_png_base64(&self.render(image, detections))
    }

    fn draw_detection(&self, image: &mut RgbImage, det: &Detection) {
        let (img_w, img_h) = (image.width() as i32, image.height() as i32);
        if img_w == 0 || img_h == 0 {
            return;
        }

        let color = Rgb(det.severity().color());

        let x1 = det.bbox[0].clamp(0, img_w - 1);
        let y1 = det.bbox[1].clamp(0, img_h - 1);
        let x2 = det.bbox[2].clamp(0, img_w);
        let y2 = det.bbox[3].clamp(0, img_h);
        if x1 >= x2 || y1 >= y2 {
            return;
        }

        for t in 0..BOX_THICKNESS {
            let w = x2 - x1 - 2 * t;
            let h = y2 - y1 - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, color);
        }

        let Some(font) = &self.font else {
            return;
        };

        let caption = format!("{}: {:.2}", det.label, det.confidence);
        let (text_w, _) = text_size(self.scale, font, &caption);
        // Line height, so descenders stay on the background
        let text_h = font.as_scaled(self.scale).height().ceil() as i32;
        let label_w = text_w as i32 + 2 * LABEL_PADDING;
        let label_h = text_h + 2 * LABEL_PADDING;

        // Above the box when there is room, otherwise inside its top edge
        let label_x = x1;
        let label_y = if y1 - label_h >= 0 { y1 - label_h } else { y1 };

        let clipped_w = label_w.min(img_w - label_x);
        let clipped_h = label_h.min(img_h - label_y);
        if clipped_w <= 0 || clipped_h <= 0 {
            return;
        }

        let background = Rect::at(label_x, label_y).of_size(clipped_w as u32, clipped_h as u32);
        draw_filled_rect_mut(image, background, color);
        draw_text_mut(
            image,
            Rgb(TEXT_COLOR),
            label_x + LABEL_PADDING,
            label_y + LABEL_PADDING,
            self.scale,
            font,
            &caption,
        );
    }
}
