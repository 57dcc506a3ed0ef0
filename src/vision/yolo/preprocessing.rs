// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO detection models

use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

/// Default square input size of the exported detection model
pub const YOLO_INPUT_SIZE: u32 = 640;

/// Padding value used by the training pipeline (114/255 gray)
pub const PAD_VALUE: f32 = 114.0 / 255.0;

/// Parameters needed to map model-space boxes back to the original image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxParams {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl LetterboxParams {
    /// Map a corner-form box from model input space to original pixels,
    /// clamped to the image bounds
    pub fn unletterbox(&self, bbox: [f32; 4]) -> [f32; 4] {
        let w = self.orig_w as f32;
        let h = self.orig_h as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, h),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, w),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, h),
        ]
    }
}

/// Preprocess an image for YOLO detection
///
/// Steps:
/// 1. Resize with aspect ratio preservation to fit `target_size`
/// 2. Center on a gray (114) square canvas
/// 3. Scale pixels to [0, 1]
/// 4. Convert to NCHW tensor format [1, 3, H, W]
pub fn letterbox(image: &RgbImage, target_size: u32) -> (Array4<f32>, LetterboxParams) {
    let (orig_w, orig_h) = image.dimensions();
    let size = target_size as usize;

    let mut tensor = Array4::from_elem((1, 3, size, size), PAD_VALUE);

    if orig_w == 0 || orig_h == 0 {
        let params = LetterboxParams {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            orig_w,
            orig_h,
        };
        return (tensor, params);
    }

    let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let pad_x = (target_size - new_w) as f32 / 2.0;
    let pad_y = (target_size - new_h) as f32 / 2.0;
    let offset_x = pad_x.floor() as usize;
    let offset_y = pad_y.floor() as usize;

    for (x, y, pixel) in resized.enumerate_pixels() {
        let tx = offset_x + x as usize;
        let ty = offset_y + y as usize;
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = pixel[c] as f32 / 255.0;
        }
    }

    let params = LetterboxParams {
        scale,
        pad_x: offset_x as f32,
        pad_y: offset_y as f32,
        orig_w,
        orig_h,
    };

    (tensor, params)
}
