// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Padded label cropping at native resolution

use super::BoundingBox;
use image::{imageops, RgbImage};

/// A label crop together with where it came from in the source image
#[derive(Debug, Clone)]
pub struct LabelCrop {
    pub image: RgbImage,
    /// Clamped rectangle in source-image coordinates
    pub bounds: BoundingBox,
}

/// Grow `bbox` by `padding_fraction` of its own size on every side, clamped to the image
///
/// Returns `None` only when the clamped rectangle is empty (the box lay outside
/// the image). Negative fractions are treated as zero.
pub fn padded_bounds(
    image_width: u32,
    image_height: u32,
    bbox: &BoundingBox,
    padding_fraction: f64,
) -> Option<BoundingBox> {
    let fraction = padding_fraction.max(0.0);
    let pad_x = (bbox.width as f64 * fraction).round() as i64;
    let pad_y = (bbox.height as f64 * fraction).round() as i64;

    let x1 = (bbox.x as i64 - pad_x).clamp(0, image_width as i64);
    let y1 = (bbox.y as i64 - pad_y).clamp(0, image_height as i64);
    let x2 = (bbox.right() as i64 + pad_x).clamp(0, image_width as i64);
    let y2 = (bbox.bottom() as i64 + pad_y).clamp(0, image_height as i64);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(BoundingBox::new(
        x1 as u32,
        y1 as u32,
        (x2 - x1) as u32,
        (y2 - y1) as u32,
    ))
}

/// Cut the padded label region out of `image` without resampling
pub fn extract_region(
    image: &RgbImage,
    bbox: &BoundingBox,
    padding_fraction: f64,
) -> Option<LabelCrop> {
    let bounds = padded_bounds(image.width(), image.height(), bbox, padding_fraction)?;
    let crop = imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height).to_image();
    Some(LabelCrop {
        image: crop,
        bounds,
    })
}
