// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HSV conversion and label-color masking
//!
//! Values use the 8-bit convention common to OpenCV-tuned thresholds:
//! hue on 0..=180 (degrees halved), saturation and value on 0..=255.

use crate::config::RegionConfig;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Foreground value written into binary masks
pub const MASK_ON: u8 = 255;

/// A pixel in 8-bit HSV space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert one RGB pixel to 8-bit HSV
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> Hsv {
    let [r, g, b] = pixel.0;
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    Hsv {
        h: (h / 2.0).round().min(180.0) as u8,
        s: s.round() as u8,
        v: max as u8,
    }
}

impl RegionConfig {
    /// Whether an HSV pixel falls inside either hue band and both S/V bands
    pub fn matches(&self, hsv: Hsv) -> bool {
        let in_hue = self.hue_bands.iter().any(|band| band.contains(hsv.h));
        let in_sat = hsv.s >= self.saturation[0] && hsv.s <= self.saturation[1];
        let in_val = hsv.v >= self.value[0] && hsv.v <= self.value[1];
        in_hue && in_sat && in_val
    }
}

/// Binary mask of label-colored pixels (255 = label color, 0 = anything else)
pub fn label_mask(image: &RgbImage, region: &RegionConfig) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        if region.matches(rgb_to_hsv(pixel)) {
            mask.put_pixel(x, y, Luma([MASK_ON]));
        }
    }
    mask
}
