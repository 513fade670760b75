// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Projection-based text line segmentation
//!
//! The label crop is binarized with Otsu's threshold (ink = foreground), rows
//! are classified by ink density and grouped into bands, and each band is
//! trimmed horizontally by a column projection before being sliced out.

use super::BoundingBox;
use crate::config::SegmentConfig;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use tracing::debug;

const INK: u8 = 255;

/// One text line cut from the label, in top-to-bottom order
#[derive(Debug, Clone)]
pub struct LineCrop {
    /// Zero-based reading-order rank
    pub index: usize,
    pub image: RgbImage,
    /// Slice rectangle in label-crop coordinates
    pub bounds: BoundingBox,
}

/// Contiguous run of text rows, `start..end` (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    pub start: u32,
    pub end: u32,
}

impl RowBand {
    pub fn height(&self) -> u32 {
        self.end - self.start
    }
}

/// Splits a label crop into line images
#[derive(Debug, Clone)]
pub struct LineSegmenter {
    config: SegmentConfig,
}

impl LineSegmenter {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    /// Cut `label` into line crops, top to bottom; empty when no line is found
    ///
    /// `label` is the padded crop, so it carries a margin of photo background
    /// that takes part in binarization (see [`binarize`]).
    pub fn segment(&self, label: &RgbImage) -> Vec<LineCrop> {
        let Some(ink) = binarize(label) else {
            debug!("Label crop has no contrast, no lines to segment");
            return Vec::new();
        };

        let bands = self.find_bands(&ink);
        let (width, height) = ink.dimensions();
        let mut lines = Vec::with_capacity(bands.len());

        for band in &bands {
            let Some((left, right)) = self.inked_columns(&ink, band) else {
                debug!(
                    "Dropping band rows {}..{}: no column above ink minimum",
                    band.start, band.end
                );
                continue;
            };

            let pad = ((band.height() as f64 * self.config.band_padding_fraction).round() as u32)
                .max(self.config.band_padding_floor);
            let y1 = band.start.saturating_sub(pad);
            let y2 = (band.end + pad).min(height);
            let x1 = left.saturating_sub(self.config.horizontal_margin);
            let x2 = (right + 1 + self.config.horizontal_margin).min(width);

            let bounds = BoundingBox::new(x1, y1, x2 - x1, y2 - y1);
            let image = imageops::crop_imm(label, x1, y1, bounds.width, bounds.height).to_image();
            lines.push(LineCrop {
                index: lines.len(),
                image,
                bounds,
            });
        }

        debug!(
            "Segmented {} lines from {} bands ({}x{} label)",
            lines.len(),
            bands.len(),
            width,
            height
        );
        lines
    }

    /// Row bands whose ink density exceeds the row threshold, minus short ones
    pub fn find_bands(&self, ink: &GrayImage) -> Vec<RowBand> {
        let (width, height) = ink.dimensions();
        let min_row_ink = self.config.min_row_ink_fraction * width as f64;

        let mut bands = Vec::new();
        let mut band_start: Option<u32> = None;

        for y in 0..height {
            let row_ink = (0..width)
                .filter(|&x| ink.get_pixel(x, y).0[0] == INK)
                .count();
            let is_text = row_ink as f64 > min_row_ink;

            match (is_text, band_start) {
                (true, None) => band_start = Some(y),
                (false, Some(start)) => {
                    bands.push(RowBand { start, end: y });
                    band_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = band_start {
            bands.push(RowBand { start, end: height });
        }

        bands.retain(|band| band.height() >= self.config.min_band_height);
        bands
    }

    /// Leftmost and rightmost column whose ink count within `band` exceeds the minimum
    fn inked_columns(&self, ink: &GrayImage, band: &RowBand) -> Option<(u32, u32)> {
        let mut left = None;
        let mut right = None;
        for x in 0..ink.width() {
            let column_ink = (band.start..band.end)
                .filter(|&y| ink.get_pixel(x, y).0[0] == INK)
                .count() as u32;
            if column_ink > self.config.min_column_ink {
                left.get_or_insert(x);
                right = Some(x);
            }
        }
        Some((left?, right?))
    }
}

/// Otsu-binarized ink mask (ink = 255), or `None` for a uniform image
///
/// The level is computed over the whole padded crop, photo background margin
/// included. With sparse thin strokes it can land between the background and
/// the label color, in which case the label body itself reads as ink.
pub fn binarize(label: &RgbImage) -> Option<GrayImage> {
    let gray = imageops::grayscale(label);

    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if lo >= hi {
        return None;
    }

    // Dark pixels at or below the level are ink
    let level = otsu_level(&gray);
    let mut ink = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] <= level {
            ink.put_pixel(x, y, Luma([INK]));
        }
    }
    Some(ink)
}
