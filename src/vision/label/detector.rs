// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Color-based label region detection
//!
//! Pipeline: HSV band mask -> morphological close/open -> external contours ->
//! area / solidity / aspect filters -> largest surviving contour.

use super::BoundingBox;
use crate::config::RegionConfig;
use crate::vision::color::label_mask;
use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use tracing::debug;

/// A contour that survived every geometric filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelCandidate {
    pub bbox: BoundingBox,
    pub area: f64,
    pub solidity: f64,
    pub aspect_ratio: f64,
}

/// Finds at most one label-colored region in a photo
#[derive(Debug, Clone)]
pub struct RegionDetector {
    config: RegionConfig,
}

impl RegionDetector {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Locate the label, or `None` when no contour passes the filters
    ///
    /// Among equally large candidates the first one in contour traversal order
    /// is kept; traversal order is raster order of each contour's first pixel.
    pub fn detect(&self, image: &RgbImage) -> Option<BoundingBox> {
        let mut best: Option<LabelCandidate> = None;
        for candidate in self.candidates(image) {
            if best.map_or(true, |b| candidate.area > b.area) {
                best = Some(candidate);
            }
        }

        match &best {
            Some(candidate) => debug!(
                "Label region at ({}, {}) {}x{} (area {:.0}, solidity {:.2}, aspect {:.2})",
                candidate.bbox.x,
                candidate.bbox.y,
                candidate.bbox.width,
                candidate.bbox.height,
                candidate.area,
                candidate.solidity,
                candidate.aspect_ratio
            ),
            None => debug!("No label-colored region passed the filters"),
        }

        best.map(|c| c.bbox)
    }

    /// Every external contour that passes the area, solidity and aspect filters
    pub fn candidates(&self, image: &RgbImage) -> Vec<LabelCandidate> {
        let mask = self.clean_mask(image);
        let image_area = image.width() as f64 * image.height() as f64;
        let min_area = self.config.min_area_fraction * image_area;

        // Blobs touching the frame only trace as outer borders with background around them
        let mut contours = find_contours::<u32>(&pad_mask(&mask));
        for contour in &mut contours {
            for p in &mut contour.points {
                p.x = p.x.saturating_sub(1);
                p.y = p.y.saturating_sub(1);
            }
        }
        debug!("Label mask has {} contours", contours.len());

        contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|contour| {
                let bbox = contour_bounds(contour)?;
                let area = polygon_area(contour);
                if area < min_area {
                    return None;
                }

                let solidity = area / bbox.area() as f64;
                if solidity < self.config.min_solidity {
                    return None;
                }

                let aspect_ratio = bbox.width as f64 / bbox.height as f64;
                let [min_aspect, max_aspect] = self.config.aspect_ratio;
                if aspect_ratio < min_aspect || aspect_ratio > max_aspect {
                    return None;
                }

                Some(LabelCandidate {
                    bbox,
                    area,
                    solidity,
                    aspect_ratio,
                })
            })
            .collect()
    }

    /// HSV mask after closing (merge nearby blobs) then opening (drop speckle)
    pub fn clean_mask(&self, image: &RgbImage) -> GrayImage {
        let mask = label_mask(image, &self.config);
        // A (2r+1)-wide square element is an L-infinity ball of radius r
        let radius = self.config.morph_kernel_size / 2;
        if radius == 0 {
            return mask;
        }
        let closed = morphology::close(&mask, Norm::LInf, radius);
        morphology::open(&closed, Norm::LInf, radius)
    }
}

/// Copy of `mask` inside a one-pixel background border
fn pad_mask(mask: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);
    padded
}

/// Tight axis-aligned rectangle around the contour pixels
fn contour_bounds(contour: &Contour<u32>) -> Option<BoundingBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}

/// Shoelace area of the contour polygon through its border pixel centers
fn polygon_area(contour: &Contour<u32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    twice_area.abs() / 2.0
}
