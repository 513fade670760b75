// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Label localization tests: detector, extractor and segmenter chained on
//! synthetic photos the way the dispatcher chains them

use crate::common::{fill, two_line_label, unlabeled_photo, BLACK, PINK, WHITE};
use fabstir_label_ocr::config::{PipelineConfig, RegionConfig, SegmentConfig};
use fabstir_label_ocr::vision::label::{
    extract_region, padded_bounds, BoundingBox, LineSegmenter, RegionDetector,
};
use image::RgbImage;

fn detector() -> RegionDetector {
    RegionDetector::new(RegionConfig::default())
}

fn segmenter() -> LineSegmenter {
    LineSegmenter::new(SegmentConfig::default())
}

fn assert_near(actual: u32, expected: u32, tolerance: u32) {
    assert!(
        actual.abs_diff(expected) <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}

#[test]
fn test_round_trip_two_line_label() {
    let photo = two_line_label();

    let bbox = detector().detect(&photo).expect("label should be detected");
    assert_near(bbox.x, 50, 2);
    assert_near(bbox.y, 50, 2);
    assert_near(bbox.width, 300, 4);
    assert_near(bbox.height, 100, 4);

    let padding = PipelineConfig::default().extract.label_padding_fraction;
    let crop = extract_region(&photo, &bbox, padding).unwrap();
    assert!(crop.bounds.fits_within(400, 200));
    assert_eq!(crop.image.dimensions(), (crop.bounds.width, crop.bounds.height));

    let lines = segmenter().segment(&crop.image);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].bounds.y < lines[1].bounds.y);
    assert_eq!(lines[0].index, 0);
    assert_eq!(lines[1].index, 1);

    // Stripes sit at photo rows 70..85 and 110..125
    let first_top = crop.bounds.y + lines[0].bounds.y;
    let second_top = crop.bounds.y + lines[1].bounds.y;
    assert!(first_top <= 70 && crop.bounds.y + lines[0].bounds.bottom() >= 85);
    assert!(second_top <= 110 && crop.bounds.y + lines[1].bounds.bottom() >= 125);
}

#[test]
fn test_no_label_colored_pixels_means_no_region() {
    assert!(detector().detect(&unlabeled_photo()).is_none());
    assert!(detector()
        .detect(&RgbImage::from_pixel(120, 80, WHITE))
        .is_none());
}

#[test]
fn test_largest_label_wins() {
    let mut photo = RgbImage::from_pixel(600, 300, WHITE);
    fill(&mut photo, 20, 20, 140, 80, PINK);
    fill(&mut photo, 250, 100, 550, 250, PINK);

    let bbox = detector().detect(&photo).unwrap();
    assert_near(bbox.x, 250, 2);
    assert_near(bbox.width, 300, 4);
}

#[test]
fn test_padding_grows_monotonically_and_stays_inside() {
    let bbox = BoundingBox::new(50, 50, 300, 100);
    let mut previous: Option<BoundingBox> = None;

    for fraction in [0.0, 0.02, 0.05, 0.1, 0.5, 2.0] {
        let padded = padded_bounds(400, 200, &bbox, fraction).unwrap();
        assert!(padded.fits_within(400, 200));
        assert!(padded.contains(&bbox));
        if let Some(prev) = previous {
            assert!(padded.width >= prev.width);
            assert!(padded.height >= prev.height);
        }
        previous = Some(padded);
    }
}

#[test]
fn test_uniform_label_has_no_lines() {
    let label = RgbImage::from_pixel(320, 110, PINK);
    assert!(segmenter().segment(&label).is_empty());
}

/// Photo with a 300x100 pink label whose top-left corner sits at `(x, y)`
fn label_at(x: u32, y: u32) -> RgbImage {
    let mut photo = RgbImage::from_pixel(400, 200, WHITE);
    fill(&mut photo, x, y, x + 300, y + 100, PINK);
    photo
}

#[test]
fn test_labels_touching_each_edge_are_found_and_cropped() {
    let padding = PipelineConfig::default().extract.label_padding_fraction;
    // left, top, right, bottom, top-left corner, bottom-right corner
    let placements = [(0, 50), (50, 0), (100, 50), (50, 100), (0, 0), (100, 100)];

    for (x, y) in placements {
        let photo = label_at(x, y);
        let bbox = detector()
            .detect(&photo)
            .unwrap_or_else(|| panic!("label at ({}, {}) not detected", x, y));
        assert_near(bbox.x, x, 2);
        assert_near(bbox.y, y, 2);
        assert_near(bbox.right(), x + 300, 2);
        assert_near(bbox.bottom(), y + 100, 2);

        let crop = extract_region(&photo, &bbox, padding).unwrap();
        assert!(crop.bounds.fits_within(400, 200), "{:?}", crop.bounds);
        assert!(crop.bounds.contains(&bbox), "{:?} vs {:?}", crop.bounds, bbox);
        assert_eq!(
            crop.image.dimensions(),
            (crop.bounds.width, crop.bounds.height)
        );
        // Padding is clipped exactly at whichever edges the label touches
        if bbox.x == 0 {
            assert_eq!(crop.bounds.x, 0);
        }
        if bbox.y == 0 {
            assert_eq!(crop.bounds.y, 0);
        }
        if bbox.right() == 400 {
            assert_eq!(crop.bounds.right(), 400);
        }
        if bbox.bottom() == 200 {
            assert_eq!(crop.bounds.bottom(), 200);
        }
    }
}

#[test]
fn test_edge_label_round_trip_segments_lines() {
    let mut photo = label_at(0, 50);
    fill(&mut photo, 20, 70, 260, 85, BLACK);
    fill(&mut photo, 20, 110, 240, 125, BLACK);

    let bbox = detector().detect(&photo).expect("label at the left edge");
    assert_eq!(bbox.x, 0);

    let padding = PipelineConfig::default().extract.label_padding_fraction;
    let crop = extract_region(&photo, &bbox, padding).unwrap();
    assert_eq!(crop.bounds.x, 0);
    assert_eq!(segmenter().segment(&crop.image).len(), 2);
}

#[test]
fn test_full_frame_label_crop_is_whole_photo() {
    let photo = RgbImage::from_pixel(400, 200, PINK);
    let bbox = detector().detect(&photo).expect("full-frame label");
    assert_eq!(bbox, BoundingBox::new(0, 0, 400, 200));

    let crop = extract_region(&photo, &bbox, 0.05).unwrap();
    assert_eq!(crop.bounds, bbox);
}
