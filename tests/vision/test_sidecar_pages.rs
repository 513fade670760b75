// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Raw sidecar payloads through page parsing and normalization

use fabstir_label_ocr::vision::ocr::sidecar::parse_pages;
use fabstir_label_ocr::vision::ocr::{
    normalize_line_pages, normalize_pages, LinePage, RecognitionPage,
};
use serde_json::json;

#[test]
fn test_mixed_page_shapes_from_one_response() {
    let raw = vec![
        json!({
            "dt_polys": [[[1, 1], [9, 1], [9, 5], [1, 5]]],
            "rec_texts": ["NET WT", "500G", "EXTRA"],
            "rec_scores": [0.95, 0.9]
        }),
        json!([[[[0, 20], [8, 20], [8, 26], [0, 26]], ["LEGACY", 0.5]]]),
        json!(null),
    ];

    let pages: Vec<RecognitionPage> = parse_pages(raw);
    assert_eq!(pages.len(), 2);

    let items = normalize_pages(&pages);
    let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["NET WT", "500G", "LEGACY"]);
    assert_eq!(items[0].polygon.len(), 4);
    assert!(items[1].polygon.is_empty());
    assert_eq!(items[2].polygon[0], [0.0, 20.0]);
}

#[test]
fn test_line_pages_from_sidecar() {
    let raw = vec![
        json!({ "rec_text": "SKU 1188", "rec_score": 0.81 }),
        json!({ "rec_text": null, "rec_score": 0.5 }),
        json!({ "rec_text": "NO SCORE" }),
        json!({ "rec_text": "HIGH", "rec_score": 1.4 }),
    ];

    let pages: Vec<LinePage> = parse_pages(raw);
    let items = normalize_line_pages(&pages);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].text, "SKU 1188");
    assert!(items[0].polygon.is_empty());
    assert_eq!(items[1].confidence, 1.0);
}
