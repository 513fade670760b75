// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! OCR endpoint tests
//!
//! Drive the router with `oneshot` and verify:
//! - Multipart upload handling (named and unnamed file fields)
//! - 400 for missing, oversized and undecodable uploads
//! - 503 when no recognition backend is loaded
//! - The uniform error body `{ error, results: [] }`
//! - Health output

use crate::common::{png_bytes, two_line_label, unlabeled_photo, ScriptedFull, ScriptedLine};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use fabstir_label_ocr::api::{create_app, AppState};
use fabstir_label_ocr::config::PipelineConfig;
use fabstir_label_ocr::vision::RecognitionDispatcher;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "label-ocr-test-boundary";

fn multipart_body(field: &str, file_name: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    let mut body = format!(
        "--{}\r\nContent-Disposition: {}\r\nContent-Type: application/octet-stream\r\n\r\n",
        BOUNDARY, disposition
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn ocr_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/ocr")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn state_with_backend(max_upload_bytes: usize) -> AppState {
    let full = Arc::new(ScriptedFull::answering(vec![json!({
        "dt_polys": [[[10, 10], [90, 10], [90, 30], [10, 30]]],
        "rec_texts": ["WHOLE PHOTO"],
        "rec_scores": [0.77]
    })]));
    let line = Arc::new(ScriptedLine::answering(vec!["FIRST LINE", "SECOND LINE"]));
    let dispatcher = RecognitionDispatcher::new(PipelineConfig::default(), full, line);
    AppState::new(Some(Arc::new(dispatcher)), max_upload_bytes)
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_error_body(body: &Value) {
    assert!(body["error"].is_string(), "error message missing: {}", body);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_label_photo_is_read_line_by_line() {
    let app = create_app(state_with_backend(10 * 1024 * 1024));
    let body = multipart_body("file", Some("label.png"), &png_bytes(&two_line_label()));

    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["results"][0]["text"], "FIRST LINE");
    assert_eq!(body["results"][1]["text"], "SECOND LINE");
    assert_eq!(body["results"][0]["box"], json!([]));
    assert_eq!(body["profiling"]["strategy"], "label-detected-and-segmented");
    assert_eq!(body["profiling"]["line_count"], 2);
    assert_eq!(body["profiling"]["image_width"], 400);
    assert!(body["profiling"]["timings_ms"]["total"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_unnamed_file_field_is_accepted() {
    let app = create_app(state_with_backend(10 * 1024 * 1024));
    let body = multipart_body("photo", Some("shelf.png"), &png_bytes(&unlabeled_photo()));

    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["profiling"]["strategy"], "no-label-found");
    assert_eq!(body["results"][0]["text"], "WHOLE PHOTO");
    assert_eq!(body["results"][0]["box"][2], json!([90.0, 30.0]));
    assert!(body["profiling"].get("label_box").is_none());
}

#[tokio::test]
async fn test_invalid_image_returns_400() {
    let app = create_app(state_with_backend(10 * 1024 * 1024));
    let body = multipart_body("file", Some("notes.txt"), b"definitely not an image");

    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_body(&json_body(response).await);
}

#[tokio::test]
async fn test_missing_file_field_returns_400() {
    let app = create_app(state_with_backend(10 * 1024 * 1024));
    let body = multipart_body("comment", None, b"hello");

    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_error_body(&body);
    assert!(body["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_oversized_upload_returns_400() {
    let app = create_app(state_with_backend(1024));
    let body = multipart_body("file", Some("big.bin"), &vec![0u8; 5000]);

    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_body(&json_body(response).await);
}

#[tokio::test]
async fn test_non_multipart_request_returns_400() {
    let app = create_app(state_with_backend(10 * 1024 * 1024));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ocr")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"image": "aGVsbG8="}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_body(&json_body(response).await);
}

#[tokio::test]
async fn test_no_backend_returns_503() {
    let app = create_app(AppState::new_for_test());
    let body = multipart_body("file", Some("label.png"), &png_bytes(&two_line_label()));

    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_error_body(&json_body(response).await);
}

#[tokio::test]
async fn test_backend_failure_returns_500() {
    let full = Arc::new(ScriptedFull::failing("rec model crashed"));
    let line = Arc::new(ScriptedLine::answering(vec![]));
    let dispatcher = RecognitionDispatcher::new(PipelineConfig::default(), full, line);
    let app = create_app(AppState::new(Some(Arc::new(dispatcher)), 10 * 1024 * 1024));

    let body = multipart_body("file", Some("shelf.png"), &png_bytes(&unlabeled_photo()));
    let response = app.oneshot(ocr_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_error_body(&body);
    assert!(body["error"].as_str().unwrap().contains("rec model crashed"));
}

#[tokio::test]
async fn test_ocr_route_rejects_get() {
    let app = create_app(AppState::new_for_test());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/ocr")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_backend() {
    let app = create_app(state_with_backend(1024));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "scripted-full");
    assert_eq!(body["version"], fabstir_label_ocr::version::VERSION_NUMBER);
}

#[tokio::test]
async fn test_health_without_backend() {
    let app = create_app(AppState::new_for_test());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let body = json_body(app.oneshot(request).await.unwrap()).await;
    assert_eq!(body["backend"], "none");
}
