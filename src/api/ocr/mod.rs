// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR API endpoint module
//!
//! Provides POST /ocr for reading text off a label photo.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::ocr_handler;
pub use request::{OcrUpload, FILE_FIELD};
pub use response::{OcrProfiling, OcrResponse, OcrTimings};
