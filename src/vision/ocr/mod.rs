// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition collaborators
//!
//! Components:
//! - `engine` - Collaborator traits the dispatcher depends on
//! - `page` - Page shapes returned by collaborators and the uniform output item
//! - `normalize` - Page to item conversion
//! - `model` - In-process PaddleOCR ONNX pipeline (`detection`, `recognition`, `preprocessing`)
//! - `sidecar` - Client for an external PaddleOCR process

pub mod detection;
pub mod engine;
pub mod model;
pub mod normalize;
pub mod page;
pub mod preprocessing;
pub mod recognition;
pub mod sidecar;

pub use detection::{DetectionParams, TextBox, TextDetector};
pub use engine::{FullTextRecognizer, LineTextRecognizer};
pub use model::PaddleOcrModel;
pub use normalize::{normalize_line_pages, normalize_page, normalize_pages};
pub use page::{LinePage, Polygon, RecognitionItem, RecognitionPage, StructuredPage};
pub use recognition::{CharDictionary, RecognizedText, TextRecognizer};
pub use sidecar::{PredictMode, SidecarClient};
