// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition backend manager
//!
//! Loads the configured collaborators once at startup. A backend that fails to
//! load is logged and left unavailable; requests then answer 503 instead of the
//! process refusing to start.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{RecognitionBackend, RecognitionConfig};
use crate::vision::ocr::{FullTextRecognizer, LineTextRecognizer, PaddleOcrModel, SidecarClient};

/// Loaded collaborator pair, shared read-only across requests
#[derive(Clone)]
pub struct RecognitionBackends {
    pub full: Arc<dyn FullTextRecognizer>,
    pub line: Arc<dyn LineTextRecognizer>,
}

impl RecognitionBackends {
    pub fn new(full: Arc<dyn FullTextRecognizer>, line: Arc<dyn LineTextRecognizer>) -> Self {
        Self { full, line }
    }

    /// Both traits backed by one value
    pub fn shared<T>(backend: T) -> Self
    where
        T: FullTextRecognizer + LineTextRecognizer + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            full: backend.clone(),
            line: backend,
        }
    }
}

/// Information about the configured recognition backend
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub name: String,
    pub backend: RecognitionBackend,
    pub available: bool,
}

pub struct RecognitionModelManager {
    backend: RecognitionBackend,
    backends: Option<RecognitionBackends>,
}

impl RecognitionModelManager {
    /// Load the backend named by `config`
    pub async fn new(config: &RecognitionConfig) -> Self {
        let backends = match config.backend {
            RecognitionBackend::Onnx => match PaddleOcrModel::load(&config.model_dir) {
                Ok(model) => {
                    tracing::info!("✅ PaddleOCR model loaded from {}", config.model_dir);
                    Some(RecognitionBackends::shared(model))
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Failed to load OCR model from {}: {:#}",
                        config.model_dir,
                        e
                    );
                    None
                }
            },
            RecognitionBackend::Sidecar => {
                let timeout = Duration::from_secs(config.sidecar_timeout_secs);
                match SidecarClient::new(&config.sidecar_url, timeout) {
                    Ok(client) => {
                        if client.health_check().await {
                            tracing::info!("✅ PaddleOCR sidecar reachable at {}", client.endpoint());
                        } else {
                            // Kept anyway; the sidecar may come up after us
                            tracing::warn!(
                                "⚠️ PaddleOCR sidecar at {} did not answer its health check",
                                client.endpoint()
                            );
                        }
                        Some(RecognitionBackends::shared(client))
                    }
                    Err(e) => {
                        tracing::warn!("⚠️ Failed to configure OCR sidecar: {:#}", e);
                        None
                    }
                }
            }
        };

        Self {
            backend: config.backend,
            backends,
        }
    }

    /// Manager around already-built collaborators
    pub fn with_backends(backend: RecognitionBackend, backends: RecognitionBackends) -> Self {
        Self {
            backend,
            backends: Some(backends),
        }
    }

    pub fn backends(&self) -> Option<RecognitionBackends> {
        self.backends.clone()
    }

    pub fn has_recognizer(&self) -> bool {
        self.backends.is_some()
    }

    pub fn info(&self) -> BackendInfo {
        BackendInfo {
            name: self
                .backends
                .as_ref()
                .map(|b| b.full.name().to_string())
                .unwrap_or_else(|| "none".to_string()),
            backend: self.backend,
            available: self.backends.is_some(),
        }
    }
}
