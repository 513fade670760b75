// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line and environment overrides for the OCR server

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{load_config, AppConfig, ConfigError, RecognitionBackend};

#[derive(Parser, Debug)]
#[command(name = "fabstir-label-ocr")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "HTTP service that reads text off pink labels", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "LABEL_OCR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "LABEL_OCR_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "LABEL_OCR_PORT")]
    pub port: Option<u16>,

    /// Recognition backend
    #[arg(long, env = "LABEL_OCR_BACKEND", value_enum)]
    pub backend: Option<BackendArg>,

    /// Directory holding the PaddleOCR ONNX models
    #[arg(long, env = "LABEL_OCR_MODEL_DIR")]
    pub model_dir: Option<String>,

    /// Base URL of the PaddleOCR sidecar
    #[arg(long, env = "LABEL_OCR_SIDECAR_URL")]
    pub sidecar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Onnx,
    Sidecar,
}

impl From<BackendArg> for RecognitionBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Onnx => RecognitionBackend::Onnx,
            BackendArg::Sidecar => RecognitionBackend::Sidecar,
        }
    }
}

impl Cli {
    /// File config (or defaults) with flag/env values layered on top
    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.backend {
            config.recognition.backend = backend.into();
        }
        if let Some(dir) = &self.model_dir {
            config.recognition.model_dir = dir.clone();
        }
        if let Some(url) = &self.sidecar_url {
            config.recognition.sidecar_url = url.clone();
        }
    }
}
