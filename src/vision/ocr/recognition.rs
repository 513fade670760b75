// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! Recognizes the text in a single cropped line or word image using the CRNN
//! recognition model and greedy CTC decoding.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ndarray::{ArrayView2, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::preprocess_for_recognition;

/// CTC blank class index
pub const CTC_BLANK: usize = 0;

/// Recognized text with its mean character confidence
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    pub confidence: f32,
}

impl RecognizedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Character table indexed by model class; class 0 is the CTC blank
#[derive(Debug, Clone, PartialEq)]
pub struct CharDictionary {
    symbols: Vec<String>,
}

impl CharDictionary {
    /// One symbol per line, followed by a trailing space symbol
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut symbols = vec![String::new()];
        for line in reader.lines() {
            let line = line.context("Failed to read dictionary line")?;
            let symbol = line.trim_end_matches(['\r', '\n']);
            if !symbol.is_empty() {
                symbols.push(symbol.to_string());
            }
        }
        symbols.push(" ".to_string());
        Ok(Self { symbols })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Number of classes including the blank
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.len() <= 1
    }

    pub fn symbol(&self, class: usize) -> Option<&str> {
        if class == CTC_BLANK {
            return None;
        }
        self.symbols.get(class).map(String::as_str)
    }
}

/// PaddleOCR CRNN recognition model (CPU execution provider)
#[derive(Clone)]
pub struct TextRecognizer {
    session: Arc<Mutex<Session>>,
    dictionary: Arc<CharDictionary>,
    input_name: String,
}

impl std::fmt::Debug for TextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRecognizer")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl TextRecognizer {
    /// Load rec_model.onnx and its character dictionary
    pub fn new<P: AsRef<Path>, D: AsRef<Path>>(model_path: P, dict_path: D) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        let dictionary = CharDictionary::load(dict_path)?;
        info!(
            "Loading OCR recognition model from {} ({} classes)",
            model_path.display(),
            dictionary.len()
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR recognition model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Recognition model input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary(&self) -> &CharDictionary {
        &self.dictionary
    }

    /// Recognize the text in a cropped line image
    pub fn recognize(&self, image: &DynamicImage) -> Result<RecognizedText> {
        let tensor = preprocess_for_recognition(image);
        let input_value =
            Value::from_array(tensor).context("Failed to create recognition input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Recognition session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract recognition output")?;

        let mut view = output.view();
        if view.ndim() == 3 {
            view = view.index_axis_move(ndarray::Axis(0), 0);
        }
        let probs = view
            .into_dimensionality::<Ix2>()
            .map_err(|e| anyhow!("Unexpected recognition output shape: {}", e))?;

        Ok(ctc_greedy_decode(probs, &self.dictionary))
    }
}

/// Best-path CTC decoding over a `[timesteps, classes]` probability matrix
///
/// Repeated classes collapse and blanks separate them; confidence is the mean
/// winning probability of the emitted characters (0 when nothing is emitted).
pub fn ctc_greedy_decode(probs: ArrayView2<'_, f32>, dictionary: &CharDictionary) -> RecognizedText {
    let mut text = String::new();
    let mut score_sum = 0.0f32;
    let mut emitted = 0usize;
    let mut previous = CTC_BLANK;

    for row in probs.rows() {
        let (class, prob) = row
            .iter()
            .enumerate()
            .fold((CTC_BLANK, f32::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });

        if class != previous {
            if let Some(symbol) = dictionary.symbol(class) {
                text.push_str(symbol);
                score_sum += prob;
                emitted += 1;
            }
        }
        previous = class;
    }

    let confidence = if emitted == 0 {
        0.0
    } else {
        (score_sum / emitted as f32).clamp(0.0, 1.0)
    };

    RecognizedText { text, confidence }
}
