// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text detection model
//!
//! The model produces a per-pixel text probability map. Pixels above the
//! binarization threshold are grouped into 4-connected components; components
//! whose mean probability clears the box threshold become axis-aligned boxes,
//! expanded by the unclip ratio and mapped back to the input image.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ndarray::{ArrayView2, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::page::Polygon;
use super::preprocessing::{preprocess_for_detection, PreprocessInfo};

/// Post-processing thresholds for the probability map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Pixel probability above which a pixel counts as text
    pub binary_threshold: f32,
    /// Minimum mean probability over a component
    pub box_threshold: f32,
    /// Components with fewer pixels are noise
    pub min_pixels: usize,
    /// Box growth: offset = area * ratio / perimeter
    pub unclip_ratio: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            binary_threshold: 0.3,
            box_threshold: 0.6,
            min_pixels: 10,
            unclip_ratio: 1.5,
        }
    }
}

/// A detected text box in the coordinate frame it was computed in
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean text probability over the component
    pub confidence: f32,
}

impl TextBox {
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Clockwise corners starting top-left
    pub fn polygon(&self) -> Polygon {
        let (x2, y2) = (self.x + self.width, self.y + self.height);
        vec![[self.x, self.y], [x2, self.y], [x2, y2], [self.x, y2]]
    }
}

/// PaddleOCR DB text detection model (CPU execution provider)
#[derive(Clone)]
pub struct TextDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    params: DetectionParams,
}

impl std::fmt::Debug for TextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDetector")
            .field("input_name", &self.input_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl TextDetector {
    /// Load the detection model (det_model.onnx)
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!("Loading OCR detection model from {}", model_path.display());

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
                    "Failed to load OCR detection model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Detection model input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            params: DetectionParams::default(),
        })
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    /// Detect text boxes, in `image` pixel coordinates, top-to-bottom then left-to-right
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<TextBox>> {
        let input = preprocess_for_detection(image);
        let input_value =
            Value::from_array(input.tensor).context("Failed to create detection input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Detection session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract detection output")?;

        let prob_map = probability_map(output.view())?;
        let boxes = boxes_from_probability_map(prob_map, &self.params, &input.info);
        debug!("Detected {} text regions", boxes.len());
        Ok(boxes)
    }
}

/// Reduce `[1, 1, H, W]`, `[1, H, W]` or `[H, W]` outputs to a 2-D map
fn probability_map(output: ndarray::ArrayViewD<'_, f32>) -> Result<ArrayView2<'_, f32>> {
    let mut view = output;
    while view.ndim() > 2 {
        if view.shape()[0] != 1 {
            anyhow::bail!("Unexpected detection output shape: {:?}", view.shape());
        }
        view = view.index_axis_move(ndarray::Axis(0), 0);
    }
    view.into_dimensionality::<Ix2>()
        .map_err(|e| anyhow!("Unexpected detection output shape: {}", e))
}

/// Connected-component boxes over the probability map, mapped through `info`
///
/// The map may be smaller than the detection canvas; coordinates are scaled
/// up to canvas size before the letterbox is undone.
pub fn boxes_from_probability_map(
    prob: ArrayView2<'_, f32>,
    params: &DetectionParams,
    info: &PreprocessInfo,
) -> Vec<TextBox> {
    let (height, width) = prob.dim();
    if height == 0 || width == 0 {
        return Vec::new();
    }
    let canvas = info.target_size as f32;
    let scale_x = canvas / width as f32;
    let scale_y = canvas / height as f32;

    let mut visited = vec![false; height * width];
    let mut boxes = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || prob[[y, x]] <= params.binary_threshold {
                continue;
            }
            let component = flood_fill(&prob, &mut visited, x, y, params.binary_threshold);
            if component.count < params.min_pixels {
                continue;
            }
            let score = component.sum / component.count as f32;
            if score < params.box_threshold {
                continue;
            }

            let w = (component.max_x - component.min_x + 1) as f32;
            let h = (component.max_y - component.min_y + 1) as f32;
            let offset = w * h * params.unclip_ratio / (2.0 * (w + h));

            let x1 = (component.min_x as f32 - offset) * scale_x;
            let y1 = (component.min_y as f32 - offset) * scale_y;
            let x2 = (component.max_x as f32 + 1.0 + offset) * scale_x;
            let y2 = (component.max_y as f32 + 1.0 + offset) * scale_y;

            let (ox1, oy1) = info.map_to_original(x1, y1);
            let (ox2, oy2) = info.map_to_original(x2, y2);
            let text_box = TextBox {
                x: ox1,
                y: oy1,
                width: ox2 - ox1,
                height: oy2 - oy1,
                confidence: score,
            };
            if text_box.is_valid() {
                boxes.push(text_box);
            }
        }
    }

    boxes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    boxes
}

struct Component {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    count: usize,
    sum: f32,
}

fn flood_fill(
    prob: &ArrayView2<'_, f32>,
    visited: &mut [bool],
    start_x: usize,
    start_y: usize,
    threshold: f32,
) -> Component {
    let (height, width) = prob.dim();
    let mut component = Component {
        min_x: start_x,
        max_x: start_x,
        min_y: start_y,
        max_y: start_y,
        count: 0,
        sum: 0.0,
    };
    let mut stack = vec![(start_x, start_y)];

    while let Some((x, y)) = stack.pop() {
        let idx = y * width + x;
        if visited[idx] {
            continue;
        }
        let p = prob[[y, x]];
        if p <= threshold {
            continue;
        }
        visited[idx] = true;
        component.count += 1;
        component.sum += p;
        component.min_x = component.min_x.min(x);
        component.max_x = component.max_x.max(x);
        component.min_y = component.min_y.min(y);
        component.max_y = component.max_y.max(y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }
    component
}
