// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the PaddleOCR ONNX models

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Square canvas the detection model runs on
pub const DET_INPUT_SIZE: u32 = 640;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Widest recognition input; label lines are long so this exceeds the usual 320
pub const REC_MAX_WIDTH: u32 = 960;

/// Narrowest recognition input the model accepts
pub const REC_MIN_WIDTH: u32 = 4;

/// Detection normalization (ImageNet)
pub const DET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const DET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Recognition normalization maps pixels to [-1, 1]
pub const REC_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
pub const REC_STD: [f32; 3] = [0.5, 0.5, 0.5];

const PAD_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Detection tensor plus the letterbox geometry needed to undo it
pub struct DetectionInput {
    pub tensor: Array4<f32>,
    pub info: PreprocessInfo,
}

/// Letterbox an image onto the detection canvas and normalize it to NCHW
pub fn preprocess_for_detection(image: &DynamicImage) -> DetectionInput {
    let info = PreprocessInfo::new(image, DET_INPUT_SIZE);
    let canvas = letterbox(image, &info, DET_INPUT_SIZE);
    DetectionInput {
        tensor: to_nchw(&canvas, DET_MEAN, DET_STD),
        info,
    }
}

/// Resize a text crop to the recognition height with aspect-preserving width
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let scale = REC_INPUT_HEIGHT as f32 / height.max(1) as f32;
    let new_width = ((width as f32 * scale).round() as u32).clamp(REC_MIN_WIDTH, REC_MAX_WIDTH);

    let resized = image
        .resize_exact(new_width, REC_INPUT_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();
    to_nchw(&resized, REC_MEAN, REC_STD)
}

/// Normalize an RGB image into a `[1, 3, H, W]` tensor
fn to_nchw(rgb: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }
    tensor
}

/// Scale into the centered region described by `info`, gray elsewhere
fn letterbox(image: &DynamicImage, info: &PreprocessInfo, target_size: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(target_size, target_size, PAD_GRAY);
    if info.original_width == 0 || info.original_height == 0 {
        return canvas;
    }
    let resized = image
        .resize_exact(info.scaled_width, info.scaled_height, FilterType::Lanczos3)
        .to_rgb8();
    image::imageops::replace(
        &mut canvas,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );
    canvas
}

/// Scaling and offsets applied by the detection letterbox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    /// Side of the square canvas
    pub target_size: u32,
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Self {
                target_size,
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                scaled_width: 0,
                scaled_height: 0,
                original_width: width,
                original_height: height,
            };
        }

        let scale = (target_size as f32 / width as f32).min(target_size as f32 / height as f32);
        let scaled_width = ((width as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((height as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            target_size,
            scale,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
            scaled_width,
            scaled_height,
            original_width: width,
            original_height: height,
        }
    }

    /// Map a canvas coordinate back to the original image, clamped to its bounds
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let ox = (x - self.offset_x as f32) / self.scale;
        let oy = (y - self.offset_y as f32) / self.scale;
        (
            ox.clamp(0.0, self.original_width as f32),
            oy.clamp(0.0, self.original_height as f32),
        )
    }
}
