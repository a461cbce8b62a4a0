//! Image preprocessing for the detection model.
//!
//! Converts a decoded photo into the fixed-size normalized tensor the model
//! expects: bilinear resize to `S×S`, pixel values rescaled from `[0, 255]`
//! into `[0, 1]`, laid out in CHW order with a leading batch axis. Bilinear
//! interpolation is required; nearest-neighbor degrades the thin line-art
//! the symbols are drawn with.

use crate::core::errors::{CareLabelError, CareResult};
use crate::core::Tensor4D;
use image::{imageops, imageops::FilterType, RgbImage};
use rayon::prelude::*;
use tracing::debug;

const CHANNELS: usize = 3;
const SCALE: f32 = 1.0 / 255.0;

/// Preprocesses photos into model input tensors.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    input_size: u32,
}

impl ImagePreprocessor {
    /// Creates a preprocessor for a square model input of `input_size`.
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }

    /// Square dimension of the produced tensor.
    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Resizes and normalizes an image into a `[1, 3, S, S]` tensor.
    pub fn preprocess(&self, img: &RgbImage) -> CareResult<Tensor4D> {
        let size = self.input_size;
        debug!(
            width = img.width(),
            height = img.height(),
            target = size,
            "preprocessing image"
        );

        let resized = imageops::resize(img, size, size, FilterType::Triangle);

        let side = size as usize;
        let plane = side * side;
        let mut data = vec![0.0f32; CHANNELS * plane];

        data.par_chunks_mut(plane)
            .enumerate()
            .for_each(|(channel, out)| {
                for y in 0..side {
                    for x in 0..side {
                        let pixel = resized.get_pixel(x as u32, y as u32);
                        out[y * side + x] = pixel[channel] as f32 * SCALE;
                    }
                }
            });

        Tensor4D::from_shape_vec((1, CHANNELS, side, side), data)
            .map_err(|e| CareLabelError::tensor_operation("building model input tensor", e))
    }
}
