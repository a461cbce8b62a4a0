//! Core building blocks for the detection pipeline.
//!
//! * [`errors`] - Error types and the [`CareResult`] alias
//! * [`config`] - Detector configuration with validation
//! * [`inference`] - ONNX Runtime inference engine

pub mod config;
pub mod errors;
pub mod inference;

pub use config::DetectorConfig;
pub use errors::{CareLabelError, CareResult, ProcessingStage};
pub use inference::InferenceEngine;

/// A 4D tensor of f32 values, typically `[batch, channels, height, width]`.
pub type Tensor4D = ndarray::Array4<f32>;

/// A 3D tensor of f32 values, typically a model's raw prediction output.
pub type Tensor3D = ndarray::Array3<f32>;
