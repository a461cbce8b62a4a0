//! Image processing stages of the detection pipeline.
//!
//! * [`preprocess`] - Resize and normalization into the model input tensor
//! * [`postprocess`] - Anchor decoding, thresholding, and NMS

pub mod postprocess;
pub mod preprocess;

pub use postprocess::{DetectionPostProcessor, RawPredictions};
pub use preprocess::ImagePreprocessor;
