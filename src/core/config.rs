//! Detector configuration.
//!
//! The configuration captures the fixed model contract (input size, class
//! count) together with the tunable post-processing thresholds. It can be
//! built in code or deserialized from JSON/TOML, and is validated before a
//! detector is constructed.

use crate::core::errors::{CareLabelError, CareResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default square input dimension expected by the model.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default number of symbol classes the model predicts.
pub const DEFAULT_NUM_CLASSES: usize = 31;

/// Default minimum class score for a candidate detection.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Default IoU threshold above which same-class boxes are suppressed.
pub const DEFAULT_NMS_IOU_THRESHOLD: f32 = 0.45;

/// Default cap on the number of detections returned per image.
pub const DEFAULT_MAX_DETECTIONS: usize = 100;

/// Configuration for the symbol detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Path to the bundled ONNX detection model.
    pub model_path: PathBuf,
    /// Square input dimension `S`; the model consumes `[1, 3, S, S]`.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Number of symbol classes in the model output.
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    /// Minimum winning-class score for a candidate detection.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// IoU threshold for non-maximum suppression.
    #[serde(default = "default_nms_iou_threshold")]
    pub nms_iou_threshold: f32,
    /// Maximum number of detections returned per image.
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
}

fn default_input_size() -> u32 {
    DEFAULT_INPUT_SIZE
}

fn default_num_classes() -> usize {
    DEFAULT_NUM_CLASSES
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_nms_iou_threshold() -> f32 {
    DEFAULT_NMS_IOU_THRESHOLD
}

fn default_max_detections() -> usize {
    DEFAULT_MAX_DETECTIONS
}

impl DetectorConfig {
    /// Creates a configuration for the given model path with default
    /// thresholds and the standard model contract.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_size: DEFAULT_INPUT_SIZE,
            num_classes: DEFAULT_NUM_CLASSES,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_iou_threshold: DEFAULT_NMS_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }

    /// Sets the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Sets the NMS IoU threshold.
    pub fn with_nms_iou_threshold(mut self, threshold: f32) -> Self {
        self.nms_iou_threshold = threshold;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// * `input_size` or `num_classes` is zero
    /// * `confidence_threshold` is not within `[0, 1]`
    /// * `nms_iou_threshold` is not within `(0, 1]`
    /// * `max_detections` is zero
    pub fn validate(&self) -> CareResult<()> {
        if self.input_size == 0 {
            return Err(CareLabelError::config("input_size must be greater than 0"));
        }

        if self.num_classes == 0 {
            return Err(CareLabelError::config("num_classes must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CareLabelError::config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if !(self.nms_iou_threshold > 0.0 && self.nms_iou_threshold <= 1.0) {
            return Err(CareLabelError::config(format!(
                "nms_iou_threshold must be within (0, 1], got {}",
                self.nms_iou_threshold
            )));
        }

        if self.max_detections == 0 {
            return Err(CareLabelError::config(
                "max_detections must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_model_contract() {
        let config = DetectorConfig::new("models/care_symbols.onnx");
        assert_eq!(config.input_size, 640);
        assert_eq!(config.num_classes, 31);
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.nms_iou_threshold, 0.45);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let config =
            DetectorConfig::new("models/care_symbols.onnx").with_confidence_threshold(1.5);
        assert!(config.validate().is_err());

        let config = DetectorConfig::new("models/care_symbols.onnx").with_nms_iou_threshold(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "model_path": "models/care_symbols.onnx" }"#).unwrap();
        assert_eq!(config.input_size, DEFAULT_INPUT_SIZE);
        assert_eq!(config.max_detections, DEFAULT_MAX_DETECTIONS);
        assert!(config.validate().is_ok());
    }
}
