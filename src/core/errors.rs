//! Error types for the detection and reconciliation pipeline.
//!
//! This module defines the error taxonomy the pipeline exposes: image decode
//! failures (recoverable, the user retakes the photo), model load failures
//! (fatal for the session), inference failures (recoverable per call),
//! processing failures tagged with the stage they occurred in, and the
//! manual-selection completeness violation (a validation failure, not a
//! system error). Utility constructors attach context to each error.

use crate::domain::Category;
use thiserror::Error;

/// Convenient result alias for pipeline operations.
pub type CareResult<T> = Result<T, CareLabelError>;

/// Enum representing different stages of processing in the pipeline.
///
/// This enum is used to identify which stage of the pipeline an error
/// occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred during tensor operations.
    TensorOperation,
    /// Error occurred during detection post-processing.
    PostProcessing,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
        }
    }
}

/// Enum representing the errors that can occur in the pipeline.
#[derive(Error, Debug)]
pub enum CareLabelError {
    /// The captured image could not be decoded. Recoverable: the user
    /// retakes the photo.
    #[error("image decode")]
    ImageDecode(#[source] image::ImageError),

    /// The bundled model resource could not be loaded. Fatal at session
    /// start; surfaced as "feature unavailable".
    #[error("model load failed for '{path}': {message}")]
    ModelLoad {
        /// Path of the model file that failed to load.
        path: std::path::PathBuf,
        /// A message describing the failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single inference call failed. Recoverable: the caller may retry
    /// with the same or another image.
    #[error("inference")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error occurred during a processing stage.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Manual-selection confirmation was attempted without covering every
    /// mandatory category. Blocks the transition only; the selection state
    /// is left untouched.
    #[error("selection incomplete: missing {missing:?}")]
    IncompleteSelection {
        /// Categories with no selected symbol.
        missing: Vec<Category>,
    },

    /// Error indicating invalid input or an invalid state transition.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },
}

impl CareLabelError {
    /// Creates an error for a failed model load.
    pub fn model_load(
        path: impl Into<std::path::PathBuf>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an error for a failed model load without an underlying cause.
    pub fn model_load_message(
        path: impl Into<std::path::PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for a failed inference call.
    pub fn inference(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Inference(Box::new(error))
    }

    /// Creates an error for tensor operations.
    pub fn tensor_operation(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind: ProcessingStage::TensorOperation,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for post-processing operations.
    pub fn post_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind: ProcessingStage::PostProcessing,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an error for configuration problems.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the operation that produced this error.
    ///
    /// Decode and inference failures are retryable (the user retakes the
    /// photo or triggers analysis again). Model load failures are not: the
    /// session cannot recover without a valid model resource. Incomplete
    /// selection is a validation refusal, retried by changing the selection.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ImageDecode(_) | Self::Inference(_) | Self::IncompleteSelection { .. }
        )
    }
}

impl From<image::ImageError> for CareLabelError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageDecode(error)
    }
}

impl From<ort::Error> for CareLabelError {
    fn from(error: ort::Error) -> Self {
        Self::Inference(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_and_inference_are_retryable() {
        let decode = CareLabelError::ImageDecode(image::ImageError::IoError(
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"),
        ));
        assert!(decode.is_retryable());

        let inference = CareLabelError::inference(std::io::Error::other("runtime fault"));
        assert!(inference.is_retryable());
    }

    #[test]
    fn model_load_is_fatal() {
        let err = CareLabelError::model_load_message("models/missing.onnx", "file not found");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("models/missing.onnx"));
    }

    #[test]
    fn incomplete_selection_names_missing_categories() {
        let err = CareLabelError::IncompleteSelection {
            missing: vec![Category::Drying, Category::Ironing],
        };
        let text = err.to_string();
        assert!(text.contains("Drying"));
        assert!(text.contains("Ironing"));
    }
}
