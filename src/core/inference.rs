//! ONNX Runtime inference engine for the symbol-detection model.
//!
//! The engine exclusively owns its loaded session: it is created once per
//! reviewing session and the underlying model resource is released when the
//! engine is dropped. Session access is serialized through a mutex, so the
//! non-reentrant runtime is never entered concurrently.

use crate::core::errors::{CareLabelError, CareResult};
use crate::core::Tensor4D;
use crate::processors::postprocess::RawPredictions;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Loads an ONNX session from a model file.
///
/// A missing or corrupt model resource is a fatal initialization error.
pub fn load_session(model_path: impl AsRef<Path>) -> CareResult<Session> {
    let path = model_path.as_ref();
    let session = Session::builder()
        .and_then(|b| b.commit_from_file(path))
        .map_err(|e| {
            CareLabelError::model_load(path, "failed to create ONNX session", e)
        })?;
    Ok(session)
}

/// An inference engine wrapping one loaded detection model.
pub struct InferenceEngine {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl InferenceEngine {
    /// Loads the model and discovers its input/output tensor names.
    pub fn from_file(model_path: impl AsRef<Path>) -> CareResult<Self> {
        let path = model_path.as_ref();
        let session = load_session(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                CareLabelError::model_load_message(path, "model declares no input tensors")
            })?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                CareLabelError::model_load_message(path, "model declares no output tensors")
            })?;

        info!(
            model = %path.display(),
            input = %input_name,
            output = %output_name,
            "detection model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_path: path.to_path_buf(),
        })
    }

    /// Path of the loaded model file.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Runs the model over one preprocessed input tensor.
    ///
    /// Returns the raw predictions already transposed into per-anchor rows.
    /// A runtime failure here is recoverable for the session; the caller may
    /// retry with another image.
    pub fn infer(&self, x: &Tensor4D) -> CareResult<RawPredictions> {
        let input_shape = x.shape().to_vec();
        if input_shape[0] != 1 {
            return Err(CareLabelError::invalid_input(format!(
                "engine accepts single-image batches, got batch size {}",
                input_shape[0]
            )));
        }

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            CareLabelError::inference(e)
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session_guard = self.session.lock().map_err(|_| {
            CareLabelError::invalid_input("inference session lock poisoned")
        })?;

        let outputs = session_guard
            .run(inputs)
            .map_err(CareLabelError::inference)?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(CareLabelError::inference)?;

        debug!(
            input_shape = ?input_shape,
            output_shape = ?output_shape,
            "inference complete"
        );

        RawPredictions::from_model_output(output_shape, output_data)
    }
}
