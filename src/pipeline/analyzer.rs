//! The symbol analyzer: the pipeline's single entry point.
//!
//! Owns the inference engine for the lifetime of a reviewing session and
//! composes the stages into `analyze(image) -> Result<Vec<CareSymbol>>`.
//! Failures from any stage surface as tagged [`CareLabelError`] values;
//! nothing below this boundary panics into the caller.

use crate::core::config::DetectorConfig;
use crate::core::errors::{CareLabelError, CareResult};
use crate::core::inference::InferenceEngine;
use crate::domain::catalog::SymbolCatalog;
use crate::domain::symbol::{enrich, CareSymbol, Detection};
use crate::processors::postprocess::DetectionPostProcessor;
use crate::processors::preprocess::ImagePreprocessor;
use crate::utils::load_image;
use image::RgbImage;
use std::path::Path;
use tracing::debug;

/// Anything that can turn a captured image into care symbols.
///
/// The review workflow consumes this seam, so it can be driven by the real
/// analyzer or by a test double.
pub trait SymbolSource {
    /// Analyzes one captured image and returns the enriched symbol set.
    fn analyze(&self, image: &Path) -> CareResult<Vec<CareSymbol>>;
}

/// Detects and enriches care symbols in label photos.
#[derive(Debug)]
pub struct SymbolAnalyzer {
    engine: InferenceEngine,
    preprocessor: ImagePreprocessor,
    postprocessor: DetectionPostProcessor,
    catalog: &'static SymbolCatalog,
}

impl SymbolAnalyzer {
    /// Validates the configuration, loads the model, and assembles the
    /// pipeline around the process-wide symbol catalog.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings or a class-count
    /// mismatch with the catalog, and a model-load error (fatal for the
    /// session) if the model resource cannot be loaded.
    pub fn new(config: &DetectorConfig) -> CareResult<Self> {
        Self::with_catalog(config, SymbolCatalog::global())
    }

    /// Like [`SymbolAnalyzer::new`] with an explicit catalog.
    pub fn with_catalog(
        config: &DetectorConfig,
        catalog: &'static SymbolCatalog,
    ) -> CareResult<Self> {
        config.validate()?;

        if config.num_classes != catalog.num_classes() {
            return Err(CareLabelError::config(format!(
                "num_classes {} does not match the symbol catalog's {} classes",
                config.num_classes,
                catalog.num_classes()
            )));
        }

        let engine = InferenceEngine::from_file(&config.model_path)?;

        Ok(Self {
            engine,
            preprocessor: ImagePreprocessor::new(config.input_size),
            postprocessor: DetectionPostProcessor::new(
                config.input_size,
                config.num_classes,
                config.confidence_threshold,
                config.nms_iou_threshold,
                config.max_detections,
            ),
            catalog,
        })
    }

    /// The catalog this analyzer resolves classes against.
    pub fn catalog(&self) -> &'static SymbolCatalog {
        self.catalog
    }

    /// Runs detection over an already-decoded image.
    pub fn analyze_image(&self, img: &RgbImage) -> CareResult<Vec<CareSymbol>> {
        let tensor = self.preprocessor.preprocess(img)?;
        let raw = self.engine.infer(&tensor)?;
        let detections: Vec<Detection> = self.postprocessor.process(&raw, self.catalog)?;
        Ok(enrich(&detections, self.catalog))
    }

    /// Decodes the image at `path` and runs detection over it.
    ///
    /// An unreadable or corrupt image surfaces as a decode error; the user
    /// retakes the photo and the session stays usable.
    pub fn analyze_path(&self, path: &Path) -> CareResult<Vec<CareSymbol>> {
        debug!(image = %path.display(), "analyzing label photo");
        let img = load_image(path)?;
        self.analyze_image(&img)
    }
}

impl SymbolSource for SymbolAnalyzer {
    fn analyze(&self, image: &Path) -> CareResult<Vec<CareSymbol>> {
        self.analyze_path(image)
    }
}
