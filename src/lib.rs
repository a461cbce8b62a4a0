//! # carelabel
//!
//! A Rust library that detects laundering symbols on garment-care labels
//! using an ONNX object-detection model, and reconciles the detected set
//! with the user through a confirm/correct workflow.
//!
//! ## Pipeline
//!
//! Data flows one way:
//!
//! image → preprocessor → inference engine → post-processor → enrichment
//! → analyzer → reconciliation workflow → final symbol set
//!
//! - **Preprocessing**: decode the photo, bilinear-resize to the model's
//!   square input, normalize pixels into `[0, 1]` in CHW order.
//! - **Inference**: run the ONNX session, transpose the model-native
//!   `[1, 4+classes, anchors]` output into per-anchor rows.
//! - **Post-processing**: decode anchor boxes, threshold class scores,
//!   resolve class indices through the symbol catalog, and collapse
//!   overlapping duplicates with class-aware non-maximum suppression.
//! - **Enrichment**: attach icon, category, and description from the
//!   catalog and sort results deterministically.
//! - **Reconciliation**: a closed state machine that lets the user accept
//!   the detected set or correct it through manual selection, guarded by
//!   a per-category completeness check.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, and the inference engine
//! * [`domain`] - Symbol catalog, categories, detections, care symbols
//! * [`processors`] - Image preprocessing and detection post-processing
//! * [`pipeline`] - The analyzer (result repository) and review workflow
//! * [`utils`] - Image loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carelabel::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DetectorConfig::new("models/care_symbols.onnx");
//! let analyzer = SymbolAnalyzer::new(&config)?;
//!
//! let mut session = ReviewSession::new(analyzer);
//! let symbols = session.analyze(Path::new("label.jpg"))?;
//! println!("detected {} symbols", symbols.len());
//!
//! // The user confirms the shown set is correct.
//! let accepted = session.confirm()?;
//! for symbol in accepted {
//!     println!("{} {} ({})", symbol.icon, symbol.description, symbol.key);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use carelabel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{CareLabelError, CareResult, DetectorConfig};
    pub use crate::domain::{CareSymbol, Category, Detection, SymbolCatalog};
    pub use crate::pipeline::{ReviewSession, SymbolAnalyzer, SymbolSource, WorkflowState};
    pub use crate::utils::load_image;
}
