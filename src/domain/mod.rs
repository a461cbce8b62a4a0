//! Domain types for care-label symbols.
//!
//! * [`catalog`] - The static symbol catalog and treatment categories
//! * [`symbol`] - Detections, care symbols, and enrichment

pub mod catalog;
pub mod symbol;

pub use catalog::{Category, SymbolCatalog, SymbolInfo, PLACEHOLDER_ICON, UNKNOWN_DESCRIPTION};
pub use symbol::{enrich, enrich_symbols, BoundingBox, CareSymbol, Detection};
