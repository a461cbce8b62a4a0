//! The analysis pipeline and reconciliation workflow.
//!
//! * [`analyzer`] - Composes preprocess → infer → post-process → enrich
//!   behind a single `analyze` entry point
//! * [`workflow`] - The review state machine driving user reconciliation

pub mod analyzer;
pub mod workflow;

pub use analyzer::{SymbolAnalyzer, SymbolSource};
pub use workflow::{ReviewSession, WorkflowState};
