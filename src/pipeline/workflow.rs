//! The reconciliation workflow.
//!
//! A closed state machine owning one reviewing session:
//!
//! ```text
//! Idle → Analyzing → Reviewing → Accepted
//!                  ↘ Idle (surfaced error)
//!          Reviewing → ManualSelection → Accepted
//! ```
//!
//! The session owns its [`SymbolSource`] (and through it the inference
//! engine), so dropping the session releases the model resource on every
//! exit path. Manual selection terminates only once at least one symbol is
//! chosen per mandatory category; otherwise confirmation is refused and the
//! state does not change.

use crate::core::errors::{CareLabelError, CareResult};
use crate::domain::catalog::{Category, SymbolCatalog};
use crate::domain::symbol::{enrich_symbols, CareSymbol};
use crate::pipeline::analyzer::SymbolSource;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// States of the reconciliation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// No analysis in progress; an image may be submitted.
    Idle,
    /// An analysis is in flight for this session.
    Analyzing,
    /// Results (possibly empty) are shown for user verdict.
    Reviewing,
    /// The user rejected the results and is picking symbols manually.
    ManualSelection,
    /// The final symbol set is settled.
    Accepted,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Analyzing => "analyzing",
            WorkflowState::Reviewing => "reviewing",
            WorkflowState::ManualSelection => "manual_selection",
            WorkflowState::Accepted => "accepted",
        };
        f.write_str(name)
    }
}

/// One user-facing reviewing session over a symbol source.
#[derive(Debug)]
pub struct ReviewSession<S: SymbolSource> {
    source: S,
    catalog: &'static SymbolCatalog,
    state: WorkflowState,
    symbols: Vec<CareSymbol>,
    selection: BTreeSet<String>,
}

impl<S: SymbolSource> ReviewSession<S> {
    /// Creates an idle session owning the given source.
    pub fn new(source: S) -> Self {
        Self::with_catalog(source, SymbolCatalog::global())
    }

    /// Like [`ReviewSession::new`] with an explicit catalog.
    pub fn with_catalog(source: S, catalog: &'static SymbolCatalog) -> Self {
        Self {
            source,
            catalog,
            state: WorkflowState::Idle,
            symbols: Vec::new(),
            selection: BTreeSet::new(),
        }
    }

    /// Current workflow state.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// The symbol set currently shown or accepted. Empty while idle, and
    /// empty in `Reviewing` when nothing was detected ("no symbols
    /// detected" is an explicit display state, not an error).
    pub fn symbols(&self) -> &[CareSymbol] {
        &self.symbols
    }

    /// Keys currently chosen in manual selection.
    pub fn selected_keys(&self) -> &BTreeSet<String> {
        &self.selection
    }

    /// The final symbol set, once the session reached `Accepted`.
    pub fn accepted_symbols(&self) -> Option<&[CareSymbol]> {
        (self.state == WorkflowState::Accepted).then_some(self.symbols.as_slice())
    }

    /// Runs analysis over a captured image: `Idle → Analyzing → Reviewing`.
    ///
    /// The call blocks until the source returns, so a second trigger cannot
    /// overlap it; any state other than `Idle` (including `Analyzing` left
    /// behind by a source that panicked mid-call) refuses the trigger until
    /// [`ReviewSession::restart`]. On failure the session returns to `Idle`
    /// with the tagged error surfaced, and stays usable for a retry.
    pub fn analyze(&mut self, image: &Path) -> CareResult<&[CareSymbol]> {
        match self.state {
            WorkflowState::Idle => {}
            state => {
                return Err(CareLabelError::invalid_input(format!(
                    "cannot start analysis from the {state} state; restart the session first"
                )));
            }
        }

        self.state = WorkflowState::Analyzing;
        debug!(image = %image.display(), "analysis started");

        match self.source.analyze(image) {
            Ok(symbols) => {
                info!(count = symbols.len(), "analysis complete");
                self.symbols = symbols;
                self.state = WorkflowState::Reviewing;
                Ok(&self.symbols)
            }
            Err(error) => {
                warn!(%error, "analysis failed");
                self.symbols.clear();
                self.state = WorkflowState::Idle;
                Err(error)
            }
        }
    }

    /// The user confirms the shown set: `Reviewing → Accepted`.
    pub fn confirm(&mut self) -> CareResult<&[CareSymbol]> {
        if self.state != WorkflowState::Reviewing {
            return Err(CareLabelError::invalid_input(format!(
                "nothing to confirm in the {} state",
                self.state
            )));
        }
        info!(count = self.symbols.len(), "results accepted");
        self.state = WorkflowState::Accepted;
        Ok(&self.symbols)
    }

    /// The user rejects the shown set: `Reviewing → ManualSelection` with an
    /// empty selection.
    pub fn reject(&mut self) -> CareResult<()> {
        if self.state != WorkflowState::Reviewing {
            return Err(CareLabelError::invalid_input(format!(
                "nothing to reject in the {} state",
                self.state
            )));
        }
        info!("results rejected; entering manual selection");
        self.selection.clear();
        self.state = WorkflowState::ManualSelection;
        Ok(())
    }

    /// Toggles a symbol in the manual selection. Returns whether the key is
    /// selected after the call.
    pub fn toggle_symbol(&mut self, key: &str) -> CareResult<bool> {
        if self.state != WorkflowState::ManualSelection {
            return Err(CareLabelError::invalid_input(format!(
                "symbols can only be toggled during manual selection, not {}",
                self.state
            )));
        }

        if self.catalog.lookup(key).is_none() {
            return Err(CareLabelError::invalid_input(format!(
                "unknown symbol key '{key}'"
            )));
        }

        if self.selection.remove(key) {
            debug!(key, "symbol deselected");
            Ok(false)
        } else {
            self.selection.insert(key.to_string());
            debug!(key, "symbol selected");
            Ok(true)
        }
    }

    /// Confirms the manual selection: `ManualSelection → Accepted`, but only
    /// when every mandatory category has at least one selected symbol.
    ///
    /// Otherwise the transition is refused with the missing categories named
    /// and the selection left untouched.
    pub fn confirm_selection(&mut self) -> CareResult<&[CareSymbol]> {
        if self.state != WorkflowState::ManualSelection {
            return Err(CareLabelError::invalid_input(format!(
                "no manual selection to confirm in the {} state",
                self.state
            )));
        }

        let covered: BTreeSet<Category> = self
            .selection
            .iter()
            .filter_map(|key| self.catalog.category_of(key))
            .collect();
        let missing: Vec<Category> = Category::ALL
            .iter()
            .copied()
            .filter(|category| !covered.contains(category))
            .collect();

        if !missing.is_empty() {
            warn!(?missing, "manual selection incomplete");
            return Err(CareLabelError::IncompleteSelection { missing });
        }

        let manual: Vec<CareSymbol> = self
            .selection
            .iter()
            .map(|key| CareSymbol::manual(key, self.catalog))
            .collect();
        self.symbols = enrich_symbols(&manual, self.catalog);
        self.state = WorkflowState::Accepted;
        info!(count = self.symbols.len(), "manual selection accepted");
        Ok(&self.symbols)
    }

    /// Abandons the current results and returns to `Idle` so a new photo can
    /// be analyzed. Valid from any state.
    pub fn restart(&mut self) {
        debug!(from = %self.state, "session restarted");
        self.symbols.clear();
        self.selection.clear();
        self.state = WorkflowState::Idle;
    }
}
