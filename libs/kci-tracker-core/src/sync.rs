//! Live sync consumption and case mutations
//!
//! One controller owns the application state that the source system kept in
//! page-level globals: the raw row list, the active filter specification,
//! and the last derived outcome. The store's subscription pushes full
//! collection snapshots; the controller consumes them strictly in order,
//! re-derives the filtered view synchronously, and hands the result to a
//! [`ViewSink`]. There is no debouncing and no queued work: derivation is a
//! pure function over an in-memory array.
//!
//! Writes (status change, flag toggle, note edit) go straight through the
//! store and surface failures to the caller without retrying; the next
//! snapshot push is the re-synchronization mechanism.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::dates::local_today;
use crate::error::{Result, TrackerError};
use crate::filter::{self, FilterOutcome};
use crate::models::{Case, CaseFilters, CollectionSnapshot, UpdateCaseRequest};
use crate::store::CaseStore;

/// Application state owned by the controller
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    /// Current full case collection, as last pushed by the store
    pub rows: Vec<Case>,
    /// Active filter specification
    pub filters: CaseFilters,
    /// Outcome of the most recent derivation
    pub outcome: Option<FilterOutcome>,
}

/// Receiver of derived view updates
pub trait ViewSink: Send + Sync {
    fn render(&self, outcome: &FilterOutcome);
}

/// Controller driving the case list from the store subscription
pub struct TrackerController<S: CaseStore> {
    store: Arc<S>,
    config: TrackerConfig,
    state: RwLock<TrackerState>,
}

impl<S: CaseStore> TrackerController<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: TrackerConfig) -> Self {
        Self {
            store,
            config,
            state: RwLock::new(TrackerState::default()),
        }
    }

    /// Borrow the underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Team-local "today" per the configured timezone and reset hour
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        local_today(self.config.timezone, self.config.reset_hour)
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state.read().clone()
    }

    /// Pull the full collection once and re-derive
    ///
    /// # Errors
    ///
    /// Surfaces the store error unchanged; the caller retries manually.
    pub async fn refresh(&self) -> Result<FilterOutcome> {
        let cases = self.store.fetch_all().await?;
        Ok(self.apply_snapshot(CollectionSnapshot::new(cases)))
    }

    /// Replace the row set with a pushed snapshot and re-derive
    pub fn apply_snapshot(&self, snapshot: CollectionSnapshot) -> FilterOutcome {
        let today = self.today();
        let mut state = self.state.write();
        state.rows = snapshot.cases;
        let outcome = filter::apply(&state.rows, &state.filters, today);
        state.outcome = Some(outcome.clone());
        debug!(
            rows = state.rows.len(),
            visible = outcome.visible.len(),
            "snapshot applied"
        );
        outcome
    }

    /// Replace the filter specification and re-derive over the current rows
    pub fn set_filters(&self, filters: CaseFilters) -> FilterOutcome {
        let today = self.today();
        let mut state = self.state.write();
        state.filters = filters;
        let outcome = filter::apply(&state.rows, &state.filters, today);
        state.outcome = Some(outcome.clone());
        outcome
    }

    /// Reset filters, keeping locked categorical facets
    pub fn reset_filters(&self) -> FilterOutcome {
        let today = self.today();
        let mut state = self.state.write();
        state.filters.reset();
        let outcome = filter::apply(&state.rows, &state.filters, today);
        state.outcome = Some(outcome.clone());
        outcome
    }

    /// Consume the store subscription until it closes, rendering each
    /// derived outcome
    ///
    /// Snapshots are handled strictly in order, one derivation in flight.
    /// A lagged receiver only skips intermediate snapshots; the next one is
    /// again the full collection, so nothing is lost.
    pub async fn run<V: ViewSink>(&self, sink: &V) {
        let mut rx = self.store.subscribe();
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    let outcome = self.apply_snapshot(snapshot);
                    sink.render(&outcome);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "snapshot receiver lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Apply an update request to one case and write it through
    ///
    /// # Errors
    ///
    /// `CaseNotFound` when the id is unknown; store errors pass through
    /// unchanged with no retry.
    pub async fn update_case(&self, id: &str, request: UpdateCaseRequest) -> Result<Case> {
        let mut case = self
            .store
            .get_case(id)
            .await?
            .ok_or_else(|| TrackerError::CaseNotFound { id: id.to_string() })?;

        if request.clear_status {
            case.status.clear();
        } else if let Some(status) = request.status {
            case.status = status.as_str().to_string();
        }
        if let Some(flagged) = request.flagged {
            case.flagged = flagged;
        }
        if let Some(notes) = request.notes {
            case.notes = notes;
        }
        if let Some(updated_by) = request.updated_by {
            case.updated_by = updated_by;
        }
        case.last_action_date = crate::dates::format_display(self.today());

        self.store.upsert_case(case.clone()).await?;
        Ok(case)
    }

    /// Set a case's status to an enumerated value
    ///
    /// # Errors
    ///
    /// See [`TrackerController::update_case`].
    pub async fn set_status(&self, id: &str, status: crate::models::CaseStatus) -> Result<Case> {
        self.update_case(
            id,
            UpdateCaseRequest {
                status: Some(status),
                ..UpdateCaseRequest::default()
            },
        )
        .await
    }

    /// Flip a case's flag
    ///
    /// # Errors
    ///
    /// See [`TrackerController::update_case`].
    pub async fn toggle_flag(&self, id: &str) -> Result<Case> {
        let case = self
            .store
            .get_case(id)
            .await?
            .ok_or_else(|| TrackerError::CaseNotFound { id: id.to_string() })?;
        self.update_case(
            id,
            UpdateCaseRequest {
                flagged: Some(!case.flagged),
                ..UpdateCaseRequest::default()
            },
        )
        .await
    }

    /// Replace a case's notes
    ///
    /// # Errors
    ///
    /// See [`TrackerController::update_case`].
    pub async fn edit_notes(&self, id: &str, notes: impl Into<String>) -> Result<Case> {
        self.update_case(
            id,
            UpdateCaseRequest {
                notes: Some(notes.into()),
                ..UpdateCaseRequest::default()
            },
        )
        .await
    }
}
