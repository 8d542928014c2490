//! Typed view state shared between the poll loops, the submission handler,
//! and the gateway API.
//!
//! The raw log collection is the single source of truth: every displayed
//! number is derived from it on demand. Mutation happens only through the
//! operations below, all on the handle -- there are no ambient singletons.

use crate::model::{AnalysisResult, LogEntry};
use crate::view::{self, DerivedView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct DashState {
    /// Raw collection as last received, newest-first. Replaced wholesale.
    logs: Vec<LogEntry>,
    /// Transient "just analyzed" verdict. Lives beside the raw collection,
    /// never inside it -- derived counts cannot double-count it.
    last_analysis: Option<AnalysisResult>,
    /// Sequence number of the fetch currently reflected in `logs`.
    last_applied_seq: u64,
    /// Bumped by the 30s clock timer so relative-time labels re-derive.
    clock_revision: u64,
    last_fetch_at: Option<DateTime<Utc>>,
    last_fetch_error: Option<String>,
}

/// Snapshot of fetch bookkeeping for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FetchStatus {
    pub log_count: usize,
    pub last_applied_seq: u64,
    pub clock_revision: u64,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_fetch_error: Option<String>,
}

/// Cloneable handle to the dashboard state.
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<RwLock<DashState>>,
    seq: Arc<AtomicU64>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(DashState::default())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allocate the sequence number for a fetch about to be issued.
    /// Numbers start at 1; 0 means "nothing applied yet".
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the raw collection with a fetch response.
    ///
    /// Applies only if `seq` is newer than the last applied one: a slow
    /// response that lands after a newer fetch has already been applied is
    /// discarded, so an older response can never overwrite a newer one.
    /// Returns whether the response was applied.
    pub fn apply_logs(&self, seq: u64, logs: Vec<LogEntry>) -> bool {
        let mut state = self.inner.write().expect("state lock poisoned");
        if seq <= state.last_applied_seq {
            tracing::debug!(seq, applied = state.last_applied_seq, "discarding stale fetch response");
            return false;
        }
        state.logs = logs;
        state.last_applied_seq = seq;
        state.last_fetch_at = Some(Utc::now());
        state.last_fetch_error = None;
        true
    }

    /// Record a fetch failure. Existing log state stays untouched, and a
    /// failure from a stale fetch does not clobber newer bookkeeping.
    pub fn record_fetch_error(&self, seq: u64, error: &str) {
        let mut state = self.inner.write().expect("state lock poisoned");
        if seq <= state.last_applied_seq {
            return;
        }
        state.last_fetch_error = Some(error.to_string());
    }

    /// Store the transient verdict from a submission. Overwritten by the
    /// next submission; never cleared automatically.
    pub fn set_analysis(&self, result: AnalysisResult) {
        let mut state = self.inner.write().expect("state lock poisoned");
        state.last_analysis = Some(result);
    }

    pub fn last_analysis(&self) -> Option<AnalysisResult> {
        self.inner.read().expect("state lock poisoned").last_analysis.clone()
    }

    /// No-op refresh from the 30s timer: advances the clock revision so
    /// consumers re-derive relative-time labels. Never touches the network
    /// or the raw collection.
    pub fn tick_clock(&self) -> u64 {
        let mut state = self.inner.write().expect("state lock poisoned");
        state.clock_revision += 1;
        state.clock_revision
    }

    /// Derive the display view from the current raw collection.
    pub fn derived(&self, now: DateTime<Utc>, user_filter: Option<&str>) -> DerivedView {
        let state = self.inner.read().expect("state lock poisoned");
        view::derive_filtered(&state.logs, now, user_filter)
    }

    pub fn fetch_status(&self) -> FetchStatus {
        let state = self.inner.read().expect("state lock poisoned");
        FetchStatus {
            log_count: state.logs.len(),
            last_applied_seq: state.last_applied_seq,
            clock_revision: state.clock_revision,
            last_fetch_at: state.last_fetch_at,
            last_fetch_error: state.last_fetch_error.clone(),
        }
    }
}
