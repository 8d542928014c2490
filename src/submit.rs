//! Single-flight submission of synthetic activity records for scoring.

use crate::backend::{Backend, BackendError};
use crate::model::{AnalysisRequest, AnalysisResult};
use crate::poller;
use crate::state::StateHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Sends analysis requests to the backend, one at a time.
///
/// While a submission is in flight the handler is busy and re-entrant
/// calls are rejected without touching the network. The busy state is
/// bounded: a hung backend trips the timeout, and every exit path
/// releases the flag (busy, then failed or applied, then idle).
pub struct Submitter {
    backend: Arc<dyn Backend>,
    state: StateHandle,
    cancel: CancellationToken,
    busy: AtomicBool,
    timeout: Duration,
}

/// Releases the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Submitter {
    pub fn new(
        backend: Arc<dyn Backend>,
        state: StateHandle,
        cancel: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            state,
            cancel,
            busy: AtomicBool::new(false),
            timeout,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Submit one activity record.
    ///
    /// On success the verdict is stored as the transient last-analysis
    /// state and exactly one refetch runs through the poller's apply path,
    /// so the persisted entry shows up in the raw collection. On failure
    /// nothing is committed.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<AnalysisResult, SubmitError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(SubmitError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let request = request.sanitized();
        let request_id = Uuid::new_v4();
        info!(
            %request_id,
            user = %request.user_id,
            activity = %request.activity_type,
            hour = request.hour_of_day,
            value = request.value_metric,
            "submitting activity for analysis"
        );

        let verdict = match tokio::time::timeout(self.timeout, self.backend.analyze(&request)).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(%request_id, error = %e, "submission failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(%request_id, timeout_secs = self.timeout.as_secs(), "submission timed out");
                return Err(SubmitError::Timeout(self.timeout));
            }
        };

        info!(%request_id, anomaly = verdict.is_anomaly, risk = %verdict.risk, "verdict received");
        self.state.set_analysis(verdict.clone());

        // Reconcile with persisted truth: one refetch, same apply path as
        // the poller, so the new entry lands in the raw collection too.
        poller::fetch_once(self.backend.as_ref(), &self.state, &self.cancel).await;

        Ok(verdict)
    }
}
