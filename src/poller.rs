//! Background refresh loops: the 5s log fetch and the 30s clock tick.

use crate::backend::Backend;
use crate::config::PollConfig;
use crate::state::StateHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One fetch: allocate a sequence number at issue time, call the backend,
/// and apply the response unless it is stale or the view has been torn
/// down. Returns whether the response was applied.
///
/// Fetch failures recover silently -- logged, prior state retained, the
/// next scheduled attempt proceeds normally.
pub async fn fetch_once(
    backend: &dyn Backend,
    state: &StateHandle,
    cancel: &CancellationToken,
) -> bool {
    let seq = state.next_seq();

    match backend.fetch_logs().await {
        Ok(logs) => {
            if cancel.is_cancelled() {
                debug!(seq, "view torn down, dropping fetch response");
                return false;
            }
            let applied = state.apply_logs(seq, logs);
            if applied {
                debug!(seq, "fetch response applied");
            }
            applied
        }
        Err(e) => {
            warn!(seq, error = %e, "log fetch failed");
            if !cancel.is_cancelled() {
                state.record_fetch_error(seq, &e.to_string());
            }
            false
        }
    }
}

/// Fetch immediately, then every `fetch_interval_secs`, until cancelled.
///
/// Fetches are not queued or deduplicated: a slow response must not block
/// the next tick, so each fetch runs as its own task and the sequence
/// guard in the state decides which response wins.
pub async fn run_poll_loop(
    backend: Arc<dyn Backend>,
    state: StateHandle,
    cfg: PollConfig,
    cancel: CancellationToken,
) {
    info!(interval_secs = cfg.fetch_interval_secs, "log poller started");
    let mut interval = tokio::time::interval(Duration::from_secs(cfg.fetch_interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("log poller stopped");
                return;
            }
            _ = interval.tick() => {
                let backend = backend.clone();
                let state = state.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    fetch_once(backend.as_ref(), &state, &cancel).await;
                });
            }
        }
    }
}

/// Advance the clock revision every `clock_refresh_secs` so relative-time
/// labels re-derive for entries that have not changed. Never fetches.
pub async fn run_clock_loop(state: StateHandle, cfg: PollConfig, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(cfg.clock_refresh_secs));
    // interval fires once immediately; the labels are fresh at startup.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("clock refresh stopped");
                return;
            }
            _ = interval.tick() => {
                let revision = state.tick_clock();
                debug!(revision, "clock refresh");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::model::{AnalysisRequest, AnalysisResult, BackendStatus, LogEntry, RiskLabel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn entry(id: i64) -> LogEntry {
        LogEntry {
            id,
            user_id: "user_123".to_string(),
            activity_type: "login".to_string(),
            timestamp: "2026-08-06T11:00:00".to_string(),
            hour_of_day: 11.0,
            value_metric: 100.0,
            is_anomaly: false,
            risk: RiskLabel::Safe,
        }
    }

    /// Backend that serves a fixed log list, optionally holding every
    /// response until released.
    struct ScriptedBackend {
        logs: Vec<LogEntry>,
        fail: bool,
        fetch_calls: AtomicUsize,
        gate: Option<Notify>,
    }

    impl ScriptedBackend {
        fn ok(logs: Vec<LogEntry>) -> Self {
            Self {
                logs,
                fail: false,
                fetch_calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn failing() -> Self {
            Self {
                logs: Vec::new(),
                fail: true,
                fetch_calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(logs: Vec<LogEntry>) -> Self {
            Self {
                logs,
                fail: false,
                fetch_calls: AtomicUsize::new(0),
                gate: Some(Notify::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl crate::backend::Backend for ScriptedBackend {
        async fn fetch_logs(&self) -> Result<Vec<LogEntry>, BackendError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(BackendError::Transport("connection refused".to_string()));
            }
            Ok(self.logs.clone())
        }

        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
            unimplemented!("not used by poller tests")
        }

        async fn health(&self) -> Result<BackendStatus, BackendError> {
            Ok(BackendStatus {
                status: "ok".to_string(),
                ai: "Active".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_once_applies_response() {
        let backend = ScriptedBackend::ok(vec![entry(1), entry(2)]);
        let state = StateHandle::new();
        let cancel = CancellationToken::new();

        assert!(fetch_once(&backend, &state, &cancel).await);
        assert_eq!(state.fetch_status().log_count, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_prior_state() {
        let state = StateHandle::new();
        let cancel = CancellationToken::new();

        let good = ScriptedBackend::ok(vec![entry(1)]);
        assert!(fetch_once(&good, &state, &cancel).await);

        let bad = ScriptedBackend::failing();
        assert!(!fetch_once(&bad, &state, &cancel).await);

        let status = state.fetch_status();
        assert_eq!(status.log_count, 1);
        assert!(status.last_fetch_error.is_some());
    }

    #[tokio::test]
    async fn test_response_after_teardown_is_discarded() {
        let backend = Arc::new(ScriptedBackend::gated(vec![entry(1)]));
        let state = StateHandle::new();
        let cancel = CancellationToken::new();

        let task = {
            let backend = backend.clone();
            let state = state.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { fetch_once(backend.as_ref(), &state, &cancel).await })
        };

        // Let the fetch reach the gate, tear the view down, then release
        // the in-flight response.
        tokio::task::yield_now().await;
        cancel.cancel();
        backend.gate.as_ref().unwrap().notify_one();

        assert!(!task.await.unwrap());
        assert_eq!(state.fetch_status().log_count, 0);
        assert_eq!(state.fetch_status().last_applied_seq, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_loop_fetches_immediately_then_on_interval() {
        let backend = Arc::new(ScriptedBackend::ok(vec![entry(1)]));
        let state = StateHandle::new();
        let cancel = CancellationToken::new();
        let cfg = PollConfig {
            fetch_interval_secs: 5,
            clock_refresh_secs: 30,
        };

        let dyn_backend: Arc<dyn Backend> = backend.clone();
        let task = tokio::spawn(run_poll_loop(
            dyn_backend,
            state.clone(),
            cfg,
            cancel.clone(),
        ));

        // t=0, t=5, t=10 with the paused clock.
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 3);
        assert!(state.fetch_status().log_count > 0);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_loop_never_fetches() {
        let state = StateHandle::new();
        let cancel = CancellationToken::new();
        let cfg = PollConfig {
            fetch_interval_secs: 5,
            clock_refresh_secs: 30,
        };

        let task = tokio::spawn(run_clock_loop(state.clone(), cfg, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(state.fetch_status().clock_revision, 2);
        // The raw collection is untouched by clock refreshes.
        assert_eq!(state.fetch_status().log_count, 0);
        assert_eq!(state.fetch_status().last_applied_seq, 0);

        cancel.cancel();
        task.await.unwrap();
    }
}
