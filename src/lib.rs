//! scanwatch -- headless console and dashboard gateway for an
//! anomaly-detection backend.
//!
//! This crate polls a backend's activity log, derives display-ready
//! aggregates (counts, a live panel, a value-metric series), re-serves
//! them over a small HTTP API, and submits synthetic activity records
//! for scoring. All anomaly scoring and persistence stay in the backend.

pub mod api;
pub mod backend;
pub mod config;
pub mod model;
pub mod poller;
pub mod state;
pub mod submit;
pub mod view;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Start the scanwatch daemon: poll loops plus the dashboard API server.
///
/// Runs until ctrl-c; shutdown cancels both refresh timers before the
/// listener closes, so no in-flight fetch can touch state afterwards.
pub async fn serve(cfg: config::DashConfig) -> Result<()> {
    let backend: Arc<dyn backend::Backend> =
        Arc::new(backend::HttpBackend::new(&cfg.backend.base_url));
    let state = state::StateHandle::new();
    let cancel = CancellationToken::new();

    let submitter = Arc::new(submit::Submitter::new(
        backend.clone(),
        state.clone(),
        cancel.clone(),
        Duration::from_secs(cfg.backend.submit_timeout_secs),
    ));

    let poll_task = tokio::spawn(poller::run_poll_loop(
        backend.clone(),
        state.clone(),
        cfg.poll.clone(),
        cancel.clone(),
    ));
    let clock_task = tokio::spawn(poller::run_clock_loop(
        state.clone(),
        cfg.poll.clone(),
        cancel.clone(),
    ));

    let app = api::router(api::AppState {
        state,
        submitter,
        backend,
    });

    let addr: std::net::SocketAddr = cfg.server.bind.parse()?;
    tracing::info!(%addr, backend = %cfg.backend.base_url, "scanwatch gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    // Deterministic teardown: both timers stop before we return.
    cancel.cancel();
    let _ = poll_task.await;
    let _ = clock_task.await;

    Ok(())
}
