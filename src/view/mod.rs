//! Derived dashboard views -- pure projections of the raw log collection.
//!
//! Everything in here is a deterministic function of the log slice and the
//! `now` instant passed in: no I/O, no clocks, no hidden accumulation.
//! Re-deriving from the same input must always yield the same output.

pub mod timefmt;

use crate::model::{LogEntry, RiskLabel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Entries shown in the live activity panel (backend returns newest-first).
pub const DISPLAY_LIMIT: usize = 20;

/// Points kept in the value-metric time series window.
pub const SERIES_LIMIT: usize = 50;

/// Aggregate counters over the whole raw collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub anomalies: usize,
    pub safe: usize,
    /// Integer-rounded share of anomalies, 0 when there are no scans.
    pub anomaly_pct: u8,
}

/// One row of the live activity panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEntry {
    pub id: i64,
    pub user: String,
    pub status: RiskLabel,
    pub relative_time: String,
    pub raw_timestamp: String,
}

/// One point of the value-metric series. `scan` is the 1-based position
/// within the visible window, not a global index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub scan: usize,
    pub value: f64,
    pub is_anomaly: bool,
}

/// Activity per hour of day, from the `hour_of_day` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    pub hour: u8,
    pub total: u32,
    pub anomalies: u32,
}

/// The full display-ready projection consumed by the gateway and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    pub summary: Summary,
    pub recent: Vec<DisplayEntry>,
    pub series: Vec<SeriesPoint>,
    pub hourly: Vec<HourBucket>,
}

/// Derive the dashboard view from the raw collection.
pub fn derive(logs: &[LogEntry], now: DateTime<Utc>) -> DerivedView {
    derive_filtered(logs, now, None)
}

/// Derive the dashboard view, optionally restricting the live activity
/// panel to users whose id contains `user_filter` (case-insensitive).
/// Counters, series, and histogram always cover the whole collection --
/// the filter is a display concern only.
pub fn derive_filtered(
    logs: &[LogEntry],
    now: DateTime<Utc>,
    user_filter: Option<&str>,
) -> DerivedView {
    DerivedView {
        summary: summarize(logs),
        recent: display_list(logs, now, user_filter),
        series: time_series(logs),
        hourly: hourly_histogram(logs),
    }
}

/// total / anomalies / safe / rounded percentage.
pub fn summarize(logs: &[LogEntry]) -> Summary {
    let total = logs.len();
    let anomalies = logs.iter().filter(|l| l.is_anomaly).count();
    let safe = total - anomalies;
    let anomaly_pct = if total == 0 {
        0
    } else {
        ((anomalies as f64 / total as f64) * 100.0).round() as u8
    };

    Summary {
        total,
        anomalies,
        safe,
        anomaly_pct,
    }
}

fn display_list(logs: &[LogEntry], now: DateTime<Utc>, user_filter: Option<&str>) -> Vec<DisplayEntry> {
    let needle = user_filter.map(str::to_lowercase).unwrap_or_default();

    logs.iter()
        .filter(|l| needle.is_empty() || l.user_id.to_lowercase().contains(&needle))
        .take(DISPLAY_LIMIT)
        .map(|l| DisplayEntry {
            id: l.id,
            user: l.user_id.clone(),
            status: l.risk,
            relative_time: timefmt::relative_from(&l.timestamp, now),
            raw_timestamp: l.timestamp.clone(),
        })
        .collect()
}

fn time_series(logs: &[LogEntry]) -> Vec<SeriesPoint> {
    // Sort ascending by parsed timestamp. Unparseable timestamps sort
    // before everything else, which keeps the projection deterministic.
    let mut ordered: Vec<&LogEntry> = logs.iter().collect();
    ordered.sort_by_key(|l| timefmt::parse_utc(&l.timestamp));

    let skip = ordered.len().saturating_sub(SERIES_LIMIT);
    ordered
        .into_iter()
        .skip(skip)
        .enumerate()
        .map(|(i, l)| SeriesPoint {
            scan: i + 1,
            value: l.value_metric,
            is_anomaly: l.is_anomaly,
        })
        .collect()
}

fn hourly_histogram(logs: &[LogEntry]) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = (0..24)
        .map(|hour| HourBucket {
            hour,
            total: 0,
            anomalies: 0,
        })
        .collect();

    for l in logs {
        let h = l.hour_of_day;
        if !(0.0..24.0).contains(&h) {
            // hour_of_day outside the clock face; skip rather than guess.
            continue;
        }
        let bucket = &mut buckets[h as usize];
        bucket.total += 1;
        if l.is_anomaly {
            bucket.anomalies += 1;
        }
    }

    buckets
}
