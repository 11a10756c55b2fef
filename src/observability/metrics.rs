//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): evaluations by outcome and limiter class
//! - `gate_security_events_total` (counter): emitted events by kind and severity
//! - `gate_tracked_windows` (gauge): live rate windows
//! - `gate_denylist_entries` (gauge): denylisted identities
//! - `gate_swept_entries_total` (counter): entries evicted by the sweeper
//! - `gate_config_reloads_total` (counter): hot reload attempts by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so the library never requires one
//! - The Prometheus exporter is installed only by the service binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::security::state::SweepReport;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_decision(outcome: &'static str, class: &str) {
    metrics::counter!(
        "gate_decisions_total",
        "outcome" => outcome,
        "class" => class.to_string()
    )
    .increment(1);
}

pub fn record_event(kind: &'static str, severity: &'static str) {
    metrics::counter!(
        "gate_security_events_total",
        "kind" => kind,
        "severity" => severity
    )
    .increment(1);
}

pub fn record_state_size(windows: usize, denylist: usize) {
    metrics::gauge!("gate_tracked_windows").set(windows as f64);
    metrics::gauge!("gate_denylist_entries").set(denylist as f64);
}

pub fn record_sweep(report: SweepReport) {
    metrics::counter!("gate_swept_entries_total", "kind" => "window").increment(report.windows as u64);
    metrics::counter!("gate_swept_entries_total", "kind" => "denylist").increment(report.denylist as u64);
}

pub fn record_config_reload(result: &'static str) {
    metrics::counter!("gate_config_reloads_total", "result" => result).increment(1);
}
