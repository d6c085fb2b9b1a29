//! Metrics collection.
//!
//! # Metrics
//! - `lb_requests_total` (counter): client responses by status
//! - `lb_request_duration_seconds` (histogram): time to respond, by status
//! - `lb_forward_retries_total` (counter): same-backend retries
//! - `lb_attempt_escalations_total` (counter): backends marked dead by failed forwards
//! - `lb_backend_up` (gauge): 1=alive, 0=dead, per backend
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no exporter or port is opened here
//! - Without an installed recorder every call is a no-op

use std::time::Instant;

/// Record a response handed back to a client.
pub fn record_request(status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("lb_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!("lb_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a same-backend retry.
pub fn record_retry(backend: &str) {
    metrics::counter!("lb_forward_retries_total", "backend" => backend.to_string()).increment(1);
}

/// Record a backend marked dead after exhausting its retries.
pub fn record_escalation(backend: &str) {
    metrics::counter!("lb_attempt_escalations_total", "backend" => backend.to_string())
        .increment(1);
}

/// Record backend liveness as seen by the health checker.
pub fn record_backend_health(backend: &str, alive: bool) {
    metrics::gauge!("lb_backend_up", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}
