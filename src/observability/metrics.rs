//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_transitions_total` (counter): status transitions, by `to`
//! - `relay_forwards_total` (counter): forward broadcasts, by `outcome`
//! - `relay_rpc_errors_total` (counter): exhausted RPC calls, by `operation`
//! - `relay_records_deleted_total` (counter): retention deletions, by `status`
//! - `relay_tracked_transactions` (gauge): records in the store
//! - `relay_pass_duration_seconds` (histogram): lifecycle pass latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::escrow::types::TransactionStatus;

/// Serve `/metrics` on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_transition(to: TransactionStatus) {
    counter!("relay_transitions_total", "to" => to.as_str()).increment(1);
}

/// `outcome` is one of `sent`, `rejected`, `not_configured`, `unknown`.
pub fn record_forward(outcome: &'static str) {
    counter!("relay_forwards_total", "outcome" => outcome).increment(1);
}

pub fn record_rpc_error(operation: &'static str) {
    counter!("relay_rpc_errors_total", "operation" => operation).increment(1);
}

pub fn record_deleted(status: TransactionStatus) {
    counter!("relay_records_deleted_total", "status" => status.as_str()).increment(1);
}

pub fn set_tracked(count: usize) {
    gauge!("relay_tracked_transactions").set(count as f64);
}

pub fn record_pass_duration(start: Instant) {
    histogram!("relay_pass_duration_seconds").record(start.elapsed().as_secs_f64());
}
