//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vote_cycles_total` (counter): cycles by `outcome` (confirmed, failed)
//! - `vote_cycle_failures_total` (counter): failed cycles by `stage`
//! - `vote_confirmation_seconds` (histogram): broadcast-to-receipt latency
//! - `vote_rpc_reachable` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cycle(confirmed: bool) {
    let outcome = if confirmed { "confirmed" } else { "failed" };
    metrics::counter!("vote_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_cycle_failure(stage: &'static str) {
    metrics::counter!("vote_cycle_failures_total", "stage" => stage).increment(1);
}

pub fn record_confirmation_latency(elapsed: Duration) {
    metrics::histogram!("vote_confirmation_seconds").record(elapsed.as_secs_f64());
}

pub fn record_rpc_reachable(reachable: bool) {
    metrics::gauge!("vote_rpc_reachable").set(if reachable { 1.0 } else { 0.0 });
}
