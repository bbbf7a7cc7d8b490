//! Prometheus metrics exposition
//!
//! - `token_requests_total` (counter): labels `route`, `status`
//! - `token_request_duration_seconds` (histogram): label `route`
//! - `token_failures_total` (counter): label `kind`
//! - `tokens_issued_total` (counter): label `reason`, recorded by the session crate

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_METRIC: &str = "token_request_duration_seconds";

/// Bucket boundaries from 1ms to 5s. Renewals are dominated by the Argon2
/// hash, which lands in the tens of milliseconds at default cost.
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DURATION_METRIC.to_string()), DURATION_BUCKETS)
        .expect("failed to set histogram buckets")
}

/// Install the Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Handle backed by a recorder that is not installed globally.
#[cfg(test)]
pub fn local_handle() -> PrometheusHandle {
    builder().build_recorder().handle()
}

/// Record a completed request.
pub fn record_request(route: &str, status: u16, duration_secs: f64) {
    metrics::counter!("token_requests_total", "route" => route.to_string(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!(DURATION_METRIC, "route" => route.to_string()).record(duration_secs);
}

/// Record a rejected or failed token operation by error kind.
pub fn record_failure(kind: &'static str) {
    metrics::counter!("token_failures_total", "kind" => kind).increment(1);
}
