//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.
//! Recording is a no-op until a recorder (the gateway's Prometheus
//! exporter) is installed, so library code can call these freely.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CiteMap metrics
pub const METRICS_PREFIX: &str = "citemap";

/// Histogram buckets for request and pipeline latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Network metrics
    describe_counter!(
        format!("{}_network_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Total citation networks built"
    );

    describe_histogram!(
        format!("{}_network_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Network build latency in seconds"
    );

    describe_gauge!(
        format!("{}_network_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes in the most recently built network"
    );

    describe_gauge!(
        format!("{}_network_edges", METRICS_PREFIX),
        Unit::Count,
        "Edges in the most recently built network"
    );

    // Layout metrics
    describe_histogram!(
        format!("{}_layout_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Layout computation latency in seconds"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_retrieval_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total upstream retrieval requests"
    );

    describe_counter!(
        format!("{}_retrieval_retries_total", METRICS_PREFIX),
        Unit::Count,
        "Total upstream retrieval retries"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a finished network build
pub fn record_network_build(duration_secs: f64, nodes: usize, edges: usize) {
    counter!(format!("{}_network_builds_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_network_build_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_network_nodes", METRICS_PREFIX)).set(nodes as f64);
    gauge!(format!("{}_network_edges", METRICS_PREFIX)).set(edges as f64);
}

/// Helper to record layout metrics
pub fn record_layout(duration_secs: f64, strategy: &str) {
    histogram!(
        format!("{}_layout_duration_seconds", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .record(duration_secs);
}

/// Helper to record one upstream retrieval attempt
pub fn record_retrieval(success: bool, retried: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_retrieval_requests_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    if retried {
        counter!(format!("{}_retrieval_retries_total", METRICS_PREFIX)).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recording_without_recorder() {
        let metrics = RequestMetrics::start("POST", "/v1/networks");
        metrics.finish(200);
        record_network_build(0.01, 10, 12);
        record_layout(0.02, "force");
        record_retrieval(false, true);
    }
}
