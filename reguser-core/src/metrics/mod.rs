//! Metrics for store and API observability
//!
//! Everything goes through the `metrics` facade. Without an installed
//! recorder the calls are no-ops, so the library never requires one.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!("store.operations.total", "Total store operations, labelled by op");
    describe_counter!(
        "store.streams.finished",
        "Result streams finished, labelled by op and reason"
    );
    describe_counter!("api.requests.total", "HTTP requests, labelled by route and status");
    describe_histogram!("api.request.duration_ms", "HTTP request duration in milliseconds");
}

/// Count one store operation
pub fn record_store_op(op: &'static str) {
    counter!("store.operations.total", "op" => op).increment(1);
}

/// Count a finished stream and why it finished (complete, timeout, cancelled, dropped)
pub fn record_stream_end(op: &'static str, reason: &'static str) {
    counter!("store.streams.finished", "op" => op, "reason" => reason).increment(1);
}

/// Count one HTTP response
pub fn record_request(route: String, status: u16) {
    counter!("api.requests.total", "route" => route, "status" => status.to_string()).increment(1);
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let duration = self.start.elapsed();
        histogram!(self.name).record(duration.as_secs_f64() * 1000.0);
    }
}
