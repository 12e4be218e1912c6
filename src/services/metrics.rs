//! Prometheus HTTP metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `http_requests_total` | Counter | `method`, `path`, `status` |
//! | `http_request_duration_seconds` | Histogram | `method`, `path`, `status` |
//! | `http_request_size_bytes` | Histogram | `method`, `path` |
//! | `http_response_size_bytes` | Histogram | `method`, `path`, `status` |
//!
//! `path` is always a route template (or [`UNMATCHED_ROUTE`]), never a raw
//! request path. The series live in an owned [`Registry`] so a process creates
//! them once at startup and tests can build isolated instances.

use std::time::Duration;

use prometheus::{
    DEFAULT_BUCKETS, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder, exponential_buckets,
};
use thiserror::Error;

/// Label used for requests that matched no route template.
pub const UNMATCHED_ROUTE: &str = "__unmatched__";

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const REQUEST_SIZE_BYTES: &str = "http_request_size_bytes";
pub const RESPONSE_SIZE_BYTES: &str = "http_response_size_bytes";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics registry error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("metrics are not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    request_size: HistogramVec,
    response_size: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(REQUEST_DURATION_SECONDS, "HTTP request latencies in seconds")
                .buckets(DEFAULT_BUCKETS.to_vec()),
            &["method", "path", "status"],
        )?;

        let request_size = HistogramVec::new(
            HistogramOpts::new(REQUEST_SIZE_BYTES, "HTTP request sizes in bytes")
                .buckets(size_buckets()?),
            &["method", "path"],
        )?;

        let response_size = HistogramVec::new(
            HistogramOpts::new(RESPONSE_SIZE_BYTES, "HTTP response sizes in bytes")
                .buckets(size_buckets()?),
            &["method", "path", "status"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(request_size.clone()))?;
        registry.register(Box::new(response_size.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            request_size,
            response_size,
        })
    }

    pub fn observe_request_size(&self, method: &str, path: &str, bytes: u64) {
        self.request_size
            .with_label_values(&[method, path])
            .observe(bytes as f64);
    }

    /// Records a finished request: one counter increment plus one observation
    /// on each of the duration and response-size histograms.
    pub fn record_response(
        &self,
        method: &str,
        path: &str,
        status: &str,
        duration: Duration,
        response_bytes: u64,
    ) {
        let labels = [method, path, status];
        self.requests_total.with_label_values(&labels).inc();
        self.request_duration
            .with_label_values(&labels)
            .observe(duration.as_secs_f64());
        self.response_size
            .with_label_values(&labels)
            .observe(response_bytes as f64);
    }

    /// Renders every series in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Drops every labelled series. Only meant for tests that share an instance.
    pub fn reset(&self) {
        self.requests_total.reset();
        self.request_duration.reset();
        self.request_size.reset();
        self.response_size.reset();
    }

    /// Current value of `http_requests_total` for the given labels, without
    /// creating the series when it does not exist.
    pub fn request_count(&self, method: &str, path: &str, status: &str) -> u64 {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == REQUESTS_TOTAL)
            .flat_map(|family| family.get_metric())
            .filter(|metric| {
                labels_match(
                    metric.get_label(),
                    &[("method", method), ("path", path), ("status", status)],
                )
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .sum()
    }

    /// Total number of samples recorded across every series of a metric family.
    pub fn sample_count(&self, family_name: &str) -> u64 {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == family_name)
            .flat_map(|family| family.get_metric())
            .map(|metric| {
                if metric.has_histogram() {
                    metric.get_histogram().get_sample_count()
                } else {
                    metric.get_counter().get_value() as u64
                }
            })
            .sum()
    }

    /// Label values of `path` seen on `http_requests_total`.
    pub fn observed_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == REQUESTS_TOTAL)
            .flat_map(|family| family.get_metric())
            .flat_map(|metric| metric.get_label())
            .filter(|label| label.get_name() == "path")
            .map(|label| label.get_value().to_string())
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

fn size_buckets() -> Result<Vec<f64>, prometheus::Error> {
    exponential_buckets(100.0, 10.0, 7)
}

fn labels_match(labels: &[prometheus::proto::LabelPair], expected: &[(&str, &str)]) -> bool {
    expected.iter().all(|(name, value)| {
        labels
            .iter()
            .any(|label| label.get_name() == *name && label.get_value() == *value)
    })
}
