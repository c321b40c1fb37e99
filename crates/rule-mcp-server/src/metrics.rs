//! Dispatcher metrics
//!
//! The dispatcher reports every catalogued call through [`MetricsSink`], so
//! tests can run without a live metrics backend. [`PrometheusMetrics`]
//! exposes:
//!
//! - `rule_mcp_requests_total` (counter) - calls by method and status
//! - `rule_mcp_request_duration_seconds` (histogram) - call latency by method

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::fmt;
use std::time::Duration;

/// Outcome of a dispatched call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStatus {
    Ok,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Ok => "ok",
            CallStatus::Error => "error",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives one `(method, status, duration)` triple per dispatched call
pub trait MetricsSink: Send + Sync {
    fn record(&self, method: &str, status: CallStatus, duration: Duration);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _method: &str, _status: CallStatus, _duration: Duration) {}
}

/// Prometheus-backed sink with its own registry
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    requests_total: CounterVec,
    duration_seconds: HistogramVec,
}

impl fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Total number of MCP calls").namespace("rule_mcp"),
            &["method", "status"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new("request_duration_seconds", "MCP call duration in seconds")
                .namespace("rule_mcp")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            duration_seconds,
        })
    }

    /// Encode the registry in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record(&self, method: &str, status: CallStatus, duration: Duration) {
        self.requests_total
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.duration_seconds
            .with_label_values(&[method])
            .observe(duration.as_secs_f64());
    }
}
