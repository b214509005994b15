//! Prometheus metrics for the broker.
//!
//! One [`BrokerMetrics`] value owns its own [`Registry`]; it is injected
//! into the dispatcher and the sidecar, so tests build isolated instances
//! instead of touching process-wide state.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `linodemcp_rpc_requests_total` | Counter | `method`, `outcome` |
//! | `linodemcp_tool_calls_total` | Counter | `tool`, `outcome` |
//! | `linodemcp_tool_call_duration_seconds` | Histogram | `tool` |
//! | `linodemcp_in_flight_requests` | Gauge | |
//! | `linodemcp_http_requests_total` | Counter | `path`, `status` |
//! | `linodemcp_uptime_seconds` | Gauge | |
//!
//! On Linux the process collector (`process_*`) is registered as well.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;

/// Maximum length for label values.
pub const MAX_LABEL_VALUE_LEN: usize = 64;

/// Histogram buckets for tool call duration (in seconds).
pub const TOOL_DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

pub struct BrokerMetrics {
    registry: Registry,
    rpc_requests_total: IntCounterVec,
    tool_calls_total: IntCounterVec,
    tool_call_duration: HistogramVec,
    in_flight: IntGauge,
    http_requests_total: IntCounterVec,
    uptime: Gauge,
    rpc_total: AtomicU64,
    started: Instant,
}

impl BrokerMetrics {
    /// Creates the metric families on a fresh registry.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let rpc_requests_total = IntCounterVec::new(
            Opts::new("linodemcp_rpc_requests_total", "JSON-RPC requests by method and outcome"),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(rpc_requests_total.clone()))?;

        let tool_calls_total = IntCounterVec::new(
            Opts::new("linodemcp_tool_calls_total", "Tool invocations by tool and outcome"),
            &["tool", "outcome"],
        )?;
        registry.register(Box::new(tool_calls_total.clone()))?;

        let tool_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "linodemcp_tool_call_duration_seconds",
                "Tool handler execution time",
            )
            .buckets(TOOL_DURATION_BUCKETS.to_vec()),
            &["tool"],
        )?;
        registry.register(Box::new(tool_call_duration.clone()))?;

        let in_flight = IntGauge::new(
            "linodemcp_in_flight_requests",
            "Requests currently being handled",
        )?;
        registry.register(Box::new(in_flight.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("linodemcp_http_requests_total", "Sidecar HTTP requests by path and status"),
            &["path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let uptime = Gauge::new("linodemcp_uptime_seconds", "Seconds since the broker started")?;
        registry.register(Box::new(uptime.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            rpc_requests_total,
            tool_calls_total,
            tool_call_duration,
            in_flight,
            http_requests_total,
            uptime,
            rpc_total: AtomicU64::new(0),
            started: Instant::now(),
        })
    }

    pub fn rpc_request(&self, method: &str, outcome: &str) {
        self.rpc_total.fetch_add(1, Ordering::Relaxed);
        self.rpc_requests_total
            .with_label_values(&[truncate_label(method), truncate_label(outcome)])
            .inc();
    }

    pub fn rpc_request_count(&self, method: &str, outcome: &str) -> u64 {
        self.rpc_requests_total
            .with_label_values(&[truncate_label(method), truncate_label(outcome)])
            .get()
    }

    pub fn tool_call(&self, tool: &str, outcome: &str, duration_secs: f64) {
        let tool = truncate_label(tool);
        self.tool_calls_total
            .with_label_values(&[tool, truncate_label(outcome)])
            .inc();
        self.tool_call_duration
            .with_label_values(&[tool])
            .observe(duration_secs);
    }

    pub fn tool_call_count(&self, tool: &str, outcome: &str) -> u64 {
        self.tool_calls_total
            .with_label_values(&[truncate_label(tool), truncate_label(outcome)])
            .get()
    }

    /// Marks one request in flight until the guard drops.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.in_flight.inc();
        InFlightGuard {
            gauge: self.in_flight.clone(),
        }
    }

    pub fn in_flight(&self) -> i64 {
        self.in_flight.get()
    }

    pub fn http_request(&self, path: &str, status: u16) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[truncate_label(path), status.as_str()])
            .inc();
    }

    pub fn http_request_count(&self, path: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[truncate_label(path), status.as_str()])
            .get()
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Small numeric summary for health responses.
    pub fn summary(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("uptime_seconds".to_string(), self.uptime_seconds()),
            ("in_flight_requests".to_string(), self.in_flight() as f64),
            ("rpc_requests_total".to_string(), self.rpc_total.load(Ordering::Relaxed) as f64),
        ])
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        self.uptime.set(self.uptime_seconds());

        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }
}

/// Decrements the in-flight gauge on drop.
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Truncates a label value at a character boundary.
fn truncate_label(value: &str) -> &str {
    if value.len() <= MAX_LABEL_VALUE_LEN {
        value
    } else {
        let end = value
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= MAX_LABEL_VALUE_LEN)
            .last()
            .unwrap_or(0);
        &value[..end]
    }
}
