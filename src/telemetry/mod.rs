pub mod middleware;

pub use self::middleware::request_metrics_middleware;

use crate::config::LogFormat;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber. `RUST_LOG` controls the filter
/// and defaults to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    // Request metadata
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,

    // Timing
    pub total_latency: Duration,

    // Sizes
    pub request_size: Option<u64>,
    pub response_size: Option<u64>,

    pub status_code: u16,
}

impl RequestMetrics {
    pub fn record(&self) {
        info!(
            request_id = self.request_id.as_deref().unwrap_or("-"),
            method = %self.method,
            path = %self.path,
            status = self.status_code,
            latency_ms = self.total_latency.as_secs_f64() * 1000.0,
            request_size = self.request_size,
            response_size = self.response_size,
            "Request completed"
        );
    }
}
