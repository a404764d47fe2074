//! A single HTTP function that answers every request to its route with a
//! pretty-printed JSON description of that request: method, full URL,
//! headers, query parameters and JSON body.

pub mod config;
pub mod error;
pub mod handlers;
pub mod snapshot;
pub mod telemetry;

use axum::{
    middleware::from_fn,
    routing::{any, get},
    Router,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};
use tracing::{debug, info};

pub use crate::{
    config::AppConfig,
    error::AppError,
    snapshot::RequestSnapshot,
};

/// Builds the router: the echo function, the health check, and the
/// request-id, metrics, compression and CORS layers around them.
pub fn app(config: Arc<AppConfig>) -> Router {
    let echo_path = config.echo_path();
    debug!("Mounting echo function at {}", echo_path);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(&echo_path, any(handlers::echo))
        .with_state(config)
        .layer(from_fn(telemetry::request_metrics_middleware))
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

/// Serves `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, config: Arc<AppConfig>, shutdown: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!(
        "Echo function listening on {} (route {})",
        local_addr,
        config.echo_path()
    );

    axum::serve(listener, app(config))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
