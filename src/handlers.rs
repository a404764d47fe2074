use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{config::AppConfig, error::AppError, snapshot::RequestSnapshot};

pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Mirrors the request's method, URL, headers, query parameters and JSON
/// body back to the caller. Always answers 200 unless rendering fails.
pub async fn echo(
    State(config): State<Arc<AppConfig>>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    info!(
        method = %parts.method,
        path = %parts.uri.path(),
        "Echo function received a request"
    );

    let body = match to_bytes(body, config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                error = %e,
                limit = config.max_body_bytes,
                "Failed to read request body, echoing an empty object"
            );
            Bytes::new()
        }
    };

    let fallback_authority = format!("{}:{}", config.host, config.port);
    let snapshot = RequestSnapshot::capture(&parts, &body, &fallback_authority);
    let rendered = snapshot.to_pretty_json()?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        rendered,
    )
        .into_response())
}
