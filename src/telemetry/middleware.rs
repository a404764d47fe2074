use super::RequestMetrics;
use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{header, HeaderMap, Response},
    middleware::Next,
};
use std::time::Instant;
use tracing::debug;

const REQUEST_ID: &str = "x-request-id";

/// Records timing, size and status for every request passing through the
/// router. Bodies are left untouched; sizes come from `Content-Length` or
/// the body's exact size hint.
pub async fn request_metrics_middleware(req: Request, next: Next) -> Response<Body> {
    let start = Instant::now();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let request_id = header_value(req.headers(), REQUEST_ID);
    let request_size = body_size(req.headers(), req.body().size_hint().exact());

    debug!("Received request: method={}, path={}", method, path);

    let response = next.run(req).await;

    let metrics = RequestMetrics {
        request_id,
        method,
        path,
        total_latency: start.elapsed(),
        request_size,
        response_size: body_size(response.headers(), response.body().size_hint().exact()),
        status_code: response.status().as_u16(),
    };
    metrics.record();

    response
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

fn body_size(headers: &HeaderMap, exact: Option<u64>) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or(exact)
}
