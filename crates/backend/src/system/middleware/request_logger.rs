use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::system::tenant::extractor::TENANT_HEADER;

/// Log one line per HTTP request: tenant, method, path, status, duration and
/// response size
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let tenant = req
        .headers()
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Buffer the body to report its real size
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(
                tenant = %tenant,
                "{} {} -> {} in {}ms, body unreadable: {}",
                method,
                uri.path(),
                parts.status.as_u16(),
                start.elapsed().as_millis(),
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    if parts.status.is_success() {
        tracing::info!(
            tenant = %tenant,
            "{} {} -> {} in {}ms ({} bytes)",
            method,
            uri.path(),
            parts.status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );
    } else {
        tracing::warn!(
            tenant = %tenant,
            "{} {} -> {} in {}ms ({} bytes)",
            method,
            uri.path(),
            parts.status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );
    }

    Response::from_parts(parts, Body::from(bytes))
}
