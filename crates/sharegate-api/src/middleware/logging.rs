//! Request/response logging middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

/// Logs request method, path, status, and duration.
///
/// Redemption paths carry a bearer credential in the last segment, so
/// only the route prefix is logged for them.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = loggable_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "HTTP request"
    );

    response
}

fn loggable_path(path: &str) -> String {
    for prefix in ["/api/filesystem/upload/", "/api/filesystem/download/"] {
        if path.starts_with(prefix) {
            return format!("{prefix}<token>");
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_not_logged() {
        assert_eq!(
            loggable_path("/api/filesystem/download/eyJhbGciOi.abc.def"),
            "/api/filesystem/download/<token>"
        );
        assert_eq!(loggable_path("/api/shares"), "/api/shares");
    }
}
