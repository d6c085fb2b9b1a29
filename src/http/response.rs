//! Responses the balancer produces itself.
//!
//! # Design Decisions
//! - Clients see a backend response or a plain-text 503, never upstream error detail
//! - Oversized request bodies are rejected before dispatch with 413
//! - Bodies that cannot be read at all are rejected with 400

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;

/// 503 returned when every attempt has been used or no backend is alive.
pub fn service_unavailable() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, "Service not available").into_response()
}

/// 413 returned when the request body exceeds the configured limit.
pub fn payload_too_large() -> Response<Body> {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}

/// 400 returned when the request body could not be read.
pub fn bad_request() -> Response<Body> {
    (StatusCode::BAD_REQUEST, "Malformed request body").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn service_unavailable_is_plain_text() {
        let response = service_unavailable();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
