//! Terminal responses produced by the gatekeeper itself.
//!
//! Both carry an empty body; the status and `Retry-After` are the contract.

use axum::body::Body;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;

pub fn forbidden() -> Response {
    status_only(StatusCode::FORBIDDEN)
}

pub fn too_many_requests(retry_after_secs: u64) -> Response {
    let mut response = status_only(StatusCode::TOO_MANY_REQUESTS);
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}

fn status_only(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_requests_has_retry_after() {
        let response = too_many_requests(42);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[test]
    fn test_forbidden() {
        assert_eq!(forbidden().status(), StatusCode::FORBIDDEN);
    }
}
