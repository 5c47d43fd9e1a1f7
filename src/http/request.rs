//! Request inspection helpers.
//!
//! Pulls the classifier's inputs out of an inbound request without copying.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, Request};

use crate::security::RequestFacts;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

pub fn forwarded_for(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok())
}

/// Transport peer, present when served with `into_make_service_with_connect_info`.
pub fn peer_ip<B>(request: &Request<B>) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

pub fn facts<B>(request: &Request<B>) -> RequestFacts<'_> {
    RequestFacts {
        path: request.uri().path(),
        user_agent: user_agent(request.headers()),
        forwarded_for: forwarded_for(request.headers()),
        peer: peer_ip(request),
    }
}

pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_facts_from_request() {
        let mut request = Request::builder()
            .uri("/blog/7?lang=en")
            .header(USER_AGENT, "Mozilla/5.0 (Macintosh)")
            .header(X_FORWARDED_FOR, "203.0.113.5, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("10.0.0.9:5555".parse::<SocketAddr>().unwrap()));

        let facts = facts(&request);
        assert_eq!(facts.path, "/blog/7");
        assert_eq!(facts.user_agent, Some("Mozilla/5.0 (Macintosh)"));
        assert_eq!(facts.forwarded_for, Some("203.0.113.5, 10.0.0.1"));
        assert_eq!(facts.peer, Some("10.0.0.9".parse().unwrap()));
    }

    #[test]
    fn test_missing_headers() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let facts = facts(&request);
        assert_eq!(facts.user_agent, None);
        assert_eq!(facts.peer, None);
        assert_eq!(request_id(request.headers()), "-");
    }
}
