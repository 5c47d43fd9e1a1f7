//! Gatekeeper middleware.
//!
//! Runs classifier, rate limiter and credential gatekeeper in order, then the
//! wrapped router. If the client disconnects, axum drops this future and no
//! cookie mutation is ever written.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};

use crate::gate::Gatekeeper;
use crate::http::{request, response};
use crate::observability::metrics;
use crate::security::{RateDecision, Verdict};

/// Put the gatekeeper in front of every route (and fallback) of `router`.
pub fn wrap(router: Router, gate: Arc<Gatekeeper>) -> Router {
    router.layer(middleware::from_fn_with_state(gate, gate_middleware))
}

pub async fn gate_middleware(
    State(gate): State<Arc<Gatekeeper>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();

    let identity = match gate.classifier().classify(request::facts(&request)) {
        Verdict::Bypass => {
            let response = next.run(request).await;
            metrics::record_request("bypass", response.status().as_u16(), start);
            return response;
        }
        Verdict::Reject { reason, key } => {
            tracing::info!(
                client = %key,
                user_agent = request::user_agent(request.headers()).unwrap_or(""),
                reason = reason.as_str(),
                "Request blocked"
            );
            metrics::record_rejection(reason.as_str());
            metrics::record_request("rejected", 403, start);
            return response::forbidden();
        }
        Verdict::Admit(identity) => identity,
    };

    if gate.limiter().is_enforced() {
        let decision = gate.limiter().check(&identity);
        if let (RateDecision::Limited { count, limit, .. }, Some(retry_after)) =
            (decision, decision.retry_after_secs())
        {
            tracing::warn!(
                client = %identity.key,
                class = ?identity.class,
                count,
                limit,
                retry_after,
                "Rate limit exceeded"
            );
            metrics::record_rejection("rate_limited");
            metrics::record_request("rejected", 429, start);
            return response::too_many_requests(retry_after);
        }
    }

    let resolution = gate.credentials().resolve(request.headers_mut()).await;

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(resolution.session.clone());

    let mut response = next.run(request).await;
    resolution.rewrite.apply(response.headers_mut());
    metrics::record_request("admitted", response.status().as_u16(), start);
    response
}
