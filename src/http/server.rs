//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (gatekeeper, tracing, timeout, request ID)
//! - Bind server to listener
//! - Forward admitted requests to the content site

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, Scheme},
        Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::RefreshClientError;
use crate::config::GatekeeperConfig;
use crate::gate::Gatekeeper;
use crate::http::middleware;
use crate::http::request;
use crate::lifecycle::signals;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Credentials(#[from] RefreshClientError),

    #[error("invalid downstream site URL '{0}'")]
    SiteUrl(String),
}

/// Where admitted requests are forwarded.
#[derive(Clone)]
pub struct SiteState {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
}

impl SiteState {
    pub fn from_url(site_url: &str) -> Result<Self, ServerError> {
        let uri: Uri = site_url
            .parse()
            .map_err(|_| ServerError::SiteUrl(site_url.to_string()))?;
        let (Some(scheme), Some(authority)) = (uri.scheme().cloned(), uri.authority().cloned())
        else {
            return Err(ServerError::SiteUrl(site_url.to_string()));
        };

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            scheme,
            authority,
        })
    }
}

/// HTTP server for the gatekeeper.
pub struct HttpServer {
    router: Router,
    config: GatekeeperConfig,
    gate: Arc<Gatekeeper>,
}

impl HttpServer {
    /// Gatekeeper in front of the configured content site.
    pub fn new(config: GatekeeperConfig) -> Result<Self, ServerError> {
        let site = SiteState::from_url(&config.downstream.site_url)?;
        let downstream = Router::new().fallback(forward_handler).with_state(site);
        Self::with_downstream(config, downstream)
    }

    /// Gatekeeper in front of an arbitrary router.
    pub fn with_downstream(config: GatekeeperConfig, downstream: Router) -> Result<Self, ServerError> {
        let gate = Arc::new(Gatekeeper::from_config(&config)?);
        let router = Self::build_router(&config, gate.clone(), downstream);
        Ok(Self {
            router,
            config,
            gate,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatekeeperConfig, gate: Arc<Gatekeeper>, downstream: Router) -> Router {
        middleware::wrap(downstream, gate)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request::request_id(req.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = ?self.config.mode,
            rate_limited = self.gate.limiter().is_enforced(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = signals::shutdown_signal() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gatekeeper(&self) -> &Arc<Gatekeeper> {
        &self.gate
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }
}

/// Forward the request to the content site. No retries.
async fn forward_handler(State(site): State<SiteState>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(site.scheme.clone());
    uri_parts.authority = Some(site.authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(axum::http::uri::PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build downstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    match site.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(error = %e, site = %site.authority, "Downstream site unreachable");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
