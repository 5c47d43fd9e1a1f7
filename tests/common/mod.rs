//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{COOKIE, SET_COOKIE, USER_AGENT},
        HeaderMap, Request, StatusCode,
    },
    response::{IntoResponse, Response},
    Json, Router,
};
use edge_gatekeeper::auth::Session;
use edge_gatekeeper::config::{GatekeeperConfig, RuntimeMode};
use edge_gatekeeper::security::ClientIdentity;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0";
pub const GOOGLEBOT_UA: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
pub const DOWNSTREAM_COOKIE: &str = "locale=en; Path=/";

/// Production-mode config pointing at `authority_url`.
pub fn config(authority_url: &str) -> GatekeeperConfig {
    let mut config = GatekeeperConfig::default();
    config.mode = RuntimeMode::Production;
    config.auth.jwt_secret = SECRET.to_string();
    config.auth.authority_url = authority_url.to_string();
    config.auth.refresh_timeout_secs = 1;
    config
}

/// HS256 token with `exp` offset from now.
pub fn sign(secret: &str, exp_offset_secs: i64) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    encode(
        &Header::default(),
        &json!({ "sub": "user-1", "exp": now + exp_offset_secs }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Downstream router that reports what it saw and sets a cookie of its own.
pub fn echo_site() -> Router {
    Router::new().fallback(echo)
}

async fn echo(request: Request<Body>) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let identity = request.extensions().get::<ClientIdentity>().cloned();
    let cookie = request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = json!({
        "gated": session.is_some(),
        "authenticated": session.as_ref().map(Session::is_authenticated).unwrap_or(false),
        "class": identity.map(|i| i.class),
        "cookie": cookie,
    });
    ([(SET_COOKIE, DOWNSTREAM_COOKIE)], Json(body)).into_response()
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }
}

pub fn page(path: &str, user_agent: Option<&str>, ip: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path).header("x-forwarded-for", ip);
    if let Some(ua) = user_agent {
        builder = builder.header(USER_AGENT, ua);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Reply {
    let response = router.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap().to_vec();
    Reply {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

/// Minimal content site on a real socket; answers every request with `body`.
pub async fn start_mock_site(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nSet-Cookie: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    DOWNSTREAM_COOKIE,
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}
