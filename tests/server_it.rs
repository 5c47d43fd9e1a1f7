//! End-to-end: real listener, real content site, graceful shutdown.

use std::time::Duration;

use edge_gatekeeper::{HttpServer, Shutdown};
use tokio::net::TcpListener;

mod common;
use common::*;

const SITE_BODY: &str = "<html>welcome</html>";

#[tokio::test]
async fn test_forwards_admitted_and_blocks_bots() {
    let site = start_mock_site(SITE_BODY).await;

    let mut cfg = config("http://127.0.0.1:1");
    cfg.downstream.site_url = format!("http://{}", site);
    let server = HttpServer::new(cfg).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let admitted = client
        .get(format!("http://{}/articles/1", addr))
        .header("user-agent", BROWSER_UA)
        .send()
        .await
        .unwrap();
    assert_eq!(admitted.status(), 200);
    assert!(admitted.headers().contains_key("x-request-id"));
    assert_eq!(admitted.text().await.unwrap(), SITE_BODY);

    let blocked = client
        .get(format!("http://{}/articles/1", addr))
        .header("user-agent", "curl/8.4.0")
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status(), 403);
    assert!(blocked.text().await.unwrap().is_empty());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_site_is_bad_gateway() {
    let mut cfg = config("http://127.0.0.1:1");
    cfg.downstream.site_url = "http://127.0.0.1:1".into();
    let router = HttpServer::new(cfg).unwrap().router();

    let reply = send(&router, page("/", Some(BROWSER_UA), "198.51.100.9", None)).await;
    assert_eq!(reply.status, axum::http::StatusCode::BAD_GATEWAY);
}
