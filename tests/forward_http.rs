//! Wire-level tests: the real reqwest fetcher against a mock upstream.
//!
//! These verify the exact HTTP method, path, headers, and body that leave
//! the proxy, plus the timeout and connection-failure mappings.

use edgegate::fetch::HttpFetcher;
use edgegate::http::{GateRequest, Method, StatusCode};
use edgegate::preview;
use edgegate::proxy::{forward, ErrorEnvelope, ProxyHandler};
use edgegate::runtime::{GateConfig, GateServer};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(timeout: Duration) -> HttpFetcher {
    HttpFetcher::new(timeout).expect("client builds")
}

#[tokio::test]
async fn test_forward_posts_with_injected_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/block/post"))
        .and(header("X-Admin-Token", "wire-secret"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"id":1}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = fetcher(Duration::from_secs(5));
    let inbound = GateRequest::new(Method::Post, "/post").body(r#"{"id":1}"#);
    let resp = forward(
        &client,
        &server.uri(),
        "/api/admin/block/post",
        &inbound,
        "wire-secret",
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text_body().as_deref(), Some(r#"{"success":true}"#));
    server.verify().await;
}

#[tokio::test]
async fn test_forward_sends_no_body_when_inbound_had_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/block/user"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = fetcher(Duration::from_secs(5));
    let inbound = GateRequest::new(Method::Post, "/user");
    let resp = forward(&client, &server.uri(), "/api/admin/block/user", &inbound, "t").await;

    assert_eq!(resp.status, StatusCode::OK);
    server.verify().await;
}

#[tokio::test]
async fn test_slow_upstream_maps_to_504() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/block/post"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = fetcher(Duration::from_millis(200));
    let inbound = GateRequest::new(Method::Post, "/post").body("{}");
    let resp = forward(&client, &server.uri(), "/api/admin/block/post", &inbound, "t").await;

    assert_eq!(resp.status, StatusCode::GATEWAY_TIMEOUT);
    let envelope: ErrorEnvelope = resp.json_body().expect("body").expect("envelope");
    assert_eq!(envelope.error, "Upstream timeout");
}

#[tokio::test]
async fn test_refused_connection_maps_to_502() {
    // Grab a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let base = format!("http://127.0.0.1:{port}");

    let client = fetcher(Duration::from_secs(2));
    let inbound = GateRequest::new(Method::Post, "/post").body("{}");
    let resp = forward(&client, &base, "/api/admin/block/post", &inbound, "t").await;

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    let envelope: ErrorEnvelope = resp.json_body().expect("body").expect("envelope");
    assert_eq!(envelope.error, "Upstream unreachable");
}

#[tokio::test]
async fn test_preview_scrapes_over_the_wire_with_its_own_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header(
            "User-Agent",
            "Mozilla/5.0 (compatible; BlockUnblockBot/1.0)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Wire Title</title></head></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = fetcher(Duration::from_secs(5));
    let request =
        GateRequest::new(Method::Get, "/preview").query(format!("url={}/page", server.uri()));
    let resp = preview::fetch_preview(&client, &request)
        .await
        .expect("preview succeeds");

    assert_eq!(resp.status, StatusCode::OK);
    let preview: edgegate::preview::LinkPreview =
        resp.json_body().expect("body").expect("preview json");
    assert_eq!(preview.title, "Wire Title");
    assert_eq!(preview.url, format!("{}/page", server.uri()));
    server.verify().await;
}

#[tokio::test]
async fn test_server_end_to_end_over_tcp() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/block/post"))
        .and(header("X-Admin-Token", "e2e-secret"))
        .and(body_string(r#"{"id":1}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
        .expect(1)
        .mount(&upstream)
        .await;

    // Grab a free port for the proxy itself.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let config = GateConfig::new()
        .host("127.0.0.1")
        .port(port)
        .admin_token("e2e-secret")
        .upstream_url(upstream.uri());
    let handler = Arc::new(ProxyHandler::new(
        config.clone(),
        Arc::new(fetcher(Duration::from_secs(5))),
    ));
    tokio::spawn(GateServer::with_handler(config, handler).run());

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{port}");

    // Retry until the listener is up.
    let mut attempt = 0;
    let resp = loop {
        let sent = client
            .post(format!("{base}/post"))
            .header("X-Admin-Token", "e2e-secret")
            .body(r#"{"id":1}"#)
            .send()
            .await;
        match sent {
            Ok(resp) => break resp,
            Err(_) if attempt < 50 => {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(e) => panic!("proxy never came up: {e}"),
        }
    };

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert_eq!(resp.text().await.expect("body"), r#"{"success":true}"#);

    // Preflight over the same socket path.
    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{base}/post"))
        .send()
        .await
        .expect("preflight");
    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok()),
        Some("GET, POST, OPTIONS")
    );

    upstream.verify().await;
}

#[tokio::test]
async fn test_server_honors_the_configured_forward_timeout() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/block/user"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(1)
        .mount(&upstream)
        .await;

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let config = GateConfig::new()
        .host("127.0.0.1")
        .port(port)
        .admin_token("timeout-secret")
        .upstream_url(upstream.uri())
        .forward_timeout(1);
    tokio::spawn(GateServer::new(config).expect("server builds").run());

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{port}");

    // Retry until the listener is up; the first accepted request then
    // stalls on the upstream until the one-second deadline fires.
    let mut attempt = 0;
    let resp = loop {
        let sent = client
            .post(format!("{base}/user"))
            .header("X-Admin-Token", "timeout-secret")
            .body("{}")
            .send()
            .await;
        match sent {
            Ok(resp) => break resp,
            Err(_) if attempt < 50 => {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(e) => panic!("proxy never came up: {e}"),
        }
    };

    assert_eq!(resp.status().as_u16(), 504);
    let envelope: ErrorEnvelope = resp.json().await.expect("envelope");
    assert_eq!(envelope.error, "Upstream timeout");
    upstream.verify().await;
}
