//! HTTP server hosting the proxy handler.

use crate::fetch::HttpFetcher;
use crate::http::{cors, GateRequest, GateResponse, Method};
use crate::proxy::{GateError, ProxyHandler};
use crate::runtime::GateConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// The proxy server: accepts connections and hands every request to the
/// [`ProxyHandler`].
pub struct GateServer {
    /// Server configuration.
    config: GateConfig,
    /// Shared request handler.
    handler: Arc<ProxyHandler>,
}

impl GateServer {
    /// Create a server with a real outbound HTTP client.
    pub fn new(config: GateConfig) -> Result<Self, reqwest::Error> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.forward_timeout))?;
        let handler = Arc::new(ProxyHandler::new(config.clone(), Arc::new(fetcher)));
        Ok(Self { config, handler })
    }

    /// Create a server around an existing handler.
    pub fn with_handler(config: GateConfig, handler: Arc<ProxyHandler>) -> Self {
        Self { config, handler }
    }

    /// Start the HTTP server.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("edgegate listening on {}", addr);
        info!("forwarding admin routes to {}", self.config.upstream_url);
        if self.config.admin_token.is_none() {
            warn!("ADMIN_TOKEN is not set; privileged routes will answer 500 until it is provisioned");
        }

        let handler = self.handler.clone();
        let max_body_size = self.config.max_body_size;

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let handler = handler.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { handle_request(req, handler, max_body_size, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request<B>(
    req: Request<B>,
    handler: Arc<ProxyHandler>,
    max_body_size: usize,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let request_id = generate_request_id();

    debug!(
        "Handling request: {} {} from {} [{}]",
        req.method(),
        req.uri().path(),
        remote_addr,
        request_id
    );

    let gate_request = match convert_request(req, max_body_size).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to read request: {} [{}]", e, request_id);
            return Ok(build_response(cors::apply(GateResponse::from(e))));
        }
    };

    let response = handler.handle(gate_request).await;
    Ok(build_response(response))
}

/// Convert a hyper Request to a GateRequest, reading the body fully.
async fn convert_request<B>(req: Request<B>, max_body_size: usize) -> Result<GateRequest, GateError>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = Method::from(req.method());
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|q| q.to_string());

    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_ascii_lowercase(), v.to_string());
        }
    }

    // Preflights are answered without touching the body, so a broken body
    // stream cannot turn an OPTIONS request into a 400.
    let body = if method == Method::Options {
        None
    } else {
        let bytes = req
            .collect()
            .await
            .map_err(|e| GateError::bad_request_body(e.to_string()))?
            .to_bytes();
        if bytes.len() > max_body_size {
            return Err(GateError::bad_request_body(format!(
                "request body exceeds {max_body_size} bytes"
            )));
        }
        if bytes.is_empty() {
            None
        } else {
            Some(bytes)
        }
    };

    Ok(GateRequest {
        method,
        path,
        query,
        headers,
        body,
    })
}

/// Build a hyper Response from a GateResponse.
fn build_response(gate_response: GateResponse) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(gate_response.status.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            gate_response.status.0
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);

    for (name, value) in gate_response.headers {
        builder = builder.header(name, value);
    }

    let body = gate_response.body.unwrap_or_default();
    match builder.body(Full::new(body)) {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to build response: {}", err);
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use crate::proxy::ErrorKind;

    fn hyper_request(method: &str, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    /// Body stream that fails on the first read.
    struct FailingBody;

    impl hyper::body::Body for FailingBody {
        type Data = Bytes;
        type Error = String;

        fn poll_frame(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Result<hyper::body::Frame<Self::Data>, Self::Error>>> {
            std::task::Poll::Ready(Some(Err("connection reset".to_string())))
        }
    }

    #[tokio::test]
    async fn test_conversion_captures_path_query_and_body() {
        let req = hyper_request("POST", "/post?dry=1", r#"{"id":9}"#);
        let converted = convert_request(req, 1024).await.unwrap();
        assert_eq!(converted.method, Method::Post);
        assert_eq!(converted.path, "/post");
        assert_eq!(converted.query.as_deref(), Some("dry=1"));
        assert_eq!(converted.body.as_deref(), Some(r#"{"id":9}"#.as_bytes()));
    }

    #[tokio::test]
    async fn test_header_keys_are_lowercased() {
        let req = Request::builder()
            .method("POST")
            .uri("/post")
            .header("X-Admin-Token", "t0")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let converted = convert_request(req, 1024).await.unwrap();
        assert_eq!(converted.get_header("X-Admin-Token").map(String::as_str), Some("t0"));
        assert!(converted.headers.contains_key("x-admin-token"));
    }

    #[tokio::test]
    async fn test_options_requests_skip_the_body() {
        let req = hyper_request("OPTIONS", "/post", "ignored");
        let converted = convert_request(req, 1024).await.unwrap();
        assert_eq!(converted.method, Method::Options);
        assert!(converted.body.is_none());
    }

    #[tokio::test]
    async fn test_oversized_bodies_are_rejected() {
        let req = hyper_request("POST", "/post", "0123456789");
        let err = convert_request(req, 4).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_failed_body_reads_become_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/post")
            .body(FailingBody)
            .unwrap();
        let err = convert_request(req, 1024).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, ErrorKind::BadRequestBody);
        assert!(err
            .details
            .as_deref()
            .unwrap_or_default()
            .contains("connection reset"));
    }

    #[tokio::test]
    async fn test_options_tolerates_a_broken_body_stream() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/post")
            .body(FailingBody)
            .unwrap();
        let converted = convert_request(req, 1024).await.unwrap();
        assert_eq!(converted.method, Method::Options);
        assert!(converted.body.is_none());
    }

    #[test]
    fn test_invalid_status_codes_fall_back_to_500() {
        let response = build_response(GateResponse::new(StatusCode(42)));
        assert_eq!(response.status(), hyper::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_build_response_carries_headers_and_body() {
        let response = build_response(
            GateResponse::new(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(r#"{"ok":true}"#),
        );
        assert_eq!(response.status(), hyper::StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }
}
