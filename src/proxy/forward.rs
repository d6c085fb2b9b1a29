//! Upstream forwarding.
//!
//! # Responsibilities
//! - Hold a buffered, replayable copy of the inbound request
//! - Rewrite the request URI onto a backend origin
//! - Strip hop-by-hop headers and append `X-Forwarded-For`
//! - Surface every network-level failure as a [`TransportError`]
//!
//! # Design Decisions
//! - Bodies are buffered once so retries can replay them
//! - Backend 5xx responses are responses, not transport errors
//! - One client is shared by every backend; it holds no per-backend state

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Response, Uri, Version};
use http_body_util::LengthLimitError;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use url::Url;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Failure to obtain any response from a backend.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Failure to read an inbound request body.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to read request body: {0}")]
    Read(axum::BoxError),
}

/// An inbound request buffered so it can be forwarded more than once.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl ProxiedRequest {
    /// Buffer an inbound request, refusing bodies larger than `limit` bytes.
    pub async fn buffer(
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
        limit: usize,
    ) -> Result<Self, BufferError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.is::<LengthLimitError>() {
                BufferError::TooLarge { limit }
            } else {
                BufferError::Read(inner)
            }
        })?;
        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            client_addr,
        })
    }

    /// Request path, for logging.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Join the backend origin with this request's path and query.
    pub fn upstream_uri(&self, backend: &Url) -> Result<Uri, TransportError> {
        let host = backend
            .host_str()
            .ok_or_else(|| TransportError::InvalidRequest(format!("backend {backend} has no host")))?;
        let authority = match backend.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let base = backend.path().trim_end_matches('/');
        let path = self.uri.path();
        let query = self.uri.query().map(|q| format!("?{q}")).unwrap_or_default();

        format!("{}://{}{}{}{}", backend.scheme(), authority, base, path, query)
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| TransportError::InvalidRequest(e.to_string()))
    }

    /// Build the request sent to `backend` for one forward.
    pub fn to_upstream(&self, backend: &Url) -> Result<Request<Body>, TransportError> {
        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers);
        // The client sets Host from the rewritten URI.
        headers.remove(header::HOST);

        if let Some(addr) = self.client_addr {
            let forwarded = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                Some(prior) => format!("{}, {}", prior, addr.ip()),
                None => addr.ip().to_string(),
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(self.upstream_uri(backend)?)
            .body(Body::from(self.body.clone()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

/// Remove connection-scoped headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Capability to transmit a request to one backend origin.
#[async_trait]
pub trait Forwarder: Send + Sync + fmt::Debug {
    /// Forward `request` to `backend` and return its response verbatim.
    async fn forward(
        &self,
        backend: &Url,
        request: &ProxiedRequest,
    ) -> Result<Response<Body>, TransportError>;
}

/// Forwarder backed by the hyper-util pooled client.
#[derive(Clone)]
pub struct HyperForwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HyperForwarder {
    /// Create a forwarder whose connect and response-header wait are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client, timeout }
    }
}

impl fmt::Debug for HyperForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperForwarder")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Forwarder for HyperForwarder {
    async fn forward(
        &self,
        backend: &Url,
        request: &ProxiedRequest,
    ) -> Result<Response<Body>, TransportError> {
        let upstream = request.to_upstream(backend)?;

        match time::timeout(self.timeout, self.client.request(upstream)).await {
            Ok(Ok(response)) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Ok(Err(e)) => Err(TransportError::Upstream(e)),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }
}
