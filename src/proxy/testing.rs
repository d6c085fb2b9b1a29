//! Test doubles for the forwarding boundary.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Response, StatusCode, Version};
use url::Url;

use crate::proxy::forward::{Forwarder, ProxiedRequest, TransportError};

pub fn request(path: &str) -> ProxiedRequest {
    ProxiedRequest {
        method: Method::GET,
        uri: path.parse().unwrap(),
        version: Version::HTTP_11,
        headers: HeaderMap::new(),
        body: Bytes::new(),
        client_addr: None,
    }
}

fn refused() -> TransportError {
    TransportError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"))
}

/// Answers 200 with the backend address as body.
#[derive(Debug)]
pub struct EchoForwarder;

#[async_trait]
impl Forwarder for EchoForwarder {
    async fn forward(&self, backend: &Url, _: &ProxiedRequest) -> Result<Response<Body>, TransportError> {
        Ok(Response::new(Body::from(backend.to_string())))
    }
}

/// Fails forwards to the listed backends, echoes for the rest, and records every call.
#[derive(Debug, Default)]
pub struct FailingForwarder {
    failing: Vec<Url>,
    fail_all: bool,
    calls: Mutex<Vec<(Url, Instant)>>,
}

impl FailingForwarder {
    pub fn always() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn for_backends(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|a| Url::parse(a).unwrap()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Url, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_per_backend(&self) -> HashMap<Url, usize> {
        let mut counts = HashMap::new();
        for (url, _) in self.calls() {
            *counts.entry(url).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl Forwarder for FailingForwarder {
    async fn forward(&self, backend: &Url, _: &ProxiedRequest) -> Result<Response<Body>, TransportError> {
        self.calls.lock().unwrap().push((backend.clone(), Instant::now()));
        if self.fail_all || self.failing.contains(backend) {
            Err(refused())
        } else {
            Ok(Response::new(Body::from(backend.to_string())))
        }
    }
}

/// Fails the first `failures` forwards, then answers with `status`.
#[derive(Debug)]
pub struct FlakyForwarder {
    failures: usize,
    status: StatusCode,
    calls: AtomicUsize,
}

impl FlakyForwarder {
    pub fn new(failures: usize, status: StatusCode) -> Self {
        Self {
            failures,
            status,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Forwarder for FlakyForwarder {
    async fn forward(&self, _: &Url, _: &ProxiedRequest) -> Result<Response<Body>, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(refused());
        }
        let mut response = Response::new(Body::from("ok"));
        *response.status_mut() = self.status;
        Ok(response)
    }
}
