//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Buffer request bodies so failed forwards can be replayed
//! - Hand every request to the dispatcher
//! - Run the health checker alongside the listener

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::BalancerConfig;
use crate::health::HealthChecker;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{bad_request, payload_too_large};
use crate::load_balancer::{PoolError, ServerPool};
use crate::observability::metrics;
use crate::proxy::{BufferError, Dispatcher, HyperForwarder, ProxiedRequest, RequestAttemptContext};
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<ServerPool>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: BalancerConfig) -> Result<Self, PoolError> {
        let forwarder = Arc::new(HyperForwarder::new(Duration::from_secs(
            config.timeouts.forward_secs,
        )));
        let pool = Arc::new(ServerPool::from_addresses(config.backends.as_slice(), forwarder)?);
        Ok(Self::with_pool(config, pool))
    }

    /// Create a server around an already built pool.
    pub fn with_pool(config: BalancerConfig, pool: Arc<ServerPool>) -> Self {
        let state = AppState {
            dispatcher: Dispatcher::new(pool.clone(), RetryPolicy::from(&config.retries)),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "Load balancer started"
        );

        if self.config.health_check.enabled {
            let checker = HealthChecker::new(self.pool.clone(), &self.config.health_check);
            tokio::spawn(checker.run(shutdown.resubscribe()));
        } else {
            tracing::info!("Active health checks disabled");
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Buffers the request and lets the dispatcher pick a backend.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response<Body> {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let ctx = RequestAttemptContext::from_extensions(request.extensions());
    let span = tracing::info_span!(
        "dispatch",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );

    let response = async {
        let proxied = match ProxiedRequest::buffer(request, Some(addr), state.max_body_bytes).await {
            Ok(proxied) => proxied,
            Err(e @ BufferError::TooLarge { .. }) => {
                tracing::warn!(error = %e, "Rejecting oversized request body");
                return payload_too_large();
            }
            Err(e @ BufferError::Read(_)) => {
                tracing::warn!(error = %e, "Failed to read request body");
                return bad_request();
            }
        };
        state.dispatcher.handle(&proxied, ctx).await
    }
    .instrument(span)
    .await;

    metrics::record_request(response.status().as_u16(), start_time);
    response
}
