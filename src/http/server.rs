//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that hands every request to the gateway
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::gateway::{Gateway, Upstream};
use crate::http::request::MakeRequestUuidV4;

/// HTTP server for the forwarding gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server around `gateway`.
    pub fn new<U: Upstream>(config: Arc<ProxyConfig>, gateway: Gateway<U>) -> Self {
        let router = Self::build_router(&config, Arc::new(gateway));
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The gateway is the fallback so that `OPTIONS` on any path still gets
    /// its preflight answer and unknown paths get the gateway's 404.
    #[allow(deprecated)]
    fn build_router<U: Upstream>(config: &ProxyConfig, gateway: Arc<Gateway<U>>) -> Router {
        Router::new()
            .fallback(gateway_handler::<U>)
            .with_state(gateway)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.gateway.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn gateway_handler<U: Upstream>(
    State(gateway): State<Arc<Gateway<U>>>,
    request: Request<Body>,
) -> Response {
    gateway.handle(request).await
}
