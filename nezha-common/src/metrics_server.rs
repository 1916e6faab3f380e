//! HTTP server for exposing Prometheus metrics

use anyhow::{Context, Result};
use hyper::header::{HeaderValue, CONNECTION, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::metrics::MetricsRegistry;

/// Content type announced on every scrape response
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// HTTP metrics server
pub struct MetricsServer {
    registry: Arc<MetricsRegistry>,
    addr: SocketAddr,
}

impl MetricsServer {
    /// Create a new metrics server
    pub fn new(registry: Arc<MetricsRegistry>, addr: SocketAddr) -> Self {
        Self { registry, addr }
    }

    /// Bind the listener and serve scrapes on a background task until
    /// `shutdown` fires. Returns the bound address.
    pub fn spawn(
        self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
        let registry = Arc::clone(&self.registry);

        let make_svc = make_service_fn(move |_conn| {
            let registry = Arc::clone(&registry);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let registry = Arc::clone(&registry);
                    handle_request(req, registry)
                }))
            }
        });

        let server = Server::try_bind(&self.addr)
            .with_context(|| format!("Failed to bind metrics server to {}", self.addr))?
            .http1_keepalive(false)
            .serve(make_svc);
        let local_addr = server.local_addr();
        info!("Metrics server listening on http://{}", local_addr);

        let graceful = server.with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        });

        let handle = tokio::spawn(async move {
            if let Err(e) = graceful.await {
                error!("Metrics server error: {}", e);
                return Err(e.into());
            }
            info!("Metrics server stopped");
            Ok(())
        });

        Ok((local_addr, handle))
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<Body>,
    registry: Arc<MetricsRegistry>,
) -> Result<Response<Body>, Infallible> {
    debug!(method = %req.method(), path = req.uri().path(), "Scrape request");

    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") | (&Method::GET, "/metrics") => match registry.export_metrics() {
            Ok(metrics) => response(StatusCode::OK, metrics),
            Err(e) => {
                error!("Failed to export metrics: {}", e);
                response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
            }
        },
        _ => response(StatusCode::NOT_FOUND, "Not Found".to_string()),
    };

    Ok(response)
}

fn response(status: StatusCode, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(EXPOSITION_CONTENT_TYPE));
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    response
}
