//! HTTP Server
//!
//! Serves the content store on a single catch-all route. Every request is
//! handled by the dispatcher in `handlers` and logged once on completion.

use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error::{Error, Result};

use super::handlers::{handle_path, handle_root, AppState};

/// Width the method column is padded or truncated to
const METHOD_WIDTH: usize = 6;

/// HTTP server for the content store
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP server and run until Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!("Starting HTTP Server @ {}", self.config.bind_address);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone(), self.config.cors_enabled);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        tracing::info!("HTTP Server stopped");
        Ok(())
    }
}

/// Build the catch-all router
pub fn router(state: AppState, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route("/", any(handle_root))
        .route("/*path", any(handle_path))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// One line per request: status, method, elapsed time, request URI
async fn log_request(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    tracing::info!(
        "{}",
        format_log_line(response.status().as_u16(), method.as_str(), started.elapsed(), &uri)
    );
    response
}

fn format_log_line(status: u16, method: &str, elapsed: std::time::Duration, uri: &str) -> String {
    format!(
        "| {} | {:<width$.width$} | {:>10} | {} ",
        status,
        method,
        format!("{:?}", elapsed),
        uri,
        width = METHOD_WIDTH,
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
