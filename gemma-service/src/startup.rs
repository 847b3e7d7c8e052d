//! Application startup and lifecycle management.
//!
//! Builds the axum router over a pre-loaded text generator and serves it.
//! The generator is injected rather than constructed here so tests can run
//! the full HTTP surface against a mock without touching the model hub.

use crate::config::GemmaConfig;
use crate::handlers;
use crate::services::providers::TextGenerator;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GemmaConfig,
    pub text_generator: Arc<dyn TextGenerator>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Bind a listener for the configured port (0 = random port for tests)
    /// and assemble the shared state.
    pub async fn build(
        config: GemmaConfig,
        text_generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, AppError> {
        tracing::info!(
            preset = text_generator.preset(),
            "initialized text generator"
        );

        let state = AppState {
            config: config.clone(),
            text_generator,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("gemma service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Router::new()
            .route("/generate", post(handlers::generate))
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .fallback(handlers::not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        axum::serve(self.listener, router).await
    }
}
