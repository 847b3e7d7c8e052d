use gemma_service::config::GemmaConfig;
use gemma_service::services::initialize_model;
use gemma_service::startup::Application;

use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing("gemma-service", "info");

    let config = GemmaConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Credential validation and weight download happen before the listener
    // binds, so a misconfigured process fails fast instead of serving 503s.
    let text_generator = tokio::task::spawn_blocking(initialize_model)
        .await
        .map_err(|e| std::io::Error::other(format!("Model load task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Failed to initialize model: {}", e);
            std::io::Error::other(format!("Model initialization error: {}", e))
        })?;

    let app = Application::build(config, text_generator)
        .await
        .map_err(|e| {
            tracing::error!("Failed to build application: {}", e);
            std::io::Error::other(format!("Startup error: {}", e))
        })?;

    tokio::select! {
        result = app.run_until_stopped() => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}
