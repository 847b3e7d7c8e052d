//! HTTP handlers for the gemma service.
//!
//! Inference is blocking by contract, so `generate` never awaits the model
//! directly: the synchronous [`process_text`] runs on the tokio blocking
//! pool and the event loop stays free to serve other requests.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{GenerateRequest, GenerateResponse};
use crate::services::providers::{Generation, GenerationParams, ProviderError, TextGenerator};
use crate::startup::AppState;

/// Run one generation against the loaded model.
///
/// Deliberately a plain blocking function, not async: the model's forward
/// pass is CPU-bound and would stall the event loop if awaited inline. The
/// route wraps this in `spawn_blocking`.
pub fn process_text(
    generator: &dyn TextGenerator,
    text: &str,
    params: &GenerationParams,
) -> Result<Generation, ProviderError> {
    generator.generate(text, params)
}

/// POST /generate
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let request_id = Uuid::new_v4();
    tracing::info!(
        request_id = %request_id,
        input_bytes = req.text.len(),
        "generation requested"
    );

    let generator = state.text_generator.clone();
    let params = GenerationParams::from(&state.config.model);
    let generation =
        tokio::task::spawn_blocking(move || process_text(generator.as_ref(), &req.text, &params))
            .await
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("generation task failed: {}", e))
            })??;

    tracing::info!(
        request_id = %request_id,
        input_tokens = generation.input_tokens,
        output_tokens = generation.output_tokens,
        "generation complete"
    );

    Ok((
        StatusCode::OK,
        Json(GenerateResponse {
            generated_text: generation.text,
            model: state.text_generator.preset().to_string(),
            input_tokens: generation.input_tokens,
            output_tokens: generation.output_tokens,
        }),
    ))
}

/// GET /health — liveness probe.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "gemma-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Fallback for unmatched routes, so 404s share the JSON error shape.
pub async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("no route for {}", uri.path()))
}

/// GET /ready — readiness probe; checks the generator off the event loop.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let generator = state.text_generator.clone();
    match tokio::task::spawn_blocking(move || generator.health_check()).await {
        Ok(Ok(())) => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockTextGenerator;

    // Compile-time proof that process_text is an ordinary function returning
    // a Result, not a future. If someone makes it async this stops building.
    #[test]
    fn process_text_is_blocking() {
        let _: fn(
            &dyn TextGenerator,
            &str,
            &GenerationParams,
        ) -> Result<Generation, ProviderError> = process_text;
    }

    #[test]
    fn process_text_delegates_to_generator() {
        let generator = MockTextGenerator::new(true);
        let generation =
            process_text(&generator, "hello", &GenerationParams::default()).expect("should generate");
        assert_eq!(generation.text, "Mock response for: hello");
    }

    #[test]
    fn process_text_surfaces_provider_errors() {
        let generator = MockTextGenerator::new(false);
        let result = process_text(&generator, "hello", &GenerationParams::default());
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
