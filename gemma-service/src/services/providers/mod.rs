//! Text-generation provider abstraction.
//!
//! The trait is deliberately synchronous: Gemma inference is CPU-bound and
//! blocking, and the HTTP layer offloads every call onto the tokio blocking
//! pool. Keeping the seam sync makes it impossible to accidentally run
//! inference inline on the event loop.

pub mod gemma;
pub mod mock;

use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference error: {0}")]
    Inference(String),
}

/// Result of a single generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Generated text.
    pub text: String,

    /// Prompt tokens consumed.
    pub input_tokens: usize,

    /// Tokens generated.
    pub output_tokens: usize,

    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
}

/// Generation parameters for a single request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Sampling temperature; 0 means greedy decoding.
    pub temperature: f64,

    /// Nucleus sampling cutoff.
    pub top_p: Option<f64>,

    /// Maximum tokens to generate.
    pub max_output_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: None,
            max_output_tokens: 256,
        }
    }
}

impl From<&crate::config::ModelConfig> for GenerationParams {
    fn from(model: &crate::config::ModelConfig) -> Self {
        Self {
            temperature: model.temperature,
            top_p: model.top_p,
            max_output_tokens: model.max_output_tokens,
        }
    }
}

/// Trait for blocking text generators.
///
/// `generate` is an ordinary blocking call; callers on an async runtime must
/// go through `tokio::task::spawn_blocking`.
pub trait TextGenerator: Send + Sync {
    /// Preset identifier this generator was loaded from.
    fn preset(&self) -> &str;

    /// Generate a completion for the given prompt.
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Generation, ProviderError>;

    /// Cheap readiness probe.
    fn health_check(&self) -> Result<(), ProviderError>;
}
