//! Mock generator for testing.

use super::{FinishReason, Generation, GenerationParams, ProviderError, TextGenerator};
use std::time::Duration;

/// Mock text generator: echoes a canned reply, optionally after a blocking
/// delay so tests can exercise the thread-pool offload path.
pub struct MockTextGenerator {
    enabled: bool,
    delay: Option<Duration>,
}

impl MockTextGenerator {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            delay: None,
        }
    }

    /// Make every `generate` call block the current thread for `delay`
    /// before replying. Uses `std::thread::sleep`, matching the blocking
    /// profile of real inference.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl TextGenerator for MockTextGenerator {
    fn preset(&self) -> &str {
        "mock"
    }

    fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<Generation, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text generator not enabled".to_string(),
            ));
        }

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        Ok(Generation {
            text: format!("Mock response for: {}", prompt),
            input_tokens: prompt.len() / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Stop,
        })
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text generator not enabled".to_string(),
            ))
        }
    }
}
