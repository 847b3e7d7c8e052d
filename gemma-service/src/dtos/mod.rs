use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    /// Input text. Gemma's context window is the real limit; the length
    /// bound rejects oversized bodies before tokenization.
    #[validate(length(min = 1, max = 8192, message = "text must be 1-8192 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generated_text: String,
    pub model: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}
