use serde::Deserialize;
use service_core::config as core_config;
use service_core::config::get_env;
use service_core::error::AppError;

/// Default number of tokens generated per request.
const DEFAULT_MAX_OUTPUT_TOKENS: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct GemmaConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Upper bound on tokens generated per request.
    pub max_output_tokens: usize,
    /// Sampling temperature; 0 disables sampling (greedy decode).
    pub temperature: f64,
    /// Nucleus sampling cutoff, if set.
    pub top_p: Option<f64>,
}

impl GemmaConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();

        Ok(GemmaConfig {
            model: ModelConfig {
                max_output_tokens: get_env(
                    "GEMMA_MAX_OUTPUT_TOKENS",
                    Some(&DEFAULT_MAX_OUTPUT_TOKENS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
                temperature: get_env("GEMMA_TEMPERATURE", Some("0.9"), is_prod)?
                    .parse()
                    .unwrap_or(0.9),
                top_p: get_env("GEMMA_TOP_P", Some(""), is_prod)?.parse().ok(),
            },
            common,
        })
    }
}
