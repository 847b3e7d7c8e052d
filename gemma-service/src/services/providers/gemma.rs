//! Candle-backed Gemma text generator.
//!
//! Loads the preset artifacts (config, tokenizer, safetensors weights) from a
//! local directory and decodes autoregressively on CPU. The forward pass
//! mutates the KV cache, so inference state lives behind a mutex and only one
//! generation runs at a time per handle.

use super::{FinishReason, Generation, GenerationParams, ProviderError, TextGenerator};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::gemma::{Config as GemmaModelConfig, Model as GemmaModel};
use std::path::Path;
use std::sync::Mutex;
use tokenizers::Tokenizer;

/// Fixed sampling seed. Generation is deterministic for a given prompt and
/// parameter set, which keeps responses reproducible across replicas.
const SAMPLING_SEED: u64 = 299792458;

/// Token strings that terminate a Gemma turn.
const STOP_TOKENS: [&str; 2] = ["<eos>", "<end_of_turn>"];

struct InferenceState {
    model: GemmaModel,
    tokenizer: Tokenizer,
}

pub struct GemmaTextGenerator {
    preset: String,
    device: Device,
    stop_ids: Vec<u32>,
    state: Mutex<InferenceState>,
}

impl GemmaTextGenerator {
    /// Load a generator from a directory containing `config.json`,
    /// `tokenizer.json` and `model.safetensors`.
    pub fn load(model_dir: &Path, preset: &str) -> Result<Self, ProviderError> {
        let config_str = std::fs::read_to_string(model_dir.join("config.json"))
            .map_err(|e| ProviderError::NotConfigured(format!("config.json unreadable: {}", e)))?;
        let config: GemmaModelConfig = serde_json::from_str(&config_str)
            .map_err(|e| ProviderError::NotConfigured(format!("config.json invalid: {}", e)))?;

        let tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;

        let device = Device::Cpu;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[model_dir.join("model.safetensors")],
                DType::F32,
                &device,
            )
            .map_err(|e| ProviderError::NotConfigured(format!("weights unreadable: {}", e)))?
        };
        let model = GemmaModel::new(false, &config, vb)
            .map_err(|e| ProviderError::NotConfigured(format!("model load failed: {}", e)))?;

        let vocab = tokenizer.get_vocab(true);
        let stop_ids: Vec<u32> = STOP_TOKENS
            .iter()
            .filter_map(|tok| vocab.get(*tok).copied())
            .collect();

        tracing::info!(preset = preset, "loaded gemma weights");

        Ok(Self {
            preset: preset.to_string(),
            device,
            stop_ids,
            state: Mutex::new(InferenceState { model, tokenizer }),
        })
    }

    /// Wrap the raw input in the Gemma instruct turn template.
    fn format_prompt(text: &str) -> String {
        format!(
            "<start_of_turn>user\n{}<end_of_turn>\n<start_of_turn>model\n",
            text
        )
    }
}

impl TextGenerator for GemmaTextGenerator {
    fn preset(&self) -> &str {
        &self.preset
    }

    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, ProviderError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ProviderError::Inference("inference state poisoned".to_string()))?;

        state.model.clear_kv_cache();

        let encoding = state
            .tokenizer
            .encode(Self::format_prompt(prompt), true)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;
        let mut tokens = encoding.get_ids().to_vec();
        if tokens.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "prompt produced no tokens".to_string(),
            ));
        }
        let input_tokens = tokens.len();

        let temperature = (params.temperature > 0.0).then_some(params.temperature);
        let mut logits_processor = LogitsProcessor::new(SAMPLING_SEED, temperature, params.top_p);

        let mut generated: Vec<u32> = Vec::new();
        let mut finish_reason = FinishReason::Length;

        for index in 0..params.max_output_tokens {
            // Full prompt on the first pass, then one token at a time
            // against the KV cache.
            let context_size = if index > 0 { 1 } else { tokens.len() };
            let start_pos = tokens.len().saturating_sub(context_size);
            let input = Tensor::new(&tokens[start_pos..], &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(|e| ProviderError::Inference(e.to_string()))?;

            let logits = state
                .model
                .forward(&input, start_pos)
                .map_err(|e| ProviderError::Inference(e.to_string()))?;
            let logits = logits
                .squeeze(0)
                .and_then(|t| t.squeeze(0))
                .and_then(|t| t.to_dtype(DType::F32))
                .map_err(|e| ProviderError::Inference(e.to_string()))?;

            let next = logits_processor
                .sample(&logits)
                .map_err(|e| ProviderError::Inference(e.to_string()))?;
            tokens.push(next);

            if self.stop_ids.contains(&next) {
                finish_reason = FinishReason::Stop;
                break;
            }
            generated.push(next);
        }

        let text = state
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;

        Ok(Generation {
            text,
            input_tokens,
            output_tokens: generated.len(),
            finish_reason,
        })
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        self.state
            .lock()
            .map(|_| ())
            .map_err(|_| ProviderError::Inference("inference state poisoned".to_string()))
    }
}
