//! Kaggle model hub client and model initialization.
//!
//! `initialize_model` is the startup entry point: it applies `.env`
//! overrides, validates the Kaggle credential pair, and asks the hub for the
//! pretrained Gemma preset. The hub itself is a trait so tests can substitute
//! a double instead of downloading weights.

use crate::services::providers::gemma::GemmaTextGenerator;
use crate::services::providers::{ProviderError, TextGenerator};
use indicatif::{ProgressBar, ProgressStyle};
use service_core::error::AppError;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Preset identifier of the pretrained Gemma artifact served by this process.
pub const GEMMA_PRESET: &str = "gemma_1.1_instruct_2b_en";

/// Environment variables holding the Kaggle credential pair.
pub const KAGGLE_USERNAME_VAR: &str = "KAGGLE_USERNAME";
pub const KAGGLE_KEY_VAR: &str = "KAGGLE_KEY";

/// Files that make up a downloaded preset.
const ARTIFACT_FILES: [&str; 3] = ["config.json", "tokenizer.json", "model.safetensors"];

/// A source of pretrained text generators, addressed by preset identifier.
pub trait ModelHub: Send + Sync {
    fn from_preset(&self, preset: &str) -> Result<Arc<dyn TextGenerator>, ProviderError>;
}

/// Validate credentials and load the fixed Gemma preset from Kaggle.
///
/// Reads `.env` overrides first (a no-op if the file is absent), then checks
/// `KAGGLE_USERNAME` and `KAGGLE_KEY` in that order, failing with an error
/// that names the missing variable. The returned handle is exactly what the
/// hub produced; caching it is the caller's job.
pub fn initialize_model() -> Result<Arc<dyn TextGenerator>, AppError> {
    let hub = KaggleHub::new(cache_dir());
    initialize_model_with(&hub)
}

/// Artifact cache location: `GEMMA_CACHE_DIR`, else `~/.cache/gemma-service`.
fn cache_dir() -> PathBuf {
    if let Ok(dir) = env::var("GEMMA_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".cache/gemma-service"))
        .unwrap_or_else(|_| PathBuf::from(".cache/gemma-service"))
}

/// [`initialize_model`] with an injected hub, for tests and alternate backends.
pub fn initialize_model_with(hub: &dyn ModelHub) -> Result<Arc<dyn TextGenerator>, AppError> {
    dotenvy::dotenv().ok();

    require_credential(KAGGLE_USERNAME_VAR)?;
    require_credential(KAGGLE_KEY_VAR)?;

    hub.from_preset(GEMMA_PRESET).map_err(AppError::from)
}

fn require_credential(var: &str) -> Result<String, AppError> {
    env::var(var).map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("{} environment variable not found", var))
    })
}

/// Kaggle-backed hub: downloads preset artifacts with basic-auth credentials
/// and loads the candle backend from the local cache.
pub struct KaggleHub {
    cache_dir: PathBuf,
    base_url: String,
}

impl KaggleHub {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            base_url: "https://www.kaggle.com/api/v1/models/keras/gemma/keras".to_string(),
        }
    }

    /// Point the hub at a different artifact host. Used by tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Check if all artifact files for a preset are already cached.
    pub fn artifacts_present(preset_dir: &Path) -> bool {
        ARTIFACT_FILES
            .iter()
            .all(|file| preset_dir.join(file).exists())
    }

    /// List artifact files missing from the cache.
    pub fn missing_artifacts(preset_dir: &Path) -> Vec<String> {
        ARTIFACT_FILES
            .iter()
            .filter(|file| !preset_dir.join(file).exists())
            .map(|s| s.to_string())
            .collect()
    }

    /// Download all missing artifact files for a preset into the cache.
    fn download(&self, preset: &str, preset_dir: &Path) -> Result<(), ProviderError> {
        std::fs::create_dir_all(preset_dir)
            .map_err(|e| ProviderError::Download(format!("cache dir unwritable: {}", e)))?;

        let missing = Self::missing_artifacts(preset_dir);
        if missing.is_empty() {
            tracing::debug!(preset = preset, "all artifacts cached");
            return Ok(());
        }

        let username = env::var(KAGGLE_USERNAME_VAR)
            .map_err(|_| ProviderError::NotConfigured(format!("{} not set", KAGGLE_USERNAME_VAR)))?;
        let key = env::var(KAGGLE_KEY_VAR)
            .map_err(|_| ProviderError::NotConfigured(format!("{} not set", KAGGLE_KEY_VAR)))?;

        tracing::info!(
            preset = preset,
            missing = missing.join(", "),
            "downloading model artifacts"
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| ProviderError::Download(e.to_string()))?;

        let pb = ProgressBar::new(missing.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(format!("Downloading {}", preset));

        for file in &missing {
            self.download_file(&client, &username, &key, preset, file, preset_dir)?;
            pb.inc(1);
        }

        pb.finish_with_message("Download complete");
        Ok(())
    }

    fn download_file(
        &self,
        client: &reqwest::blocking::Client,
        username: &str,
        key: &str,
        preset: &str,
        filename: &str,
        preset_dir: &Path,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/{}/1/download/{}", self.base_url, preset, filename);

        let response = client
            .get(&url)
            .basic_auth(username, Some(key))
            .send()
            .map_err(|e| ProviderError::Download(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Download(format!(
                "{}: HTTP {}",
                filename,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| ProviderError::Download(format!("{}: {}", filename, e)))?;

        let target_path = preset_dir.join(filename);
        let mut file = File::create(&target_path)
            .map_err(|e| ProviderError::Download(format!("{:?}: {}", target_path, e)))?;
        file.write_all(&bytes)
            .map_err(|e| ProviderError::Download(format!("{:?}: {}", target_path, e)))?;

        Ok(())
    }
}

impl ModelHub for KaggleHub {
    fn from_preset(&self, preset: &str) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        let preset_dir = self.cache_dir.join(preset);
        self.download(preset, &preset_dir)?;
        let generator = GemmaTextGenerator::load(&preset_dir, preset)?;
        Ok(Arc::new(generator))
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ProviderError::NotConfigured(msg) => {
                tracing::warn!(reason = %msg, "provider not configured");
                AppError::ServiceUnavailable
            }
            ProviderError::Download(msg) => AppError::BadGateway(msg),
            ProviderError::Tokenizer(msg) | ProviderError::Inference(msg) => {
                AppError::InternalError(anyhow::anyhow!(msg))
            }
        }
    }
}
