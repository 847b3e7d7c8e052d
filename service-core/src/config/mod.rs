use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string())
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn is_prod(&self) -> bool {
        self.environment == "prod"
    }
}

/// Read an environment variable with an optional default.
///
/// In production the default is ignored and the variable is required, so a
/// forgotten deployment setting fails loudly at startup instead of silently
/// running with a dev fallback.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_prefers_set_value() {
        unsafe { env::set_var("SERVICE_CORE_TEST_VAR", "from-env") };
        let value = get_env("SERVICE_CORE_TEST_VAR", Some("fallback"), false).unwrap();
        assert_eq!(value, "from-env");
        unsafe { env::remove_var("SERVICE_CORE_TEST_VAR") };
    }

    #[test]
    fn get_env_falls_back_in_dev() {
        unsafe { env::remove_var("SERVICE_CORE_MISSING_VAR") };
        let value = get_env("SERVICE_CORE_MISSING_VAR", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_rejects_default_in_prod() {
        unsafe { env::remove_var("SERVICE_CORE_MISSING_VAR") };
        let result = get_env("SERVICE_CORE_MISSING_VAR", Some("fallback"), true);
        assert!(result.is_err());
    }
}
