//! Model initialization tests.
//!
//! The hub is replaced with a recording double so no weights are downloaded;
//! credential scenarios drive the process environment under a shared lock.

use gemma_service::services::providers::mock::MockTextGenerator;
use gemma_service::services::providers::{ProviderError, TextGenerator};
use gemma_service::services::{initialize_model_with, ModelHub, GEMMA_PRESET};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

/// Serializes tests that mutate process-wide environment variables.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Hub double: returns a fixed handle and records every preset requested.
struct RecordingHub {
    handle: Arc<dyn TextGenerator>,
    requested: Mutex<Vec<String>>,
}

impl RecordingHub {
    fn new() -> Self {
        Self {
            handle: Arc::new(MockTextGenerator::new(true)),
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl ModelHub for RecordingHub {
    fn from_preset(&self, preset: &str) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        self.requested.lock().unwrap().push(preset.to_string());
        Ok(self.handle.clone())
    }
}

fn set_credentials(username: Option<&str>, key: Option<&str>) {
    match username {
        Some(value) => std::env::set_var("KAGGLE_USERNAME", value),
        None => std::env::remove_var("KAGGLE_USERNAME"),
    }
    match key {
        Some(value) => std::env::set_var("KAGGLE_KEY", value),
        None => std::env::remove_var("KAGGLE_KEY"),
    }
}

#[test]
fn initialize_model_returns_hub_handle() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials(Some("test_user"), Some("test_key"));

    let hub = RecordingHub::new();
    let handle = initialize_model_with(&hub).expect("initialization should succeed");

    // The handle is exactly what the hub produced, unchanged.
    assert!(Arc::ptr_eq(&handle, &hub.handle));

    let requested = hub.requested.lock().unwrap();
    assert_eq!(requested.as_slice(), [GEMMA_PRESET]);
}

#[test]
fn initialize_model_fails_without_username() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials(None, Some("test_key"));

    let hub = RecordingHub::new();
    // Discard the Ok handle so expect_err can print the error alone.
    let err = initialize_model_with(&hub)
        .map(|_| ())
        .expect_err("missing username should fail");

    assert!(
        err.to_string()
            .contains("KAGGLE_USERNAME environment variable not found"),
        "unexpected error: {}",
        err
    );
    assert!(hub.requested.lock().unwrap().is_empty());
}

#[test]
fn missing_username_reported_first() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials(None, None);

    let hub = RecordingHub::new();
    let err = initialize_model_with(&hub)
        .map(|_| ())
        .expect_err("missing credentials should fail");

    // Username is checked before the key, so its name wins when both are gone.
    assert!(err
        .to_string()
        .contains("KAGGLE_USERNAME environment variable not found"));
}

#[test]
fn initialize_model_fails_without_key() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials(Some("test_user"), None);

    let hub = RecordingHub::new();
    let err = initialize_model_with(&hub)
        .map(|_| ())
        .expect_err("missing key should fail");

    assert!(
        err.to_string()
            .contains("KAGGLE_KEY environment variable not found"),
        "unexpected error: {}",
        err
    );
    assert!(hub.requested.lock().unwrap().is_empty());
}
