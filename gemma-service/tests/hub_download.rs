//! Kaggle hub download tests against a local mock server.
//!
//! `from_preset` is exercised end to end up to the weight-loading step: the
//! stub artifacts served here are not a loadable model, so a successful
//! download ends in a provider load error rather than a handle.

use gemma_service::services::providers::ProviderError;
use gemma_service::services::{KaggleHub, ModelHub, GEMMA_PRESET};
use httpmock::prelude::*;
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Serializes tests that mutate process-wide environment variables.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// `test_user:test_key` in basic-auth form.
const BASIC_AUTH: &str = "Basic dGVzdF91c2VyOnRlc3Rfa2V5";

fn set_credentials() {
    std::env::set_var("KAGGLE_USERNAME", "test_user");
    std::env::set_var("KAGGLE_KEY", "test_key");
}

fn artifact_path(filename: &str) -> String {
    format!("/{}/1/download/{}", GEMMA_PRESET, filename)
}

#[test]
fn from_preset_downloads_artifacts_with_credentials() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials();

    let server = MockServer::start();
    let cache = tempfile::tempdir().unwrap();

    let config_mock = server.mock(|when, then| {
        when.method(GET)
            .path(artifact_path("config.json"))
            .header("authorization", BASIC_AUTH);
        then.status(200).body("{}");
    });
    let tokenizer_mock = server.mock(|when, then| {
        when.method(GET)
            .path(artifact_path("tokenizer.json"))
            .header("authorization", BASIC_AUTH);
        then.status(200).body("{}");
    });
    let weights_mock = server.mock(|when, then| {
        when.method(GET)
            .path(artifact_path("model.safetensors"))
            .header("authorization", BASIC_AUTH);
        then.status(200).body("stub weights");
    });

    let hub = KaggleHub::new(cache.path().to_path_buf()).with_base_url(&server.base_url());
    let result = hub.from_preset(GEMMA_PRESET);

    config_mock.assert();
    tokenizer_mock.assert();
    weights_mock.assert();

    // Every artifact landed in the cache; the stub config is not a real
    // model, so loading fails after the download succeeded.
    assert!(KaggleHub::artifacts_present(&cache.path().join(GEMMA_PRESET)));
    assert!(matches!(
        result.map(|_| ()),
        Err(ProviderError::NotConfigured(_))
    ));
}

#[test]
fn from_preset_surfaces_upstream_http_errors() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials();

    let server = MockServer::start();
    let cache = tempfile::tempdir().unwrap();

    let denied_mock = server.mock(|when, then| {
        when.method(GET).path(artifact_path("config.json"));
        then.status(403);
    });

    let hub = KaggleHub::new(cache.path().to_path_buf()).with_base_url(&server.base_url());
    let result = hub.from_preset(GEMMA_PRESET);

    denied_mock.assert();
    match result.map(|_| ()) {
        Err(ProviderError::Download(msg)) => assert!(msg.contains("403"), "got: {}", msg),
        other => panic!("expected download error, got {:?}", other),
    }
}

#[test]
fn cached_artifacts_are_not_downloaded_again() {
    let _guard = ENV_LOCK.lock().unwrap();
    set_credentials();

    // No mocks registered: any request to the server would fail with 404.
    let server = MockServer::start();
    let cache = tempfile::tempdir().unwrap();

    let preset_dir = cache.path().join(GEMMA_PRESET);
    std::fs::create_dir_all(&preset_dir).unwrap();
    for file in ["config.json", "tokenizer.json", "model.safetensors"] {
        std::fs::write(preset_dir.join(file), "stub").unwrap();
    }

    let hub = KaggleHub::new(cache.path().to_path_buf()).with_base_url(&server.base_url());
    let result = hub.from_preset(GEMMA_PRESET);

    // The failure is the stub weights refusing to load, not a download error,
    // proving the hub never went back to the network.
    assert!(matches!(
        result.map(|_| ()),
        Err(ProviderError::NotConfigured(_))
    ));
}
