//! Shared builders for provider tests.

use crate::config::{LlmConfig, NetworkConfig};

/// Installs the rustls crypto provider for tests.
///
/// reqwest with `rustls-no-provider` needs one installed explicitly;
/// production does this in main, tests do it here. Repeated calls are
/// harmless.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// `NetworkConfig` with retries disabled, so API-error tests do not
/// wait out backoff delays.
pub fn test_network_config_no_retry() -> NetworkConfig {
    NetworkConfig {
        max_retries: 0,
        ..Default::default()
    }
}

/// `LlmConfig` pointed at a mock server.
pub fn test_llm_config(base_url: String, api_key: Option<String>, model: &str) -> LlmConfig {
    LlmConfig {
        provider: None,
        api_key,
        model: Some(model.to_string()),
        history_limit: 5,
        endpoint: Some(base_url),
        max_tokens: None,
        temperature: None,
    }
}
