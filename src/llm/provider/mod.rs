pub mod claude;
pub mod gemini;
pub mod openai;
pub mod retry;
pub mod streaming;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::Client;

use crate::config::{LlmConfig, NetworkConfig, ProviderKind};
use crate::error::{KomittoError, Result};
use crate::llm::LlmClient;

/// Process-wide HTTP client (shared connection pool).
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Error from the first client-build attempt, kept so later calls fail
/// the same way instead of retrying construction.
static HTTP_CLIENT_ERROR: OnceLock<String> = OnceLock::new();

/// Gets or creates the shared HTTP client. The first caller's
/// `NetworkConfig` decides the timeouts.
pub(crate) fn create_http_client(network_config: &NetworkConfig) -> Result<Client> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    if let Some(err_msg) = HTTP_CLIENT_ERROR.get() {
        return Err(KomittoError::Llm(format!(
            "HTTP client initialization previously failed: {}",
            err_msg
        )));
    }

    let user_agent = format!(
        "{}/{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    match Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(network_config.request_timeout))
        .connect_timeout(Duration::from_secs(network_config.connect_timeout))
        .build()
    {
        Ok(client) => {
            let _ = HTTP_CLIENT.set(client.clone());
            Ok(client)
        }
        Err(e) => {
            let err_msg = e.to_string();
            let _ = HTTP_CLIENT_ERROR.set(err_msg.clone());
            Err(KomittoError::Llm(format!(
                "failed to create HTTP client: {}",
                err_msg
            )))
        }
    }
}

/// Builds the configured client variant.
///
/// Selection is driven by `llm.provider`; the caller has already
/// established that a provider is configured. Construction resolves
/// credentials (config first, then the variant's environment variables)
/// but performs no network call.
pub fn create_client(llm: &LlmConfig, network: &NetworkConfig) -> Result<Arc<dyn LlmClient>> {
    let name = llm
        .provider
        .as_deref()
        .ok_or_else(|| KomittoError::Config(rust_i18n::t!("config.no_provider").to_string()))?;

    match ProviderKind::parse(name)? {
        ProviderKind::OpenAi => Ok(Arc::new(openai::OpenAiClient::new(llm, network)?)),
        ProviderKind::Gemini => Ok(Arc::new(gemini::GeminiClient::new(llm, network)?)),
        ProviderKind::Anthropic => Ok(Arc::new(claude::ClaudeClient::new(llm, network)?)),
    }
}

/// Resolves an API key from the config, falling back to `env_vars` in
/// order. The error message names the provider and the variables so the
/// suggestion layer can point at the right fix.
pub(crate) fn resolve_api_key(
    configured: Option<&str>,
    env_vars: &[&str],
    provider: &str,
) -> Result<String> {
    if let Some(key) = configured
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    for var in env_vars {
        if let Ok(key) = std::env::var(var)
            && !key.is_empty()
        {
            tracing::debug!("{} API key resolved from ${}", provider, var);
            return Ok(key);
        }
    }

    Err(KomittoError::Config(format!(
        "{} API key not found. Set it in config.toml or via {}",
        provider,
        env_vars.join(" / ")
    )))
}
