use serde::{Deserialize, Serialize};

use crate::error::{KomittoError, Result};

/// Top-level application configuration, loaded from
/// `~/.config/komitto/config.toml` (platform equivalent elsewhere).
///
/// # Example
/// ```toml
/// [prompt]
/// system = "You are a commit message generator..."
///
/// [llm]
/// provider = "gemini"
/// model = "gemini-2.0-flash"
/// history_limit = 5
///
/// [ui]
/// colored = true
/// streaming = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Prompt configuration: the system prompt placed at the top of every
/// built prompt.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: default_system_prompt(),
        }
    }
}

/// LLM provider snapshot, read once at startup.
///
/// `provider` left empty means "no LLM configured": the built prompt is
/// copied to the clipboard instead of being sent anywhere.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider kind: "openai" | "gemini" | "anthropic"
    #[serde(default)]
    pub provider: Option<String>,

    /// API key. When absent, provider-specific environment variables
    /// are consulted at client construction.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name. Each provider has a default when unset.
    #[serde(default)]
    pub model: Option<String>,

    /// How many recent commits to include in the prompt.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Custom API endpoint (base URL).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Max tokens to generate.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            model: None,
            history_limit: default_history_limit(),
            endpoint: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// UI behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub colored: bool,

    /// Typewriter-style incremental output while generating.
    #[serde(default = "default_true")]
    pub streaming: bool,

    /// Interface language (BCP 47, e.g. "en", "ja"). Auto-detected when unset.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            colored: true,
            streaming: true,
            language: None,
        }
    }
}

/// Network behaviour for provider requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Max automatic retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial retry delay in milliseconds (doubles per attempt).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound on any single retry delay in milliseconds.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

/// Recognized provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
}

impl ProviderKind {
    /// Parses a configured provider string. "claude" is accepted as an
    /// alias for the Anthropic API style.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            _ => Err(KomittoError::Config(
                rust_i18n::t!("config.unknown_provider", name = name).to_string(),
            )),
        }
    }

    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-2.0-flash",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_retry_delay_ms() -> u64 {
    60_000
}

fn default_system_prompt() -> String {
    "You are a git commit message generator.\n\
     Analyze the staged diff and recent commit history, then write one \
     commit message that matches the repository's existing style.\n\
     Rules:\n\
     - First line max 72 chars\n\
     - Describe the intent of the change, not the mechanics\n\
     - Output ONLY the commit message, no explanation"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, None);
        assert_eq!(config.llm.history_limit, 5);
        assert!(config.ui.colored);
        assert!(config.ui.streaming);
        assert_eq!(config.network.request_timeout, 120);
        assert_eq!(config.network.max_retries, 3);
        assert!(config.prompt.system.contains("commit message"));
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(ProviderKind::parse("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse("Gemini").unwrap(), ProviderKind::Gemini);
        assert_eq!(
            ProviderKind::parse("anthropic").unwrap(),
            ProviderKind::Anthropic
        );
        assert_eq!(
            ProviderKind::parse("claude").unwrap(),
            ProviderKind::Anthropic
        );
    }

    #[test]
    fn test_provider_kind_unknown_is_config_error() {
        let err = ProviderKind::parse("cohere").unwrap_err();
        assert!(matches!(err, KomittoError::Config(_)));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm]
            provider = "gemini"
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.provider.as_deref(), Some("gemini"));
        assert_eq!(config.llm.history_limit, 5);
        assert!(config.ui.streaming);
    }

    #[test]
    fn test_default_models() {
        assert_eq!(ProviderKind::OpenAi.default_model(), "gpt-4o-mini");
        assert!(ProviderKind::Gemini.default_model().starts_with("gemini"));
        assert!(ProviderKind::Anthropic.default_model().starts_with("claude"));
    }
}
