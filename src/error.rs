use thiserror::Error;

pub type Result<T> = std::result::Result<T, KomittoError>;

#[derive(Error, Debug)]
pub enum KomittoError {
    /// Not inside a git work tree.
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("No staged changes found")]
    NoStagedChanges,

    #[error("Git command failed: {0}")]
    GitCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    /// Backend-reported HTTP failure with its status code preserved.
    #[error("LLM API error ({status}): {message}")]
    LlmApi { status: u16, message: String },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    /// Stream ended before the backend signalled completion.
    #[error("{provider} stream ended unexpectedly: {detail}")]
    StreamTruncated { provider: String, detail: String },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration parsing error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    #[error("Operation cancelled by user")]
    UserCancelled,

    /// Catch-all for errors that fit no other bucket (internal
    /// invariant violations included).
    #[error("{0}")]
    Other(String),
}

impl KomittoError {
    /// True for errors raised by a generation attempt, i.e. the class
    /// that triggers the fallback copy of the built prompt.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            KomittoError::Authentication(_)
                | KomittoError::Llm(_)
                | KomittoError::LlmApi { .. }
                | KomittoError::EmptyResponse { .. }
                | KomittoError::StreamTruncated { .. }
                | KomittoError::Network(_)
        )
    }

    /// Localized user-facing message.
    pub fn localized_message(&self) -> String {
        match self {
            KomittoError::Repository(detail) => {
                rust_i18n::t!("error.repository", detail = detail.as_str()).to_string()
            }
            KomittoError::NoStagedChanges => rust_i18n::t!("error.no_staged_changes").to_string(),
            KomittoError::GitCommand(detail) => {
                rust_i18n::t!("error.git_command", detail = detail.as_str()).to_string()
            }
            KomittoError::Config(detail) => {
                rust_i18n::t!("error.config", detail = detail.as_str()).to_string()
            }
            KomittoError::Authentication(detail) => {
                rust_i18n::t!("error.authentication", detail = detail.as_str()).to_string()
            }
            KomittoError::UserCancelled => rust_i18n::t!("error.cancelled").to_string(),
            other => other.to_string(),
        }
    }

    /// Actionable hint displayed below the error message, when one exists.
    pub fn localized_suggestion(&self) -> Option<String> {
        match self {
            KomittoError::NoStagedChanges => {
                Some(rust_i18n::t!("error.suggest.stage_first").to_string())
            }
            KomittoError::Config(msg) | KomittoError::Authentication(msg)
                if msg.contains("API key") =>
            {
                if msg.contains("Gemini") {
                    Some(rust_i18n::t!("error.suggest.gemini_key").to_string())
                } else if msg.contains("OpenAI") {
                    Some(rust_i18n::t!("error.suggest.openai_key").to_string())
                } else if msg.contains("Anthropic") {
                    Some(rust_i18n::t!("error.suggest.anthropic_key").to_string())
                } else {
                    Some(rust_i18n::t!("error.suggest.set_key").to_string())
                }
            }
            KomittoError::Config(msg) if msg.contains("Unknown provider") => {
                Some(rust_i18n::t!("error.suggest.known_providers").to_string())
            }
            KomittoError::LlmApi { status: 401, .. } | KomittoError::LlmApi { status: 403, .. } => {
                Some(rust_i18n::t!("error.suggest.check_key").to_string())
            }
            KomittoError::LlmApi { status: 429, .. } => {
                Some(rust_i18n::t!("error.suggest.rate_limited").to_string())
            }
            KomittoError::LlmApi { status, .. } if *status >= 500 => {
                Some(rust_i18n::t!("error.suggest.service_unavailable").to_string())
            }
            KomittoError::Network(_) => Some(rust_i18n::t!("error.suggest.network").to_string()),
            _ => None,
        }
    }
}
