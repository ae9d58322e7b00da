//! Small provider helpers: endpoint joining and key masking.

/// OpenAI chat-completions path.
pub const OPENAI_API_SUFFIX: &str = "/v1/chat/completions";

/// Anthropic messages path.
pub const CLAUDE_API_SUFFIX: &str = "/v1/messages";

/// Default base URLs.
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";
pub const DEFAULT_CLAUDE_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// Joins a base URL with an API path, tolerating a trailing slash and a
/// base that already includes the full path.
///
/// # Example
/// ```
/// use komitto::llm::provider::utils::join_endpoint;
///
/// assert_eq!(
///     join_endpoint("https://api.example.com/", "/v1/chat/completions"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// assert_eq!(
///     join_endpoint("https://api.example.com/v1/chat/completions", "/v1/chat/completions"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// ```
pub fn join_endpoint(base_url: &str, suffix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(suffix) {
        base.to_string()
    } else {
        format!("{}{}", base, suffix)
    }
}

/// Masks an API key for debug logs: first 4 + `...` + last 4 chars,
/// or `****` for anything 8 chars or shorter.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}
