//! SSE parsing for streaming responses.
//!
//! Each processor consumes one HTTP response body, forwards text deltas
//! over the channel as soon as they parse, and finishes with a
//! usage-only chunk (when the backend reported accounting) followed by
//! [`StreamEvent::Done`](crate::llm::StreamEvent::Done).

pub mod claude;
pub mod gemini;
pub mod openai;

pub use claude::process_claude_stream;
pub use gemini::process_gemini_stream;
pub use openai::process_openai_stream;

/// Extracts the payload of a `data: ` SSE line.
pub(super) fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data: ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(parse_sse_line("data: [DONE]"), Some("[DONE]"));
        assert_eq!(parse_sse_line("event: message_start"), None);
        assert!(parse_sse_line("data:").is_none());
    }
}
