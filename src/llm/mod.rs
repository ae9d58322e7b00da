//! LLM abstractions: the client trait, shared result types, and the
//! streaming protocol used by every provider.

/// Prompt assembly for the generate and learn flows.
pub mod prompt;
/// Built-in provider implementations and the client factory.
pub mod provider;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// Token accounting normalized to one shape across backends.
///
/// Each provider maps its native field names onto these three; when a
/// backend reports nothing, the whole value is absent rather than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Result of a one-shot generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Message text, trimmed of surrounding whitespace.
    pub message: String,
    pub usage: Option<TokenUsage>,
}

/// One unit of streamed output.
///
/// `usage` is populated on at most one chunk per stream, emitted at the
/// end with an empty `delta`. Concatenating every `delta` in order
/// yields the same text as the one-shot [`Completion::message`] for
/// equivalent input; the renderer trims the accumulated buffer once.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub delta: String,
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: text.into(),
            usage: None,
        }
    }

    pub fn usage(usage: TokenUsage) -> Self {
        Self {
            delta: String::new(),
            usage: Some(usage),
        }
    }
}

/// Events delivered over a stream channel.
///
/// The sequence is finite, ordered, and single-pass: chunks until
/// either `Done` or `Error`. Text already delivered before an error
/// remains valid; nothing is retracted.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Chunk(StreamChunk),
    Done,
    Error(String),
}

/// Receiving side of a streaming response.
///
/// # Usage
/// ```no_run
/// use komitto::llm::StreamEvent;
///
/// # async fn example(mut handle: komitto::llm::StreamHandle) {
/// while let Some(event) = handle.receiver.recv().await {
///     match event {
///         StreamEvent::Chunk(chunk) => print!("{}", chunk.delta),
///         StreamEvent::Done => break,
///         StreamEvent::Error(e) => {
///             eprintln!("stream failed: {}", e);
///             break;
///         }
///     }
/// }
/// # }
/// ```
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

/// Uniform contract implemented by every LLM backend.
///
/// Exactly one client is constructed per invocation
/// (see [`provider::create_client`]); it holds no conversation state
/// between calls — every call is prompted afresh with the full built
/// text.
///
/// # Implementer notes
/// - The caller guarantees a non-empty prompt (it always embeds a
///   non-empty diff).
/// - One-shot results are trimmed; a blank response is an
///   [`EmptyResponse`](crate::error::KomittoError::EmptyResponse) error.
/// - Override [`supports_streaming`](Self::supports_streaming) when the
///   backend speaks SSE; the review loop falls back to the one-shot
///   path otherwise.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends the built prompt and returns the completed message plus
    /// optional usage accounting.
    async fn generate_commit_message(&self, prompt: &str) -> Result<Completion>;

    /// Sends the built prompt and returns a handle yielding chunks as
    /// they arrive, so the renderer can display partial output.
    async fn stream_commit_message(&self, prompt: &str) -> Result<StreamHandle>;

    /// Provider name for logs and error messages.
    fn name(&self) -> &str;

    /// Whether [`stream_commit_message`](Self::stream_commit_message)
    /// delivers incremental chunks.
    fn supports_streaming(&self) -> bool {
        false
    }
}
