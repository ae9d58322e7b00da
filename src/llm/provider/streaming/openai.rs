use futures_util::StreamExt;
use reqwest::Response;
use tokio::sync::mpsc;

use super::parse_sse_line;
use crate::error::{KomittoError, Result};
use crate::llm::provider::openai::OpenAiUsage;
use crate::llm::{StreamChunk, StreamEvent};

/// Delta frame of an OpenAI streaming response.
///
/// With `stream_options.include_usage` the final frame before `[DONE]`
/// carries `usage` and an empty `choices` array.
#[derive(Debug, serde::Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    choices: Vec<OpenAiDeltaChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiDeltaChoice {
    delta: OpenAiDeltaContent,
}

#[derive(Debug, serde::Deserialize)]
struct OpenAiDeltaContent {
    content: Option<String>,
}

/// Consumes an OpenAI SSE stream.
///
/// ```text
/// data: {"choices":[{"delta":{"content":"Hello"}}]}
///
/// data: {"choices":[],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}
///
/// data: [DONE]
/// ```
pub async fn process_openai_stream(
    response: Response,
    tx: mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut parse_errors = 0usize;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(KomittoError::Network)?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim().to_string();
            buffer = buffer[pos + 1..].to_string();

            if line.is_empty() {
                continue;
            }

            if let Some(data) = parse_sse_line(&line) {
                if data == "[DONE]" {
                    if parse_errors > 0 {
                        tracing::warn!("OpenAI stream had {} unparseable frames", parse_errors);
                    }
                    let _ = tx.send(StreamEvent::Done).await;
                    return Ok(());
                }

                match serde_json::from_str::<OpenAiDelta>(data) {
                    Ok(delta) => {
                        if let Some(choice) = delta.choices.first()
                            && let Some(content) = &choice.delta.content
                            && !content.is_empty()
                        {
                            let _ = tx
                                .send(StreamEvent::Chunk(StreamChunk::delta(content.clone())))
                                .await;
                        }
                        // Terminal accounting frame; [DONE] still follows
                        if let Some(usage) = delta.usage {
                            let _ = tx
                                .send(StreamEvent::Chunk(StreamChunk::usage(usage.normalize())))
                                .await;
                        }
                    }
                    Err(e) => {
                        parse_errors += 1;
                        tracing::warn!("Failed to parse OpenAI SSE data: {}, line: {}", e, data);
                    }
                }
            }
        }
    }

    // Stream ended without [DONE]
    if parse_errors > 0 {
        return Err(KomittoError::StreamTruncated {
            provider: "OpenAI".to_string(),
            detail: format!("{} unparseable frames and no [DONE] marker", parse_errors),
        });
    }
    let _ = tx.send(StreamEvent::Done).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use crate::llm::TokenUsage;

    fn sse_response(body: &str) -> Response {
        http::Response::builder()
            .status(200)
            .body(bytes::Bytes::from(body.to_string()))
            .unwrap()
            .into()
    }

    async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        while let Some(e) = rx.recv().await {
            out.push(e);
        }
        out
    }

    fn delta_text(event: &StreamEvent) -> &str {
        match event {
            StreamEvent::Chunk(chunk) => chunk.delta.as_str(),
            other => panic!("Expected Chunk, got {:?}", other),
        }
    }

    fn assert_done(event: &StreamEvent) {
        assert!(
            matches!(event, StreamEvent::Done),
            "Expected Done, got {:?}",
            event
        );
    }

    #[tokio::test]
    async fn test_openai_deltas_then_done() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n",
            "data: [DONE]\n",
        );
        let (tx, rx) = mpsc::channel(16);
        let result = process_openai_stream(sse_response(body), tx).await;

        assert!(result.is_ok());
        let events = drain(rx).await;
        assert_eq!(events.len(), 3);
        assert_eq!(delta_text(&events[0]), "Hello");
        assert_eq!(delta_text(&events[1]), " world");
        assert_done(&events[2]);
    }

    #[tokio::test]
    async fn test_openai_terminal_usage_chunk() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":2,\"total_tokens\":7}}\n",
            "data: [DONE]\n",
        );
        let (tx, rx) = mpsc::channel(16);
        process_openai_stream(sse_response(body), tx).await.unwrap();

        let events = drain(rx).await;
        assert_eq!(events.len(), 3);
        assert_eq!(delta_text(&events[0]), "Hi");

        match &events[1] {
            StreamEvent::Chunk(chunk) => {
                assert!(chunk.delta.is_empty());
                assert_eq!(
                    chunk.usage,
                    Some(TokenUsage {
                        prompt_tokens: 5,
                        completion_tokens: 2,
                        total_tokens: 7,
                    })
                );
            }
            other => panic!("Expected usage chunk, got {:?}", other),
        }
        assert_done(&events[2]);
    }

    /// All frames unparseable and no [DONE] → StreamTruncated.
    #[tokio::test]
    async fn test_openai_truncated_all_parse_errors() {
        let body = "data: bad-json\ndata: also-bad\n";
        let (tx, rx) = mpsc::channel(16);
        let result = process_openai_stream(sse_response(body), tx).await;

        assert!(
            matches!(result, Err(KomittoError::StreamTruncated { ref provider, .. }) if provider == "OpenAI"),
            "Expected StreamTruncated, got {:?}",
            result
        );
        assert!(drain(rx).await.is_empty());
    }

    /// Clean EOF without [DONE] and zero parse errors → silent recovery.
    #[tokio::test]
    async fn test_openai_clean_truncation_sends_done() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n";
        let (tx, rx) = mpsc::channel(16);
        let result = process_openai_stream(sse_response(body), tx).await;

        assert!(result.is_ok());
        let events = drain(rx).await;
        assert_eq!(delta_text(&events[0]), "partial");
        assert_done(events.last().unwrap());
    }
}
