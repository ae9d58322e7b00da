use futures_util::StreamExt;
use reqwest::Response;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::{KomittoError, Result};
use crate::llm::{StreamChunk, StreamEvent, TokenUsage};

/// Anthropic SSE event, discriminated by its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeSseEvent {
    #[serde(rename = "message_start")]
    MessageStart { message: MessageStart },
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: ClaudeTextDelta },
    #[serde(rename = "message_delta")]
    MessageDelta { usage: Option<MessageDeltaUsage> },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageStart {
    usage: Option<MessageStartUsage>,
}

#[derive(Debug, Deserialize)]
struct MessageStartUsage {
    #[serde(default)]
    input_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaUsage {
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeTextDelta {
    #[serde(rename = "type")]
    delta_type: String,
    #[serde(default)]
    text: String,
}

/// Consumes an Anthropic SSE stream.
///
/// Input tokens arrive on `message_start`, output tokens on the final
/// `message_delta`; the two are combined into one usage chunk emitted
/// just before `Done` when `message_stop` arrives.
///
/// ```text
/// event: message_start
/// data: {"type":"message_start","message":{"usage":{"input_tokens":10}}}
///
/// event: content_block_delta
/// data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}
///
/// event: message_delta
/// data: {"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":20}}
///
/// event: message_stop
/// data: {"type":"message_stop"}
/// ```
pub async fn process_claude_stream(
    response: Response,
    tx: mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut parse_errors = 0usize;
    let mut input_tokens: Option<u32> = None;
    let mut output_tokens: Option<u32> = None;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(KomittoError::Network)?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        // Anthropic delimits event blocks with blank lines
        while let Some(pos) = buffer.find("\n\n") {
            let event_block = buffer[..pos].to_string();
            buffer = buffer[pos + 2..].to_string();

            for line in event_block.lines() {
                if let Some(data) = line.strip_prefix("data: ") {
                    match serde_json::from_str::<ClaudeSseEvent>(data) {
                        Ok(ClaudeSseEvent::MessageStart { message }) => {
                            input_tokens = message.usage.map(|u| u.input_tokens);
                        }
                        Ok(ClaudeSseEvent::ContentBlockDelta { delta }) => {
                            if delta.delta_type == "text_delta" && !delta.text.is_empty() {
                                let _ = tx
                                    .send(StreamEvent::Chunk(StreamChunk::delta(delta.text)))
                                    .await;
                            }
                        }
                        Ok(ClaudeSseEvent::MessageDelta { usage }) => {
                            if let Some(u) = usage {
                                output_tokens = Some(u.output_tokens);
                            }
                        }
                        Ok(ClaudeSseEvent::MessageStop) => {
                            if parse_errors > 0 {
                                tracing::warn!(
                                    "Anthropic stream had {} unparseable frames",
                                    parse_errors
                                );
                            }
                            if input_tokens.is_some() || output_tokens.is_some() {
                                let prompt = input_tokens.unwrap_or(0);
                                let completion = output_tokens.unwrap_or(0);
                                let usage = TokenUsage {
                                    prompt_tokens: prompt,
                                    completion_tokens: completion,
                                    total_tokens: prompt + completion,
                                };
                                let _ =
                                    tx.send(StreamEvent::Chunk(StreamChunk::usage(usage))).await;
                            }
                            let _ = tx.send(StreamEvent::Done).await;
                            return Ok(());
                        }
                        Ok(ClaudeSseEvent::Other) => {}
                        Err(e) => {
                            parse_errors += 1;
                            tracing::warn!(
                                "Failed to parse Anthropic SSE data: {}, line: {}",
                                e,
                                data
                            );
                        }
                    }
                }
            }
        }
    }

    // Stream ended without message_stop
    let detail = if parse_errors > 0 {
        format!("{} unparseable frames and no message_stop", parse_errors)
    } else {
        "stream ended without message_stop".to_string()
    };
    Err(KomittoError::StreamTruncated {
        provider: "Anthropic".to_string(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

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

    #[test]
    fn test_claude_sse_event_parse() {
        let delta_json =
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        let event: ClaudeSseEvent = serde_json::from_str(delta_json).unwrap();
        match event {
            ClaudeSseEvent::ContentBlockDelta { delta } => {
                assert_eq!(delta.delta_type, "text_delta");
                assert_eq!(delta.text, "Hi");
            }
            _ => panic!("unexpected event: {:?}", event),
        }

        let stop_json = r#"{"type":"message_stop"}"#;
        let event: ClaudeSseEvent = serde_json::from_str(stop_json).unwrap();
        assert!(matches!(event, ClaudeSseEvent::MessageStop));
    }

    #[tokio::test]
    async fn test_claude_deltas_and_usage() {
        let body = concat!(
            "data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":10}}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}\n\n",
            "data: {\"type\":\"message_delta\",\"usage\":{\"output_tokens\":20}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let (tx, rx) = mpsc::channel(16);
        process_claude_stream(sse_response(body), tx).await.unwrap();

        let events = drain(rx).await;
        assert_eq!(events.len(), 4);
        assert_eq!(delta_text(&events[0]), "Hello");
        assert_eq!(delta_text(&events[1]), " world");

        match &events[2] {
            StreamEvent::Chunk(chunk) => {
                assert!(chunk.delta.is_empty());
                assert_eq!(
                    chunk.usage,
                    Some(TokenUsage {
                        prompt_tokens: 10,
                        completion_tokens: 20,
                        total_tokens: 30,
                    })
                );
            }
            other => panic!("Expected usage chunk, got {:?}", other),
        }
        assert!(matches!(events[3], StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_claude_no_usage_no_usage_chunk() {
        let body = concat!(
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let (tx, rx) = mpsc::channel(16);
        process_claude_stream(sse_response(body), tx).await.unwrap();

        let events = drain(rx).await;
        assert_eq!(events.len(), 2);
        assert_eq!(delta_text(&events[0]), "Hi");
        assert!(matches!(events[1], StreamEvent::Done));
    }

    /// Deltas but no message_stop → StreamTruncated; delivered text stays.
    #[tokio::test]
    async fn test_claude_truncated_without_stop() {
        let body = "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}\n\n";
        let (tx, rx) = mpsc::channel(16);
        let result = process_claude_stream(sse_response(body), tx).await;

        assert!(
            matches!(result, Err(KomittoError::StreamTruncated { ref provider, .. }) if provider == "Anthropic"),
            "Expected StreamTruncated, got {:?}",
            result
        );
        let events = drain(rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(delta_text(&events[0]), "partial");
    }

    #[tokio::test]
    async fn test_claude_empty_stream_truncated() {
        let (tx, rx) = mpsc::channel(16);
        let result = process_claude_stream(sse_response(""), tx).await;

        assert!(matches!(
            result,
            Err(KomittoError::StreamTruncated { .. })
        ));
        assert!(drain(rx).await.is_empty());
    }
}
