use futures_util::StreamExt;
use reqwest::Response;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::parse_sse_line;
use crate::error::{KomittoError, Result};
use crate::llm::provider::gemini::GeminiUsageMetadata;
use crate::llm::{StreamChunk, StreamEvent};

/// One Gemini streaming frame (with `?alt=sse`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamFrame {
    candidates: Option<Vec<GeminiStreamCandidate>>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamCandidate {
    content: Option<GeminiStreamContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiStreamContent {
    parts: Option<Vec<GeminiStreamPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiStreamPart {
    text: Option<String>,
}

/// Consumes a Gemini SSE stream.
///
/// Gemini repeats `usageMetadata` on frames as counts grow; only the
/// last-seen value is forwarded, as a single usage chunk emitted when
/// the terminal `finishReason` arrives.
///
/// ```text
/// data: {"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"}}]}
///
/// data: {"candidates":[{"content":{"parts":[{"text":" world"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":20,"totalTokenCount":30}}
/// ```
pub async fn process_gemini_stream(
    response: Response,
    tx: mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut parse_errors = 0usize;
    let mut last_usage: Option<GeminiUsageMetadata> = None;

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
                match serde_json::from_str::<GeminiStreamFrame>(data) {
                    Ok(frame) => {
                        if let Some(usage) = frame.usage_metadata {
                            last_usage = Some(usage);
                        }

                        if let Some(candidates) = &frame.candidates
                            && let Some(candidate) = candidates.first()
                        {
                            if let Some(content) = &candidate.content
                                && let Some(parts) = &content.parts
                            {
                                for part in parts {
                                    if let Some(text) = &part.text
                                        && !text.is_empty()
                                    {
                                        let _ = tx
                                            .send(StreamEvent::Chunk(StreamChunk::delta(
                                                text.clone(),
                                            )))
                                            .await;
                                    }
                                }
                            }

                            // Any finishReason marks the end of the stream
                            if let Some(reason) = &candidate.finish_reason {
                                if reason != "STOP" && reason != "MAX_TOKENS" {
                                    // SAFETY / RECITATION / OTHER, matching
                                    // the non-streaming path
                                    return Err(KomittoError::Llm(format!(
                                        "Gemini blocked the response (finishReason: {})",
                                        reason
                                    )));
                                }
                                if reason == "MAX_TOKENS" {
                                    tracing::warn!("Gemini stream truncated (MAX_TOKENS)");
                                }
                                if parse_errors > 0 {
                                    tracing::warn!(
                                        "Gemini stream had {} unparseable frames",
                                        parse_errors
                                    );
                                }
                                if let Some(usage) = last_usage {
                                    let _ = tx
                                        .send(StreamEvent::Chunk(StreamChunk::usage(
                                            usage.normalize(),
                                        )))
                                        .await;
                                }
                                let _ = tx.send(StreamEvent::Done).await;
                                return Ok(());
                            }
                        }
                    }
                    Err(e) => {
                        parse_errors += 1;
                        tracing::warn!("Failed to parse Gemini SSE data: {}, line: {}", e, data);
                    }
                }
            }
        }
    }

    // Stream ended without a terminal finishReason
    if parse_errors > 0 {
        tracing::warn!("Gemini stream had {} unparseable frames", parse_errors);
    }
    if let Some(usage) = last_usage {
        let _ = tx
            .send(StreamEvent::Chunk(StreamChunk::usage(usage.normalize())))
            .await;
    }
    let _ = tx.send(StreamEvent::Done).await;
    Ok(())
}
