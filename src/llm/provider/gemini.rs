use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::retry::{RetryPolicy, send_llm_request, send_llm_request_streaming};
use super::streaming::process_gemini_stream;
use super::utils::{DEFAULT_GEMINI_BASE, mask_api_key};
use crate::config::{LlmConfig, NetworkConfig, ProviderKind};
use crate::error::{KomittoError, Result};
use crate::llm::{Completion, LlmClient, StreamEvent, StreamHandle, TokenUsage};

/// Google Gemini client (generateContent API).
///
/// The API key falls back from the config to `GEMINI_API_KEY`, then
/// `GOOGLE_API_KEY`.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
    policy: RetryPolicy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: String,
}

/// Wire shape of Gemini usage accounting (`usageMetadata`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiUsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

impl GeminiUsageMetadata {
    pub(crate) fn normalize(self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_token_count,
            completion_tokens: self.candidates_token_count,
            total_tokens: self.total_token_count,
        }
    }
}

impl GeminiClient {
    pub fn new(config: &LlmConfig, network: &NetworkConfig) -> Result<Self> {
        let api_key = super::resolve_api_key(
            config.api_key.as_deref(),
            &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            "Gemini",
        )?;
        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE)
            .trim_end_matches('/')
            .to_string();
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| ProviderKind::Gemini.default_model().to_string());

        tracing::debug!(
            "Gemini client: base_url={}, model={}, key={}",
            base_url,
            model,
            mask_api_key(&api_key)
        );

        Ok(Self {
            client: super::create_http_client(network)?,
            api_key,
            base_url,
            model,
            max_output_tokens: config.max_tokens,
            temperature: config.temperature,
            policy: RetryPolicy::from(network),
        })
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn stream_generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_commit_message(&self, prompt: &str) -> Result<Completion> {
        let request = self.build_request(prompt);

        tracing::debug!(
            "Gemini API request: model={}, temperature={:?}, max_output_tokens={:?}, prompt_len={}",
            self.model,
            self.temperature,
            self.max_output_tokens,
            prompt.len()
        );

        let endpoint = self.generate_content_url();
        let response: GeminiResponse = send_llm_request(
            &self.client,
            &endpoint,
            &[("x-goog-api-key", self.api_key.as_str())],
            &request,
            "Gemini",
            None,
            self.policy,
        )
        .await?;

        let usage = response.usage_metadata.map(GeminiUsageMetadata::normalize);

        let candidate = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| KomittoError::EmptyResponse {
                provider: "Gemini".to_string(),
            })?;

        // Non-STOP finish reasons (SAFETY, RECITATION, ...) mean the
        // backend withheld the content
        if let Some(reason) = &candidate.finish_reason {
            match reason.as_str() {
                "STOP" => {}
                "MAX_TOKENS" => {
                    tracing::warn!("Gemini response truncated (MAX_TOKENS)");
                }
                _ => {
                    return Err(KomittoError::Llm(format!(
                        "Gemini blocked the response (finishReason: {})",
                        reason
                    )));
                }
            }
        }

        let message = candidate
            .content
            .and_then(|c| c.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
            .trim()
            .to_string();

        if message.is_empty() {
            return Err(KomittoError::EmptyResponse {
                provider: "Gemini".to_string(),
            });
        }

        Ok(Completion { message, usage })
    }

    async fn stream_commit_message(&self, prompt: &str) -> Result<StreamHandle> {
        let request = self.build_request(prompt);
        let endpoint = self.stream_generate_content_url();

        tracing::debug!(
            "Gemini streaming request: model={}, prompt_len={}",
            self.model,
            prompt.len()
        );

        let response = send_llm_request_streaming(
            &self.client,
            &endpoint,
            &[("x-goog-api-key", self.api_key.as_str())],
            &request,
            "Gemini",
            self.policy,
        )
        .await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let error_tx = tx.clone();
            if let Err(e) = process_gemini_stream(response, tx).await {
                tracing::debug!("Gemini stream processing failed: {}", e);
                let _ = error_tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        Ok(StreamHandle { receiver: rx })
    }

    fn name(&self) -> &str {
        "Gemini"
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
