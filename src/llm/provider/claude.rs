use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::retry::{RetryPolicy, send_llm_request, send_llm_request_streaming};
use super::streaming::process_claude_stream;
use super::utils::{CLAUDE_API_SUFFIX, DEFAULT_CLAUDE_BASE, join_endpoint, mask_api_key};
use crate::config::{LlmConfig, NetworkConfig, ProviderKind};
use crate::error::{KomittoError, Result};
use crate::llm::{Completion, LlmClient, StreamEvent, StreamHandle, TokenUsage};

/// The messages API requires max_tokens; used when the config is silent.
const DEFAULT_MAX_TOKENS: u32 = 2000;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages-API client.
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    policy: RetryPolicy,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct MessagePayload {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    usage: Option<ClaudeUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Wire shape of Anthropic usage accounting; the API reports input and
/// output separately, so the total is derived.
#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl ClaudeUsage {
    fn normalize(self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.input_tokens,
            completion_tokens: self.output_tokens,
            total_tokens: self.input_tokens + self.output_tokens,
        }
    }
}

impl ClaudeClient {
    pub fn new(config: &LlmConfig, network: &NetworkConfig) -> Result<Self> {
        let api_key =
            super::resolve_api_key(config.api_key.as_deref(), &["ANTHROPIC_API_KEY"], "Anthropic")?;
        let endpoint = join_endpoint(
            config.endpoint.as_deref().unwrap_or(DEFAULT_CLAUDE_BASE),
            CLAUDE_API_SUFFIX,
        );
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| ProviderKind::Anthropic.default_model().to_string());

        tracing::debug!(
            "Anthropic client: endpoint={}, model={}, key={}",
            endpoint,
            model,
            mask_api_key(&api_key)
        );

        Ok(Self {
            client: super::create_http_client(network)?,
            api_key,
            endpoint,
            model,
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: config.temperature,
            policy: RetryPolicy::from(network),
        })
    }

    fn build_request(&self, prompt: &str, stream: bool) -> ClaudeRequest {
        ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![MessagePayload {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: stream.then_some(true),
        }
    }
}

#[async_trait]
impl LlmClient for ClaudeClient {
    async fn generate_commit_message(&self, prompt: &str) -> Result<Completion> {
        let request = self.build_request(prompt, false);

        tracing::debug!(
            "Anthropic API request: model={}, max_tokens={}, temperature={:?}, prompt_len={}",
            self.model,
            self.max_tokens,
            self.temperature,
            prompt.len()
        );

        let response: ClaudeResponse = send_llm_request(
            &self.client,
            &self.endpoint,
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", ANTHROPIC_VERSION),
            ],
            &request,
            "Anthropic",
            None,
            self.policy,
        )
        .await?;

        let message = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if message.is_empty() {
            return Err(KomittoError::EmptyResponse {
                provider: "Anthropic".to_string(),
            });
        }

        Ok(Completion {
            message,
            usage: response.usage.map(ClaudeUsage::normalize),
        })
    }

    async fn stream_commit_message(&self, prompt: &str) -> Result<StreamHandle> {
        let request = self.build_request(prompt, true);

        let response = send_llm_request_streaming(
            &self.client,
            &self.endpoint,
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", ANTHROPIC_VERSION),
            ],
            &request,
            "Anthropic",
            self.policy,
        )
        .await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let error_tx = tx.clone();
            if let Err(e) = process_claude_stream(response, tx).await {
                tracing::debug!("Anthropic stream processing failed: {}", e);
                let _ = error_tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        Ok(StreamHandle { receiver: rx })
    }

    fn name(&self) -> &str {
        "Anthropic"
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
