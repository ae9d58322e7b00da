use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::retry::{RetryPolicy, send_llm_request, send_llm_request_streaming};
use super::streaming::process_openai_stream;
use super::utils::{DEFAULT_OPENAI_BASE, OPENAI_API_SUFFIX, join_endpoint, mask_api_key};
use crate::config::{LlmConfig, NetworkConfig, ProviderKind};
use crate::error::{KomittoError, Result};
use crate::llm::{Completion, LlmClient, StreamEvent, StreamHandle, TokenUsage};

/// OpenAI-compatible chat-completions client.
///
/// Works against api.openai.com and any endpoint speaking the same
/// protocol (set `llm.endpoint` to point elsewhere).
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    policy: RetryPolicy,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Serialize)]
struct MessagePayload {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Wire shape of OpenAI usage accounting; already matches the
/// canonical field names.
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl OpenAiUsage {
    pub(crate) fn normalize(self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
        }
    }
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, network: &NetworkConfig) -> Result<Self> {
        let api_key =
            super::resolve_api_key(config.api_key.as_deref(), &["OPENAI_API_KEY"], "OpenAI")?;
        let endpoint = join_endpoint(
            config.endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_BASE),
            OPENAI_API_SUFFIX,
        );
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| ProviderKind::OpenAi.default_model().to_string());

        tracing::debug!(
            "OpenAI client: endpoint={}, model={}, key={}",
            endpoint,
            model,
            mask_api_key(&api_key)
        );

        Ok(Self {
            client: super::create_http_client(network)?,
            api_key,
            endpoint,
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            policy: RetryPolicy::from(network),
        })
    }

    fn build_request(&self, prompt: &str, stream: bool) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: vec![MessagePayload {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: stream.then_some(true),
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate_commit_message(&self, prompt: &str) -> Result<Completion> {
        let request = self.build_request(prompt, false);

        tracing::debug!(
            "OpenAI API request: model={}, temperature={:?}, max_tokens={:?}, prompt_len={}",
            self.model,
            self.temperature,
            self.max_tokens,
            prompt.len()
        );

        let auth = self.auth_header();
        let response: OpenAiResponse = send_llm_request(
            &self.client,
            &self.endpoint,
            &[("Authorization", auth.as_str())],
            &request,
            "OpenAI",
            None,
            self.policy,
        )
        .await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        if message.is_empty() {
            return Err(KomittoError::EmptyResponse {
                provider: "OpenAI".to_string(),
            });
        }

        Ok(Completion {
            message,
            usage: response.usage.map(OpenAiUsage::normalize),
        })
    }

    async fn stream_commit_message(&self, prompt: &str) -> Result<StreamHandle> {
        let request = self.build_request(prompt, true);
        let auth = self.auth_header();

        let response = send_llm_request_streaming(
            &self.client,
            &self.endpoint,
            &[("Authorization", auth.as_str())],
            &request,
            "OpenAI",
            self.policy,
        )
        .await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let error_tx = tx.clone();
            if let Err(e) = process_openai_stream(response, tx).await {
                tracing::debug!("OpenAI stream processing failed: {}", e);
                let _ = error_tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        Ok(StreamHandle { receiver: rx })
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
