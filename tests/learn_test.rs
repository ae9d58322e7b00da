//! Tests of the `learn` flow with mocked collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use komitto::commands::learn::run_with_deps;
use komitto::config::{AppConfig, LlmConfig, NetworkConfig};
use komitto::error::Result;
use komitto::git::GitOperations;
use komitto::llm::{Completion, LlmClient, StreamChunk, StreamEvent, StreamHandle};
use komitto::ui::ClipboardSink;

struct HistoryOnlyGit {
    messages: Vec<String>,
}

impl GitOperations for HistoryOnlyGit {
    fn staged_diff(&self) -> Result<String> {
        panic!("learn must not read the staged diff");
    }

    fn recent_log(&self, _limit: usize) -> Result<Option<String>> {
        panic!("learn must not read the formatted log");
    }

    fn commit_messages(&self, _limit: usize) -> Result<Vec<String>> {
        Ok(self.messages.clone())
    }

    fn commit(&self, _message: &str) -> Result<()> {
        panic!("learn must not commit");
    }
}

struct SuggestingClient {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmClient for SuggestingClient {
    async fn generate_commit_message(&self, prompt: &str) -> Result<Completion> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Completion {
            message: "You write feat/fix-prefixed messages in English.".to_string(),
            usage: None,
        })
    }

    async fn stream_commit_message(&self, prompt: &str) -> Result<StreamHandle> {
        let completion = self.generate_commit_message(prompt).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(StreamEvent::Chunk(StreamChunk::delta(completion.message)))
            .await
            .ok();
        tx.send(StreamEvent::Done).await.ok();
        Ok(StreamHandle { receiver: rx })
    }

    fn name(&self) -> &str {
        "Suggesting"
    }
}

#[derive(Default)]
struct RecordingClipboard(Vec<String>);

impl ClipboardSink for RecordingClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        self.0.push(text.to_string());
        Ok(())
    }
}

fn test_config(provider: Option<&str>) -> AppConfig {
    let mut config = AppConfig::default();
    config.llm.provider = provider.map(str::to_string);
    config.ui.colored = false;
    config.ui.streaming = false;
    config
}

#[tokio::test]
async fn test_learn_copies_suggestion_built_from_history() {
    let git = HistoryOnlyGit {
        messages: vec!["feat: add login".to_string(), "fix: retry loop".to_string()],
    };
    let client = Arc::new(SuggestingClient {
        prompts: Mutex::new(vec![]),
    });
    let mut clipboard = RecordingClipboard::default();

    let factory_client = client.clone();
    let result = run_with_deps(
        &test_config(Some("openai")),
        &git,
        &mut clipboard,
        move |_: &LlmConfig, _: &NetworkConfig| -> Result<Arc<dyn LlmClient>> {
            Ok(factory_client.clone())
        },
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        clipboard.0,
        vec!["You write feat/fix-prefixed messages in English.".to_string()]
    );

    // The analysis prompt embeds the history, newest first, joined by rules
    let prompts = client.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("feat: add login\n---\nfix: retry loop"));
}

#[tokio::test]
async fn test_learn_without_provider_is_a_noop() {
    let git = HistoryOnlyGit {
        messages: vec!["feat: anything".to_string()],
    };
    let mut clipboard = RecordingClipboard::default();

    let result = run_with_deps(
        &test_config(None),
        &git,
        &mut clipboard,
        |_: &LlmConfig, _: &NetworkConfig| -> Result<Arc<dyn LlmClient>> {
            panic!("no client without a provider")
        },
    )
    .await;

    assert!(result.is_ok());
    assert!(clipboard.0.is_empty());
}

#[tokio::test]
async fn test_learn_with_empty_history_is_a_noop() {
    let git = HistoryOnlyGit { messages: vec![] };
    let mut clipboard = RecordingClipboard::default();

    let result = run_with_deps(
        &test_config(Some("openai")),
        &git,
        &mut clipboard,
        |_: &LlmConfig, _: &NetworkConfig| -> Result<Arc<dyn LlmClient>> {
            panic!("no client without history")
        },
    )
    .await;

    assert!(result.is_ok());
    assert!(clipboard.0.is_empty());
}
