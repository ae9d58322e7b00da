//! Strict gate check with mockall: when there are no staged changes,
//! nothing else is consulted — no history read, no client construction,
//! no clipboard write.

use std::sync::Arc;

use komitto::commands::generate::{GenerateOptions, run_with_deps};
use komitto::config::{AppConfig, LlmConfig, NetworkConfig};
use komitto::error::{KomittoError, Result};
use komitto::git::MockGitOperations;
use komitto::llm::LlmClient;
use komitto::ui::{ClipboardSink, ReviewKey};

struct RecordingClipboard(Vec<String>);

impl ClipboardSink for RecordingClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        self.0.push(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_no_staged_changes_touches_nothing_else() {
    let mut git = MockGitOperations::new();
    // Only the staged-diff probe may run; any other call panics
    // because no expectation is registered for it.
    git.expect_staged_diff()
        .times(1)
        .returning(|| Err(KomittoError::NoStagedChanges));

    let mut config = AppConfig::default();
    config.ui.colored = false;
    config.llm.provider = Some("openai".to_string());

    let mut clipboard = RecordingClipboard(vec![]);
    let factory = |_: &LlmConfig, _: &NetworkConfig| -> Result<Arc<dyn LlmClient>> {
        panic!("provider must not be contacted")
    };
    let read_key = || -> Result<ReviewKey> { panic!("nothing to present") };

    let options = GenerateOptions {
        context: String::new(),
        interactive: true,
        verbose: false,
    };

    let result = run_with_deps(&options, &config, &git, &mut clipboard, factory, read_key).await;

    assert!(matches!(result, Err(KomittoError::NoStagedChanges)));
    assert!(clipboard.0.is_empty());
}
