//! `komitto learn`: analyzes recent commit messages and drafts a
//! repository-specific system prompt the user can paste into their
//! config.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{KomittoError, Result};
use crate::git::{GitOperations, repository::GitCli};
use crate::llm::prompt::build_style_analysis_prompt;
use crate::llm::{LlmClient, provider};
use crate::ui::{self, ClipboardSink, SystemClipboard};

/// How many commits feed the style analysis.
const LEARN_HISTORY_LIMIT: usize = 20;

pub async fn run(config: &AppConfig) -> Result<()> {
    let git = GitCli::new();
    let mut clipboard = SystemClipboard;
    run_with_deps(config, &git, &mut clipboard, provider::create_client).await
}

/// Testable entry point with injected collaborators.
pub async fn run_with_deps<F>(
    config: &AppConfig,
    git: &dyn GitOperations,
    clipboard: &mut dyn ClipboardSink,
    client_factory: F,
) -> Result<()>
where
    F: Fn(&crate::config::LlmConfig, &crate::config::NetworkConfig) -> Result<Arc<dyn LlmClient>>,
{
    let colored = config.ui.colored;

    // Style learning is meaningless without a model to ask
    if config.llm.provider.is_none() {
        ui::warning(&rust_i18n::t!("learn.no_provider"), colored);
        return Ok(());
    }

    let messages = git.commit_messages(LEARN_HISTORY_LIMIT)?;
    if messages.is_empty() {
        ui::warning(&rust_i18n::t!("learn.no_history"), colored);
        return Ok(());
    }

    let history_text = messages.join("\n---\n");
    let analysis_prompt = build_style_analysis_prompt(&history_text);

    let result = analyze(config, clipboard, &analysis_prompt, &messages, client_factory).await;
    if let Err(e) = &result {
        ui::error(&e.localized_message(), colored);
        if let Some(suggestion) = e.localized_suggestion() {
            println!();
            println!("{}", ui::info(&suggestion, colored));
        }
    }
    result
}

async fn analyze<F>(
    config: &AppConfig,
    clipboard: &mut dyn ClipboardSink,
    analysis_prompt: &str,
    messages: &[String],
    client_factory: F,
) -> Result<()>
where
    F: Fn(&crate::config::LlmConfig, &crate::config::NetworkConfig) -> Result<Arc<dyn LlmClient>>,
{
    let colored = config.ui.colored;
    let client = client_factory(&config.llm, &config.network)?;

    println!(
        "{}",
        ui::info(
            &rust_i18n::t!("learn.analyzing", count = messages.len()),
            colored
        )
    );

    let suggestion = if config.ui.streaming && client.supports_streaming() {
        println!();
        let handle = client.stream_commit_message(analysis_prompt).await?;
        let mut output = ui::StreamingOutput::new(colored);
        let (text, _) = output.process(handle.receiver).await?;
        text
    } else {
        let spinner = ui::Spinner::new(&rust_i18n::t!("learn.analyzing_status"));
        let completion = client.generate_commit_message(analysis_prompt).await?;
        spinner.finish_and_clear();
        ui::boxed(&completion.message, colored);
        completion.message
    };

    if suggestion.is_empty() {
        return Err(KomittoError::EmptyResponse {
            provider: client.name().to_string(),
        });
    }

    println!();
    ui::copy_or_echo(
        clipboard,
        &suggestion,
        &rust_i18n::t!("learn.copied"),
        colored,
    );

    println!();
    println!(
        "{}",
        ui::info(&rust_i18n::t!("learn.apply_title"), colored)
    );
    println!("{}", rust_i18n::t!("learn.apply_step1"));
    println!("{}", rust_i18n::t!("learn.apply_step2"));
    println!("{}", rust_i18n::t!("learn.apply_step3"));

    Ok(())
}
