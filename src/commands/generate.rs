//! The main flow: staged diff + history + context → built prompt →
//! clipboard (no provider) or the interactive review loop.

use std::sync::Arc;

use colored::Colorize;

use crate::cli::Cli;
use crate::commands::review_state_machine::{ReviewAction, ReviewState};
use crate::config::AppConfig;
use crate::error::{KomittoError, Result};
use crate::git::{GitOperations, repository::GitCli};
use crate::llm::prompt::build_prompt;
use crate::llm::{LlmClient, TokenUsage, provider};
use crate::ui::{self, ClipboardSink, ReviewKey, SystemClipboard};

/// Arguments relevant to the generate flow.
pub struct GenerateOptions {
    /// Free-form user annotation, already joined with spaces.
    pub context: String,
    /// Whether the review loop runs (otherwise: single attempt + copy).
    pub interactive: bool,
    pub verbose: bool,
}

impl GenerateOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            context: cli.context.join(" "),
            interactive: cli.interactive,
            verbose: cli.verbose,
        }
    }
}

pub async fn run(options: &GenerateOptions, config: &AppConfig) -> Result<()> {
    let git = GitCli::new();
    let mut clipboard = SystemClipboard;
    run_with_deps(
        options,
        config,
        &git,
        &mut clipboard,
        provider::create_client,
        ui::read_review_key,
    )
    .await
}

/// Testable entry point: the git collaborator, clipboard sink, client
/// factory, and keypress source are all injected.
///
/// Errors are fully reported here (message, suggestion, fallback copy);
/// the returned `Err` only carries the non-success status to `main`.
pub async fn run_with_deps<F, K>(
    options: &GenerateOptions,
    config: &AppConfig,
    git: &dyn GitOperations,
    clipboard: &mut dyn ClipboardSink,
    client_factory: F,
    read_key: K,
) -> Result<()>
where
    F: Fn(&crate::config::LlmConfig, &crate::config::NetworkConfig) -> Result<Arc<dyn LlmClient>>,
    K: FnMut() -> Result<ReviewKey>,
{
    let colored = config.ui.colored;

    // Repository and staged-changes failures are fatal: there is
    // nothing to build a prompt from, so no fallback exists.
    let diff = match git.staged_diff() {
        Ok(diff) => diff,
        Err(e) => {
            report_error(&e, colored);
            return Err(e);
        }
    };

    let history = git.recent_log(config.llm.history_limit)?;
    let built_prompt = build_prompt(
        &config.prompt.system,
        history.as_deref(),
        &options.context,
        &diff,
    );

    if options.verbose {
        println!("\n{}", "=== Built prompt ===".cyan().bold());
        println!("{}", built_prompt);
        println!("{}\n", "====================".cyan().bold());
    }

    // No provider configured: the built prompt itself is the product.
    if config.llm.provider.is_none() {
        tracing::debug!("no LLM provider configured, copying built prompt");
        ui::copy_or_echo(
            clipboard,
            &built_prompt,
            &rust_i18n::t!("generate.prompt_copied"),
            colored,
        );
        if !options.context.is_empty() {
            println!(
                "{}",
                ui::info(
                    &rust_i18n::t!(
                        "generate.context_attached",
                        context = options.context.as_str()
                    ),
                    colored
                )
            );
        }
        return Ok(());
    }

    match provider_flow(options, config, git, clipboard, &built_prompt, client_factory, read_key)
        .await
    {
        Ok(()) => Ok(()),
        Err(KomittoError::UserCancelled) => {
            ui::warning(&rust_i18n::t!("generate.cancelled"), colored);
            Err(KomittoError::UserCancelled)
        }
        // Provider and configuration failures never lose the user's
        // work: the raw built prompt goes to the clipboard instead.
        Err(e) if matches!(e, KomittoError::Config(_)) || e.is_generation_failure() => {
            report_error(&e, colored);
            ui::warning(&rust_i18n::t!("generate.fallback_copy"), colored);
            ui::copy_or_echo(
                clipboard,
                &built_prompt,
                &rust_i18n::t!("generate.prompt_copied"),
                colored,
            );
            Err(e)
        }
        Err(e) => {
            report_error(&e, colored);
            Err(e)
        }
    }
}

async fn provider_flow<F, K>(
    options: &GenerateOptions,
    config: &AppConfig,
    git: &dyn GitOperations,
    clipboard: &mut dyn ClipboardSink,
    built_prompt: &str,
    client_factory: F,
    mut read_key: K,
) -> Result<()>
where
    F: Fn(&crate::config::LlmConfig, &crate::config::NetworkConfig) -> Result<Arc<dyn LlmClient>>,
    K: FnMut() -> Result<ReviewKey>,
{
    let colored = config.ui.colored;
    let client = client_factory(&config.llm, &config.network)?;

    if !options.interactive {
        let (message, usage, displayed) =
            generate_candidate(&client, built_prompt, config, 0).await?;
        if !displayed {
            ui::boxed(&message, colored);
        }
        ui::display_usage(usage.as_ref(), colored);
        ui::copy_or_echo(
            clipboard,
            &message,
            &rust_i18n::t!("generate.message_copied"),
            colored,
        );
        return Ok(());
    }

    let mut state = ReviewState::Generating { attempt: 0 };

    loop {
        state = match state {
            ReviewState::Generating { attempt } => {
                let (message, usage, displayed) =
                    generate_candidate(&client, built_prompt, config, attempt).await?;
                if !displayed {
                    ui::boxed(&message, colored);
                }
                ui::display_usage(usage.as_ref(), colored);
                ReviewState::Generating { attempt }.handle_generation(message)?
            }

            ReviewState::Presenting { message, attempt } => {
                let action = match read_key()? {
                    ReviewKey::Accept => ReviewAction::Accept,

                    ReviewKey::Edit => match ui::edit_text(&message) {
                        Ok(edited) => {
                            let edited = edited.trim_end().to_string();
                            ui::boxed(&edited, colored);
                            ReviewAction::Edit {
                                new_message: edited,
                            }
                        }
                        Err(KomittoError::UserCancelled) => {
                            ui::warning(&rust_i18n::t!("review.edit_cancelled"), colored);
                            ReviewAction::EditCancelled
                        }
                        // An abnormal editor exit cancels the edit; the
                        // prior candidate stays intact.
                        Err(KomittoError::Editor(e)) => {
                            ui::warning(&rust_i18n::t!("review.edit_failed", error = e), colored);
                            ReviewAction::EditCancelled
                        }
                        Err(e) => return Err(e),
                    },

                    ReviewKey::Regenerate => ReviewAction::Regenerate,

                    ReviewKey::Cancel => ReviewAction::Cancel,
                };

                ReviewState::Presenting { message, attempt }.handle_action(action)
            }

            ReviewState::Accepted { message } => {
                // Clipboard first (best-effort), then the commit; the
                // two outcomes are reported separately.
                ui::copy_or_echo(
                    clipboard,
                    &message,
                    &rust_i18n::t!("generate.message_copied"),
                    colored,
                );
                match git.commit(&message) {
                    Ok(()) => ui::success(&rust_i18n::t!("generate.commit_created"), colored),
                    Err(e) => ui::error(
                        &rust_i18n::t!("generate.commit_failed", error = e.to_string()),
                        colored,
                    ),
                }
                return Ok(());
            }

            ReviewState::Cancelled => return Err(KomittoError::UserCancelled),
        };
    }
}

/// Runs one generation attempt.
///
/// Returns `(message, usage, already_displayed)`: the streaming path
/// has already echoed the text chunk-by-chunk, the one-shot path has
/// not.
async fn generate_candidate(
    client: &Arc<dyn LlmClient>,
    built_prompt: &str,
    config: &AppConfig,
    attempt: usize,
) -> Result<(String, Option<TokenUsage>, bool)> {
    let colored = config.ui.colored;
    let use_streaming = config.ui.streaming && client.supports_streaming();

    let status = if attempt == 0 {
        rust_i18n::t!("generate.generating").to_string()
    } else {
        rust_i18n::t!("generate.regenerating").to_string()
    };

    if use_streaming {
        println!("{}", ui::info(&status, colored));
        println!("\n{}", ui::info(&message_header(attempt), colored));

        let handle = client.stream_commit_message(built_prompt).await?;
        let mut output = ui::StreamingOutput::new(colored);
        let (message, usage) = output.process(handle.receiver).await?;

        if message.is_empty() {
            return Err(KomittoError::EmptyResponse {
                provider: client.name().to_string(),
            });
        }

        Ok((message, usage, true))
    } else {
        let spinner = ui::Spinner::new(&status);
        let completion = client.generate_commit_message(built_prompt).await?;
        spinner.finish_and_clear();

        println!("{}", ui::info(&message_header(attempt), colored));
        Ok((completion.message, completion.usage, false))
    }
}

fn message_header(attempt: usize) -> String {
    if attempt == 0 {
        rust_i18n::t!("generate.generated_header").to_string()
    } else {
        rust_i18n::t!("generate.regenerated_header", attempt = attempt + 1).to_string()
    }
}

fn report_error(e: &KomittoError, colored: bool) {
    ui::error(&e.localized_message(), colored);
    if let Some(suggestion) = e.localized_suggestion() {
        println!();
        println!("{}", ui::info(&suggestion, colored));
    }
}
