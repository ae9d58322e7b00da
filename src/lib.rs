//! # komitto
//!
//! CLI assistant that turns staged git changes into commit messages.
//!
//! komitto reads the staged diff and the recent commit history, builds
//! one prompt describing the change, and either copies that prompt to
//! the clipboard (no provider configured) or sends it to a configured
//! LLM backend — OpenAI, Gemini, or Anthropic — to generate a commit
//! message the user can accept, edit, regenerate, or cancel
//! interactively.
//!
//! ## Quick start
//! ```bash
//! # write the default config
//! komitto init
//!
//! # generate a message for staged changes, review interactively
//! git add .
//! komitto -i
//!
//! # attach free-form context
//! komitto -i fixes the flaky retry test
//!
//! # draft a style-guide system prompt from your history
//! komitto learn
//! ```
//!
//! ## As a library
//! ```ignore
//! use komitto::config::{LlmConfig, NetworkConfig};
//! use komitto::llm::provider::create_client;
//! use komitto::llm::prompt::build_prompt;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let llm = LlmConfig {
//!     provider: Some("openai".to_string()),
//!     api_key: Some("sk-...".to_string()),
//!     ..Default::default()
//! };
//! let client = create_client(&llm, &NetworkConfig::default())?;
//!
//! let prompt = build_prompt("You write commit messages.", None, "", "+new line");
//! let completion = client.generate_commit_message(&prompt).await?;
//! println!("{}", completion.message);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//! - [`git`] - version-control collaborator (staged diff, history, commit)
//! - [`llm`] - provider trait, implementations, streaming protocol
//! - [`commands`] - CLI flows (generate, init, learn) and the review loop
//! - [`config`] - configuration snapshot
//! - [`error`] - unified error type
//! - [`ui`] - terminal output, keypress menu, editor, clipboard
//!
//! ## Configuration
//! `~/.config/komitto/config.toml` (see `komitto init`):
//! ```toml
//! [llm]
//! provider = "gemini"
//! model = "gemini-2.0-flash"
//! history_limit = 5
//!
//! [prompt]
//! system = "..."
//! ```
//! Leave `[llm] provider` unset to skip the LLM entirely: the built
//! prompt is copied to the clipboard for pasting into any chat UI.

#[macro_use]
extern crate rust_i18n;

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod ui;

// Initialize i18n for library modules
i18n!("locales", fallback = "en");
