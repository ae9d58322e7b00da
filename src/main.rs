#[macro_use]
extern crate rust_i18n;

use komitto::*;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use cli::Cli;
use tokio::runtime::Runtime;

// Initialize i18n for the binary crate so translations resolve in
// main.rs context too
i18n!("locales", fallback = "en");

fn main() -> Result<()> {
    human_panic::setup_panic!();

    // Locale first, so even --help text is localized
    init_locale_early();

    let cli = parse_cli_localized()?;

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    // reqwest is built with rustls-no-provider; install the ring
    // provider before any client is constructed
    let _ = rustls::crypto::ring::default_provider().install_default();

    // `init` runs before any git/LLM work and must work even when the
    // existing config file is broken
    if special_command(&cli) == Some("init") {
        let config = config::load_config().unwrap_or_default();
        if let Err(e) = commands::init::run(config.ui.colored) {
            ui::error(&e.localized_message(), config.ui.colored);
            std::process::exit(1);
        }
        return Ok(());
    }

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            ui::error(&e.localized_message(), true);
            println!(
                "{}",
                ui::info(&rust_i18n::t!("config.check_file_hint"), true)
            );
            std::process::exit(1);
        }
    };

    let rt = Runtime::new()?;

    rt.block_on(async {
        let failed = if special_command(&cli) == Some("learn") {
            commands::learn::run(&config).await.is_err()
        } else {
            let options = commands::generate::GenerateOptions::from_cli(&cli);
            // Errors are already reported (with the fallback prompt
            // copy where one applies); only the exit status remains
            commands::generate::run(&options, &config).await.is_err()
        };

        if failed {
            std::process::exit(1);
        }
        Ok(())
    })
}

/// `init` and `learn` are commands only as the sole positional
/// argument; anywhere else they are ordinary context words.
fn special_command(cli: &Cli) -> Option<&str> {
    match cli.context.as_slice() {
        [only] if only == "init" || only == "learn" => Some(only.as_str()),
        _ => None,
    }
}

/// Parses CLI arguments with localized help text.
///
/// clap's derive handles the type-safe parsing; help strings are
/// overridden at runtime with the active locale.
fn parse_cli_localized() -> Result<Cli> {
    let cmd = Cli::command()
        .about(rust_i18n::t!("cli.about").to_string())
        .mut_arg("context", |arg| {
            arg.help(rust_i18n::t!("cli.context").to_string())
        })
        .mut_arg("interactive", |arg| {
            arg.help(rust_i18n::t!("cli.interactive").to_string())
        })
        .mut_arg("verbose", |arg| {
            arg.help(rust_i18n::t!("cli.verbose").to_string())
        });

    let matches = cmd.get_matches();
    Cli::from_arg_matches(&matches)
        .map_err(|e| anyhow::anyhow!("Failed to parse CLI arguments: {}", e))
}

/// Picks the UI locale.
///
/// Priority: `KOMITTO_UI_LANGUAGE`, config `ui.language`, system
/// locale, English.
fn init_locale_early() {
    let locale = std::env::var("KOMITTO_UI_LANGUAGE")
        .ok()
        .or_else(|| get_language_from_config().ok())
        .or_else(detect_system_locale)
        .unwrap_or_else(|| "en".to_string());

    rust_i18n::set_locale(&locale);
}

/// Lightweight read of `ui.language` alone, without loading or
/// validating the full configuration.
fn get_language_from_config() -> Result<String> {
    let config_path = config::get_config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if !config_path.exists() {
        return Err(anyhow::anyhow!("Config file not found"));
    }

    let content = std::fs::read_to_string(&config_path)?;
    let config: toml::Value = toml::from_str(&content)?;

    config
        .get("ui")
        .and_then(|ui| ui.get("language"))
        .and_then(|lang| lang.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("ui.language not found in config"))
}

/// System locale in BCP 47 form ("ja-JP", "en-US").
fn detect_system_locale() -> Option<String> {
    sys_locale::get_locale().map(|locale| locale.replace('_', "-"))
}
