use std::fs;

use crate::config;
use crate::error::{KomittoError, Result};
use crate::ui;

/// Writes the default configuration file and exits before any git or
/// LLM work happens.
pub fn run(colored: bool) -> Result<()> {
    let config_dir = config::get_config_dir()
        .ok_or_else(|| KomittoError::Config("Failed to determine config directory".to_string()))?;

    let config_file = config_dir.join("config.toml");

    if config_file.exists() {
        ui::warning(
            &rust_i18n::t!("init.exists", path = config_file.display()),
            colored,
        );
        println!();
        println!("{}", rust_i18n::t!("init.edit_hint"));
        return Ok(());
    }

    fs::create_dir_all(&config_dir)?;

    let example_config = include_str!("../../config.toml.example");
    fs::write(&config_file, example_config)?;
    ui::success(
        &rust_i18n::t!("init.file_created", path = config_file.display()),
        colored,
    );

    // The file may hold an API key; keep it owner-readable only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&config_file)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&config_file, perms)?;
    }

    println!();
    println!("{}", ui::info(&rust_i18n::t!("init.next_steps"), colored));
    println!("{}", rust_i18n::t!("init.step1"));
    println!("{}", rust_i18n::t!("init.step2"));
    println!("{}", rust_i18n::t!("init.step3"));

    Ok(())
}
