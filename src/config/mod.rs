pub mod schema;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use std::path::PathBuf;

use crate::error::Result;
pub use schema::*;

/// Loads the application configuration.
///
/// Priority, highest first:
/// 1. Environment variables (`KOMITTO__*`, `__` separates nesting)
///    - e.g. `KOMITTO__LLM__PROVIDER=openai`
///    - e.g. `KOMITTO__UI__COLORED=false`
/// 2. Config file (`~/.config/komitto/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(config_path) = get_config_path()
        && config_path.exists()
    {
        builder = builder.add_source(File::from(config_path));
    }

    builder = builder.add_source(
        Environment::with_prefix("KOMITTO")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}

/// Path of the config file (`<config dir>/config.toml`).
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Platform config directory for komitto.
pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "komitto").map(|dirs| dirs.config_dir().to_path_buf())
}
