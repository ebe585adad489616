pub mod model;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

pub use model::{AppConfig, BotConfig, LoggingConfig, ServerConfig};

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crabbot")
        .join("config.toml")
}

/// Load and validate the configuration.
///
/// Uses `path` when given, otherwise `<config dir>/crabbot/config.toml`.
/// Any problem here is fatal: the bot never connects with a bad config.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    validate(&config)?;
    Ok(config)
}

/// Reject settings that deserialize fine but cannot work.
pub fn validate(config: &AppConfig) -> Result<()> {
    if config.server.host.trim().is_empty() {
        bail!("server.host must not be empty");
    }
    if config.server.port == 0 {
        bail!("server.port must not be 0");
    }
    if config.bot.nickname.trim().is_empty() || config.bot.nickname.contains(' ') {
        bail!("bot.nickname must be a single non-empty word");
    }
    if config.bot.command_prefix.is_empty() {
        bail!("bot.command_prefix must not be empty");
    }
    regex::Regex::new(&config.bot.admin_mask)
        .with_context(|| format!("bot.admin_mask is not a valid regex: {}", config.bot.admin_mask))?;
    Ok(())
}
