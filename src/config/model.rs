//! Configuration data model.
//!
//! Structs derive `Deserialize` for TOML loading. Only connection identity is
//! required; everything else has a default.

use serde::Deserialize;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server to connect to.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address of the IRC server.
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    /// Skip TLS peer certificate verification. Only for self-signed test
    /// servers: anyone on the path can impersonate the server when set.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default)]
    pub password: Option<String>,
}

impl ServerConfig {
    /// Server password, treating an empty string as unset.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// Bot identity and command settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub nickname: String,
    pub realname: String,
    /// Channel joined automatically after the welcome reply.
    #[serde(default)]
    pub default_channel: Option<String>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Regex matched against a message origin to flag administrators.
    #[serde(default = "default_admin_mask")]
    pub admin_mask: String,
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

impl BotConfig {
    /// Default channel, treating an empty string as unset.
    pub fn default_channel(&self) -> Option<&str> {
        self.default_channel.as_deref().filter(|c| !c.is_empty())
    }
}

/// Diagnostic and audit logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Audit log of chat messages and command loads. `~` is expanded.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            level: default_level(),
        }
    }
}

fn default_port() -> u16 {
    6697
}
fn default_true() -> bool {
    true
}
fn default_command_prefix() -> String {
    "!".to_string()
}
fn default_admin_mask() -> String {
    r"@op\.[a-zA-Z0-9.-]+$".to_string()
}
fn default_quit_message() -> String {
    "Terminated".to_string()
}
fn default_log_file() -> String {
    "bot.log".to_string()
}
fn default_level() -> String {
    "info".to_string()
}
