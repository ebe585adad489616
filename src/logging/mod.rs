//! Diagnostic tracing setup and the chat audit log.
//!
//! Diagnostics go through `tracing` to stderr. Separately, every chat message
//! the bot sees and every command handler it loads is appended to an audit
//! log file as a timestamped line (`2024-05-01 12:00:00 - ...`).

use crate::app::state::ChatRecord;
use crate::config::LoggingConfig;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Appends audit lines to the configured log file.
///
/// Falls back to discarding output if the file cannot be opened, so a bad
/// log path never stops the bot.
pub struct ChatLogger {
    sink: Box<dyn Write + Send>,
}

impl ChatLogger {
    pub fn new(config: &LoggingConfig) -> Self {
        let path = expand_home(&config.log_file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Self::from_writer(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot open audit log, discarding entries");
                Self::from_writer(io::sink())
            }
        }
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Box::new(writer),
        }
    }

    /// Record one chat message. Called for every PRIVMSG, command or not.
    pub fn log_chat(&mut self, record: &ChatRecord) {
        self.log_event(&format!(
            "[{}] <{}> ({}) {}",
            record.channel, record.sender, record.origin, record.text
        ));
    }

    pub fn log_event(&mut self, text: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(e) = writeln!(self.sink, "{} - {}", timestamp, text).and_then(|_| self.sink.flush())
        {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
