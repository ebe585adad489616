//! Built-in chat commands.
//!
//! Commands are listed explicitly in [`BUILTIN_COMMANDS`] and registered once
//! at startup. Each load is written to the audit log.

pub mod notify;

use crate::irc::commands::{CommandContext, CommandRegistry};
use crate::logging::ChatLogger;
use tracing::info;

pub type BuiltinFn = fn(&mut CommandContext<'_>) -> anyhow::Result<()>;

pub const BUILTIN_COMMANDS: &[(&str, BuiltinFn)] = &[("notify", notify::run)];

/// Build the registry from [`BUILTIN_COMMANDS`].
pub fn load_commands(chat_logger: &mut ChatLogger) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for &(name, handler) in BUILTIN_COMMANDS {
        registry.register(name, handler);
        chat_logger.log_event(&format!("Command Load OK \"{}\"", name));
        info!(command = name, "Command loaded");
    }
    registry
}
