//! Chat command parsing and the command registry.
//!
//! Chat text beginning with the configured prefix (e.g. `!notify hello`) is
//! split into a [`CommandLine`] and looked up in the [`CommandRegistry`].
//! Handlers receive a [`CommandContext`] and queue outbound [`Action`]s on it
//! instead of writing to the socket themselves.

use crate::app::action::Action;
use crate::app::membership::{ChannelMembership, UserMode};
use std::collections::HashMap;
use std::fmt;

/// A command extracted from chat text.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
}

/// Split `<prefix><name> arg1 arg2 ...` into a [`CommandLine`].
///
/// Returns `None` if the text does not start with `prefix` or nothing follows
/// it. Command names are case-sensitive.
pub fn parse_command(text: &str, prefix: &str) -> Option<CommandLine> {
    let body = text.strip_prefix(prefix)?;
    let mut parts = body.split_whitespace();
    let name = parts.next()?.to_string();
    let args = parts.map(str::to_string).collect();
    Some(CommandLine { name, args })
}

/// Handler capability invoked for a registered command.
pub type CommandFn = Box<dyn Fn(&mut CommandContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Everything a handler can see and do during one invocation.
pub struct CommandContext<'a> {
    /// Nickname of the user who ran the command.
    pub sender: &'a str,
    /// Target the command was sent to (a channel, or our nick for queries).
    pub channel: &'a str,
    /// Whether the sender's origin matched the administrator mask.
    pub is_admin: bool,
    pub args: &'a [String],
    /// Configured command prefix, for usage messages.
    pub prefix: &'a str,
    membership: &'a ChannelMembership,
    actions: &'a mut Vec<Action>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        sender: &'a str,
        channel: &'a str,
        is_admin: bool,
        args: &'a [String],
        prefix: &'a str,
        membership: &'a ChannelMembership,
        actions: &'a mut Vec<Action>,
    ) -> Self {
        Self {
            sender,
            channel,
            is_admin,
            args,
            prefix,
            membership,
            actions,
        }
    }

    pub fn send_message(&mut self, target: &str, text: &str) {
        self.actions.push(Action::SendMessage {
            target: target.to_string(),
            text: text.to_string(),
        });
    }

    /// Reply in the channel the command came from.
    pub fn reply(&mut self, text: &str) {
        let target = self.channel.to_string();
        self.send_message(&target, text);
    }

    pub fn join_channel(&mut self, channel: &str) {
        self.actions.push(Action::JoinChannel {
            channel: channel.to_string(),
        });
    }

    pub fn send_raw(&mut self, line: &str) {
        self.actions.push(Action::SendRaw {
            line: line.to_string(),
        });
    }

    /// Last known mode of `user` in `channel`, from the names replies seen so far.
    pub fn mode_of(&self, channel: &str, user: &str) -> Option<UserMode> {
        self.membership.mode_of(channel, user)
    }

    pub fn is_chanop(&self, channel: &str, user: &str) -> bool {
        self.membership.is_chanop(channel, user)
    }
}

/// Name → handler map. Built once at startup, read-only afterwards.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandFn>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut CommandContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.insert(name.into(), Box::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandFn> {
        self.commands.get(name)
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}
