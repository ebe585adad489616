use crate::app::membership::ChannelMembership;
use crate::config::BotConfig;
use crate::irc::commands::CommandRegistry;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    /// Handshake sent, waiting for the welcome reply.
    Handshaking,
    Ready,
}

impl ConnectionStatus {
    /// The handshake has gone out and outbound sends are allowed.
    pub fn is_connected(self) -> bool {
        self != ConnectionStatus::Disconnected
    }
}

/// One chat message, queued for the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub origin: String,
    pub sender: String,
    pub channel: String,
    pub text: String,
}

/// Everything the dispatcher reads and mutates while handling lines.
#[derive(Debug)]
pub struct BotState {
    pub status: ConnectionStatus,
    pub nickname: String,
    pub default_channel: Option<String>,
    pub command_prefix: String,
    pub admin_mask: Regex,
    pub membership: ChannelMembership,
    pub commands: CommandRegistry,
    /// Chat messages seen since the run loop last drained this.
    pub new_messages: Vec<ChatRecord>,
}

impl BotState {
    pub fn new(config: &BotConfig, commands: CommandRegistry) -> Result<Self, regex::Error> {
        Ok(Self {
            status: ConnectionStatus::Disconnected,
            nickname: config.nickname.clone(),
            default_channel: config.default_channel().map(str::to_string),
            command_prefix: config.command_prefix.clone(),
            admin_mask: Regex::new(&config.admin_mask)?,
            membership: ChannelMembership::default(),
            commands,
            new_messages: Vec::new(),
        })
    }

    pub fn is_admin(&self, origin: &str) -> bool {
        self.admin_mask.is_match(origin)
    }
}
