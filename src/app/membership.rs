//! Per-channel membership store fed by names replies (numeric 353).

use std::collections::HashMap;

/// Channel privilege of a user, from the decoration in a names reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum UserMode {
    #[default]
    None,
    HalfOp,
    Op,
}

impl UserMode {
    fn from_decoration(token: &str) -> Self {
        match token.chars().next() {
            Some('@') => UserMode::Op,
            Some('%') => UserMode::HalfOp,
            _ => UserMode::None,
        }
    }
}

/// Strip names-reply decorations from a token: `@alice` → `(alice, Op)`.
pub fn parse_member(token: &str) -> (String, UserMode) {
    let token = token.trim_start_matches(':');
    let mode = UserMode::from_decoration(token);
    let nick = token.trim_start_matches(['@', '%', '+']);
    (nick.to_string(), mode)
}

/// channel → (nick → mode).
#[derive(Debug, Default)]
pub struct ChannelMembership {
    channels: HashMap<String, HashMap<String, UserMode>>,
}

impl ChannelMembership {
    /// Replace everything known about `channel` with the users in `names`.
    ///
    /// Other channels are untouched. Returns the number of users stored.
    pub fn replace_channel(&mut self, channel: &str, names: &str) -> usize {
        let users: HashMap<String, UserMode> = names
            .split_whitespace()
            .map(parse_member)
            .filter(|(nick, _)| !nick.is_empty())
            .collect();
        let count = users.len();
        self.channels.insert(channel.to_string(), users);
        count
    }

    pub fn mode_of(&self, channel: &str, user: &str) -> Option<UserMode> {
        self.channels.get(channel)?.get(user).copied()
    }

    pub fn is_chanop(&self, channel: &str, user: &str) -> bool {
        self.mode_of(channel, user) == Some(UserMode::Op)
    }

    #[cfg(test)]
    pub fn users(&self, channel: &str) -> Option<&HashMap<String, UserMode>> {
        self.channels.get(channel)
    }

    #[cfg(test)]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
