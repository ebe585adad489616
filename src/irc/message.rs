//! Protocol message parser.
//!
//! Turns one framed line into a [`Message`] of origin, command and
//! parameters. Only the shape of the line is checked here; whether a command
//! carries enough parameters is up to the dispatcher.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("line has no command: {0:?}")]
    MissingCommand(String),
}

/// A parsed protocol line. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source of the message without the leading `:` (empty when absent).
    pub origin: String,
    pub command: String,
    /// Middle parameters followed by the trailing parameter, if any.
    pub params: Vec<String>,
}

impl Message {
    /// Parse `[:origin] COMMAND param... [:trailing text]`.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut rest = line.trim_start_matches(' ');
        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut origin = String::new();
        if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, tail) = stripped.split_once(' ').unwrap_or((stripped, ""));
            origin = prefix.to_string();
            rest = tail;
        }

        let mut command: Option<String> = None;
        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if command.is_some() {
                if let Some(trailing) = rest.strip_prefix(':') {
                    params.push(trailing.to_string());
                    break;
                }
            }
            let (field, tail) = rest.split_once(' ').unwrap_or((rest, ""));
            match command {
                None => command = Some(field.to_string()),
                Some(_) => params.push(field.to_string()),
            }
            rest = tail;
        }

        let command = command.ok_or_else(|| ParseError::MissingCommand(line.to_string()))?;
        Ok(Self {
            origin,
            command,
            params,
        })
    }

    /// Nickname part of the origin (everything before the first `!`).
    pub fn source_nick(&self) -> &str {
        self.origin.split('!').next().unwrap_or_default()
    }

    /// Last parameter, usually the free-text body.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

/// Recognize a keep-alive line before generic parsing.
///
/// Returns the token to echo back for `PING <token>` / `PING :<token>`.
/// A bare `PING` with no token yields `None`.
pub fn keepalive_token(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("PING")?;
    if !rest.starts_with(' ') {
        return None;
    }
    let rest = rest.trim_start_matches(' ');
    let token = rest.strip_prefix(':').unwrap_or(rest);
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
