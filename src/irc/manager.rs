use crate::app::action::Action;
use crate::error::BotError;
use crate::irc::codec::LineCodec;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::debug;

/// Owns the framed connection: reads lines and writes outbound commands.
pub struct IrcManager<S> {
    framed: Framed<S, LineCodec>,
}

impl<S> IrcManager<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    /// Next complete line, `None` at end of stream.
    pub async fn next_line(&mut self) -> Option<Result<String, BotError>> {
        self.framed
            .next()
            .await
            .map(|result| result.map_err(BotError::from))
    }

    /// Write one line (CRLF is appended) and flush it.
    pub async fn send_line(&mut self, line: String) -> Result<(), BotError> {
        debug!(">>> {}", line);
        self.framed.send(line).await?;
        Ok(())
    }

    /// Registration handshake: `PASS` (if any), `NICK`, `USER`, in that order.
    pub async fn register(
        &mut self,
        password: Option<&str>,
        nickname: &str,
        realname: &str,
    ) -> Result<(), BotError> {
        if let Some(password) = password {
            self.send_line(format!("PASS {}", password)).await?;
        }
        self.send_line(format!("NICK {}", nickname)).await?;
        self.send_line(format!("USER {} 0 * :{}", nickname, realname))
            .await
    }

    pub async fn send_pong(&mut self, token: &str) -> Result<(), BotError> {
        let token = strip_line_breaks(token);
        if token.contains(' ') {
            self.send_line(format!("PONG :{}", token)).await
        } else {
            self.send_line(format!("PONG {}", token)).await
        }
    }

    pub async fn send_join(&mut self, channel: &str) -> Result<(), BotError> {
        self.send_line(format!("JOIN {}", strip_line_breaks(channel)))
            .await
    }

    pub async fn send_privmsg(&mut self, target: &str, text: &str) -> Result<(), BotError> {
        self.send_line(format!(
            "PRIVMSG {} :{}",
            strip_line_breaks(target),
            strip_line_breaks(text)
        ))
        .await
    }

    pub async fn send_quit(&mut self, reason: &str) -> Result<(), BotError> {
        self.send_line(format!("QUIT :{}", strip_line_breaks(reason)))
            .await
    }

    pub async fn send_raw(&mut self, line: &str) -> Result<(), BotError> {
        self.send_line(strip_line_breaks(line)).await
    }

    pub async fn execute(&mut self, action: &Action) -> Result<(), BotError> {
        match action {
            Action::Pong { token } => self.send_pong(token).await,
            Action::JoinChannel { channel } => self.send_join(channel).await,
            Action::SendMessage { target, text } => self.send_privmsg(target, text).await,
            Action::SendRaw { line } => self.send_raw(line).await,
        }
    }
}

/// Keep outbound text on one protocol line.
fn strip_line_breaks(text: &str) -> String {
    text.replace(['\r', '\n'], "")
}
