//! The receive-and-dispatch loop.
//!
//! A [`Bot`] owns the connection, the dispatcher state and the audit log.
//! Each line is fully dispatched, including any command handler, and its
//! actions written out before the next line is read.

use crate::app::action::Action;
use crate::app::handler;
use crate::app::state::{BotState, ConnectionStatus};
use crate::config::AppConfig;
use crate::error::BotError;
use crate::irc::commands::CommandRegistry;
use crate::irc::manager::IrcManager;
use crate::logging::ChatLogger;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};

pub struct Bot<S> {
    irc: IrcManager<S>,
    state: BotState,
    chat_logger: ChatLogger,
}

impl<S> Bot<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Take ownership of an open transport and send the registration
    /// handshake. This is the only way to build a `Bot`, so the handshake is
    /// always the first traffic on the wire.
    pub async fn start(
        stream: S,
        config: &AppConfig,
        commands: CommandRegistry,
        chat_logger: ChatLogger,
    ) -> Result<Self, BotError> {
        let mut state = BotState::new(&config.bot, commands)?;
        let mut irc = IrcManager::new(stream);
        irc.register(
            config.server.password(),
            &config.bot.nickname,
            &config.bot.realname,
        )
        .await?;
        state.status = ConnectionStatus::Handshaking;
        info!(nick = %config.bot.nickname, "Handshake sent");

        Ok(Self {
            irc,
            state,
            chat_logger,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Run until the connection fails. Never returns `Ok`.
    pub async fn run(&mut self) -> Result<(), BotError> {
        loop {
            let line = match self.irc.next_line().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    error!(error = %e, "Connection error");
                    self.state.status = ConnectionStatus::Disconnected;
                    return Err(e);
                }
                None => {
                    error!("Connection closed by server");
                    self.state.status = ConnectionStatus::Disconnected;
                    return Err(BotError::ConnectionClosed);
                }
            };

            let actions = handler::handle_line(&mut self.state, &line);

            for record in self.state.new_messages.drain(..) {
                self.chat_logger.log_chat(&record);
            }

            for action in &actions {
                if let Err(e) = self.execute(action).await {
                    warn!(error = %e, ?action, "Send failed");
                }
            }
        }
    }

    async fn execute(&mut self, action: &Action) -> Result<(), BotError> {
        if !self.state.status.is_connected() {
            return Err(BotError::NotConnected);
        }
        self.irc.execute(action).await
    }

    /// Send `QUIT` if connected and mark the connection closed.
    ///
    /// Safe to call more than once; only the first call while connected
    /// sends anything. Send failures are logged, never returned.
    pub async fn shutdown(&mut self, reason: &str) {
        if !self.state.status.is_connected() {
            return;
        }
        self.state.status = ConnectionStatus::Disconnected;
        match self.irc.send_quit(reason).await {
            Ok(()) => info!("Disconnected"),
            Err(e) => error!(error = %e, "Error at shutdown"),
        }
    }
}
