use crabbot::app::bot::Bot;
use crabbot::irc::connection;
use crabbot::logging::{self, ChatLogger};
use crabbot::{config, plugins};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = config::load_config(config_path.as_deref())?;

    logging::init_tracing(&cfg.logging);
    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        nick = %cfg.bot.nickname,
        "Starting crabbot"
    );

    let mut chat_logger = ChatLogger::new(&cfg.logging);
    let commands = plugins::load_commands(&mut chat_logger);

    let transport = connection::open(&cfg.server)
        .await
        .with_context(|| format!("Failed to connect to {}:{}", cfg.server.host, cfg.server.port))?;
    let mut bot = Bot::start(transport, &cfg, commands, chat_logger)
        .await
        .context("Failed to register with the server")?;

    let result = tokio::select! {
        result = bot.run() => result.context("Connection lost"),
        _ = shutdown_signal() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    bot.shutdown(&cfg.bot.quit_message).await;
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
