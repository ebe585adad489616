//! `notify <message...>`: raise a desktop notification on the bot's host.

use crate::irc::commands::CommandContext;
use tokio::process::Command;
use tracing::{debug, warn};

const NOTIFIER: &str = "notify-send";
const TITLE: &str = "IRC Alert";

pub fn run(ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    if ctx.args.is_empty() {
        let usage = format!("Usage: {}notify <message>", ctx.prefix);
        ctx.reply(&usage);
        return Ok(());
    }

    let body = format!("{} ({}): {}", ctx.sender, ctx.channel, ctx.args.join(" "));
    spawn_notification(body);
    Ok(())
}

/// Run the notifier in the background so the receive loop is not held up.
fn spawn_notification(body: String) {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "No runtime available for desktop notification");
            return;
        }
    };

    handle.spawn(async move {
        match Command::new(NOTIFIER).arg(TITLE).arg(&body).status().await {
            Ok(status) if status.success() => debug!("Desktop notification sent"),
            Ok(status) => warn!(%status, "Desktop notification exited with failure"),
            Err(e) => warn!(error = %e, "Local notification failed"),
        }
    });
}
