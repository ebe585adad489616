use crate::app::action::Action;
use crate::app::state::*;
use crate::irc::commands::{parse_command, CommandContext};
use crate::irc::message::{keepalive_token, Message};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, trace, warn};

/// Dispatch one framed line and return the outbound actions it produced.
///
/// Protocol noise (unparseable lines, unknown commands, short parameter
/// lists) yields no actions and never an error.
pub fn handle_line(state: &mut BotState, line: &str) -> Vec<Action> {
    if line.is_empty() {
        return vec![];
    }
    debug!("<<< {}", line);

    if let Some(token) = keepalive_token(line) {
        return vec![Action::Pong {
            token: token.to_string(),
        }];
    }

    let message = match Message::parse(line) {
        Ok(message) => message,
        Err(e) => {
            trace!(error = %e, "Ignoring malformed line");
            return vec![];
        }
    };

    match message.command.as_str() {
        // RPL_WELCOME
        "001" => handle_welcome(state),
        // RPL_NAMREPLY
        "353" => {
            handle_names(state, &message);
            vec![]
        }
        "PRIVMSG" => handle_privmsg(state, &message),
        other => {
            trace!(command = other, "Ignoring message");
            vec![]
        }
    }
}

fn handle_welcome(state: &mut BotState) -> Vec<Action> {
    if state.status != ConnectionStatus::Handshaking {
        debug!(status = ?state.status, "Ignoring repeated welcome");
        return vec![];
    }
    state.status = ConnectionStatus::Ready;
    info!(nick = %state.nickname, "Registered with server");

    state
        .default_channel
        .iter()
        .map(|channel| Action::JoinChannel {
            channel: channel.clone(),
        })
        .collect()
}

/// `:server 353 <me> [=|*|@] <channel> :<decorated nicks>`
fn handle_names(state: &mut BotState, message: &Message) {
    let params = &message.params;
    let channel_index = match params.get(1).map(String::as_str) {
        Some("=" | "*" | "@") => 2,
        _ => 1,
    };
    if params.len() <= channel_index + 1 {
        trace!(params = params.len(), "Ignoring short names reply");
        return;
    }
    let channel = &params[channel_index];
    let names = params[channel_index + 1..].join(" ");
    let count = state.membership.replace_channel(channel, &names);
    debug!(channel = %channel, users = count, "Updated channel membership");
}

fn handle_privmsg(state: &mut BotState, message: &Message) -> Vec<Action> {
    if message.params.len() < 2 {
        trace!("Ignoring PRIVMSG without target or text");
        return vec![];
    }
    let channel = message.params[0].as_str();
    let text = message.trailing().unwrap_or_default();
    let sender = message.source_nick();

    state.new_messages.push(ChatRecord {
        origin: message.origin.clone(),
        sender: sender.to_string(),
        channel: channel.to_string(),
        text: text.to_string(),
    });

    let is_admin = state.is_admin(&message.origin);
    run_command(state, sender, channel, is_admin, text)
}

fn run_command(
    state: &BotState,
    sender: &str,
    channel: &str,
    is_admin: bool,
    text: &str,
) -> Vec<Action> {
    let Some(command) = parse_command(text, &state.command_prefix) else {
        return vec![];
    };
    let Some(handler) = state.commands.get(&command.name) else {
        trace!(command = %command.name, "Unknown command");
        return vec![];
    };

    debug!(command = %command.name, sender, channel, is_admin, "Running command");
    let mut actions = Vec::new();
    let outcome = {
        let mut ctx = CommandContext::new(
            sender,
            channel,
            is_admin,
            &command.args,
            &state.command_prefix,
            &state.membership,
            &mut actions,
        );
        panic::catch_unwind(AssertUnwindSafe(|| handler(&mut ctx)))
    };

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(command = %command.name, sender, error = %e, "Command failed");
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(command = %command.name, sender, reason = %reason, "Command panicked");
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::membership::UserMode;
    use crate::config::BotConfig;
    use crate::irc::commands::CommandRegistry;
    use std::sync::{Arc, Mutex};

    fn bot_config(default_channel: Option<&str>) -> BotConfig {
        BotConfig {
            nickname: "crabbot".into(),
            realname: "Crab Bot".into(),
            default_channel: default_channel.map(str::to_string),
            command_prefix: "!".into(),
            admin_mask: r"@op\.[a-zA-Z0-9.-]+$".into(),
            quit_message: "Terminated".into(),
        }
    }

    fn ready_state(commands: CommandRegistry) -> BotState {
        let mut state = BotState::new(&bot_config(None), commands).unwrap();
        state.status = ConnectionStatus::Ready;
        state
    }

    type Calls = Arc<Mutex<Vec<(String, String, bool, Vec<String>)>>>;

    fn recording_registry(name: &str) -> (CommandRegistry, Calls) {
        let calls: Calls = Arc::default();
        let seen = calls.clone();
        let mut registry = CommandRegistry::new();
        registry.register(name, move |ctx| {
            seen.lock().unwrap().push((
                ctx.sender.to_string(),
                ctx.channel.to_string(),
                ctx.is_admin,
                ctx.args.to_vec(),
            ));
            Ok(())
        });
        (registry, calls)
    }

    #[test]
    fn test_ping_replies_pong_without_side_effects() {
        let (registry, calls) = recording_registry("cmd");
        let mut state = ready_state(registry);

        let actions = handle_line(&mut state, "PING :abc");

        assert_eq!(
            actions,
            vec![Action::Pong {
                token: "abc".into()
            }]
        );
        assert!(state.new_messages.is_empty());
        assert_eq!(state.membership.channel_count(), 0);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_and_malformed_lines_are_ignored() {
        let mut state = ready_state(CommandRegistry::new());
        assert!(handle_line(&mut state, "").is_empty());
        assert!(handle_line(&mut state, ":only.origin").is_empty());
        assert!(handle_line(&mut state, "PING").is_empty());
        assert!(handle_line(&mut state, ":a!b@c PRIVMSG #chan").is_empty());
        assert!(handle_line(&mut state, ":srv 353 bot").is_empty());
        assert!(handle_line(&mut state, ":a!b@c NOTICE #chan :hi").is_empty());
        assert!(state.new_messages.is_empty());
    }

    #[test]
    fn test_welcome_joins_default_channel_once() {
        let mut state = BotState::new(&bot_config(Some("#home")), CommandRegistry::new()).unwrap();
        state.status = ConnectionStatus::Handshaking;

        let actions = handle_line(&mut state, ":irc.example 001 crabbot :Welcome");
        assert_eq!(
            actions,
            vec![Action::JoinChannel {
                channel: "#home".into()
            }]
        );
        assert_eq!(state.status, ConnectionStatus::Ready);

        let again = handle_line(&mut state, ":irc.example 001 crabbot :Welcome");
        assert!(again.is_empty());
    }

    #[test]
    fn test_welcome_without_default_channel() {
        let mut state = BotState::new(&bot_config(None), CommandRegistry::new()).unwrap();
        state.status = ConnectionStatus::Handshaking;

        assert!(handle_line(&mut state, ":irc.example 001 crabbot :Welcome").is_empty());
        assert_eq!(state.status, ConnectionStatus::Ready);
    }

    #[test]
    fn test_names_reply_replaces_channel() {
        let mut state = ready_state(CommandRegistry::new());
        handle_line(&mut state, ":irc.example 353 crabbot = #x :@alice +bob carol");
        handle_line(&mut state, ":irc.example 353 crabbot = #y :%zed");

        let m = &state.membership;
        assert_eq!(m.mode_of("#x", "alice"), Some(UserMode::Op));
        assert_eq!(m.mode_of("#x", "bob"), Some(UserMode::None));
        assert_eq!(m.mode_of("#x", "carol"), Some(UserMode::None));

        handle_line(&mut state, ":irc.example 353 crabbot = #x :%dave");
        let m = &state.membership;
        assert_eq!(m.users("#x").unwrap().len(), 1);
        assert_eq!(m.mode_of("#x", "dave"), Some(UserMode::HalfOp));
        assert_eq!(m.mode_of("#x", "alice"), None);
        assert_eq!(m.mode_of("#y", "zed"), Some(UserMode::HalfOp));
    }

    #[test]
    fn test_names_reply_with_untrailed_list() {
        let mut state = ready_state(CommandRegistry::new());
        handle_line(&mut state, ":irc.example 353 crabbot = #x @alice bob");

        let m = &state.membership;
        assert_eq!(m.channel_count(), 1);
        assert_eq!(m.mode_of("#x", "alice"), Some(UserMode::Op));
        assert_eq!(m.mode_of("#x", "bob"), Some(UserMode::None));
        assert!(m.users("alice").is_none());
    }

    #[test]
    fn test_names_reply_without_symbol() {
        let mut state = ready_state(CommandRegistry::new());
        handle_line(&mut state, ":irc.example 353 crabbot #x :@alice");
        assert!(state.membership.is_chanop("#x", "alice"));
    }

    #[test]
    fn test_privmsg_dispatches_command_once() {
        let (registry, calls) = recording_registry("cmd");
        let mut state = ready_state(registry);

        let actions = handle_line(&mut state, ":alice!al@op.example.net PRIVMSG #chan :!cmd a b");
        assert!(actions.is_empty());

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "alice".to_string(),
                "#chan".to_string(),
                true,
                vec!["a".to_string(), "b".to_string()]
            )]
        );
        assert_eq!(
            state.new_messages,
            vec![ChatRecord {
                origin: "alice!al@op.example.net".into(),
                sender: "alice".into(),
                channel: "#chan".into(),
                text: "!cmd a b".into(),
            }]
        );
    }

    #[test]
    fn test_admin_flag_follows_origin_mask() {
        let (registry, calls) = recording_registry("cmd");
        let mut state = ready_state(registry);

        handle_line(&mut state, ":bob!b@users.example.net PRIVMSG #chan :!cmd");
        handle_line(&mut state, ":eve!e@op.example.net.evil/x PRIVMSG #chan :!cmd");
        handle_line(&mut state, ":carol!c@op.staff PRIVMSG #chan :!cmd");

        let flags: Vec<bool> = calls.lock().unwrap().iter().map(|c| c.2).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_plain_chat_is_logged_but_not_dispatched() {
        let (registry, calls) = recording_registry("cmd");
        let mut state = ready_state(registry);

        assert!(handle_line(&mut state, ":alice!al@host PRIVMSG #chan :hello").is_empty());
        assert!(handle_line(&mut state, ":alice!al@host PRIVMSG #chan :!unknown x").is_empty());
        assert!(handle_line(&mut state, ":alice!al@host PRIVMSG #chan :!Cmd x").is_empty());

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(state.new_messages.len(), 3);
        assert_eq!(state.new_messages[0].text, "hello");
    }

    #[test]
    fn test_handler_actions_are_returned() {
        let mut registry = CommandRegistry::new();
        registry.register("echo", |ctx| {
            let text = ctx.args.join(" ");
            ctx.reply(&text);
            Ok(())
        });
        let mut state = ready_state(registry);

        let actions = handle_line(&mut state, ":alice!al@host PRIVMSG #chan :!echo hi there");
        assert_eq!(
            actions,
            vec![Action::SendMessage {
                target: "#chan".into(),
                text: "hi there".into()
            }]
        );
    }

    #[test]
    fn test_failing_handlers_are_isolated() {
        let mut registry = CommandRegistry::new();
        registry.register("fail", |ctx| {
            ctx.reply("partial");
            anyhow::bail!("boom")
        });
        registry.register("panic", |_| panic!("handler exploded"));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        registry.register("ok", move |ctx| {
            seen.lock().unwrap().push(ctx.args.to_vec());
            Ok(())
        });
        let mut state = ready_state(registry);

        let actions = handle_line(&mut state, ":a!b@c PRIVMSG #chan :!fail");
        assert_eq!(
            actions,
            vec![Action::SendMessage {
                target: "#chan".into(),
                text: "partial".into()
            }]
        );
        assert!(handle_line(&mut state, ":a!b@c PRIVMSG #chan :!panic").is_empty());
        handle_line(&mut state, ":a!b@c PRIVMSG #chan :!ok 1");

        assert_eq!(*calls.lock().unwrap(), vec![vec!["1".to_string()]]);
        assert_eq!(state.new_messages.len(), 3);
    }
}
