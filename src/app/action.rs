/// Outbound work produced by the dispatcher and by command handlers.
///
/// Actions are executed in order by the run loop once the current line has
/// been fully dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Pong { token: String },
    JoinChannel { channel: String },
    SendMessage { target: String, text: String },
    SendRaw { line: String },
}
