//! Automatic replies to inbound messages.
//!
//! Responders only compute a reply; the receive loop sends it over the same
//! connection the operator's input uses.

use irc_proto::{Command, Message};

use super::message::{ctcp, sender, CTCP_DELIM};

pub trait InboundHandler: Send + Sync {
    fn respond(&self, message: &Message) -> Option<Command>;
}

/// Answers server `PING` with `PONG` so the server keeps us connected.
pub struct PingResponder;

impl InboundHandler for PingResponder {
    fn respond(&self, message: &Message) -> Option<Command> {
        match &message.command {
            Command::PING(token, _) => Some(Command::PONG(token.clone(), None)),
            _ => None,
        }
    }
}

/// Answers `CTCP VERSION` requests with a fixed version string.
pub struct CtcpVersionResponder {
    version: String,
}

impl CtcpVersionResponder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl InboundHandler for CtcpVersionResponder {
    fn respond(&self, message: &Message) -> Option<Command> {
        // Replies go out as NOTICE; never answer a NOTICE.
        if !matches!(message.command, Command::PRIVMSG(..)) {
            return None;
        }
        if !ctcp(&message.command)?.eq_ignore_ascii_case("VERSION") {
            return None;
        }
        let nick = sender(message)?;
        Some(Command::NOTICE(
            nick.to_string(),
            format!("{}VERSION {}{}", CTCP_DELIM, self.version, CTCP_DELIM),
        ))
    }
}
