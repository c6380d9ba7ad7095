//! Inbound message parsing and console rendering.
//!
//! Lines are parsed into [`irc_proto::Message`]; this module only adds the
//! few lookups the console and the responders need on top of it.

use irc_proto::{Command, Message, Prefix};
use tracing::debug;

/// CTCP payload delimiter.
pub const CTCP_DELIM: char = '\x01';

/// Returns `None` for lines that are not valid protocol messages.
pub fn parse(line: &str) -> Option<Message> {
    match line.parse::<Message>() {
        Ok(message) => Some(message),
        Err(e) => {
            debug!(error = %e, line, "unparseable line");
            None
        }
    }
}

/// Nickname of a `nick!user@host` prefix, or the server name for
/// server-originated messages.
pub fn sender(message: &Message) -> Option<&str> {
    match message.prefix.as_ref()? {
        Prefix::Nickname(nick, _, _) => Some(nick.as_str()),
        Prefix::ServerName(server) => Some(server.as_str()),
    }
}

/// The payload between the `\x01` delimiters of a CTCP PRIVMSG/NOTICE.
pub fn ctcp(command: &Command) -> Option<&str> {
    let text = match command {
        Command::PRIVMSG(_, text) | Command::NOTICE(_, text) => text,
        _ => return None,
    };
    text.strip_prefix(CTCP_DELIM)
        .map(|t| t.strip_suffix(CTCP_DELIM).unwrap_or(t))
}

/// Wire form of an outgoing command without the line terminator, ready for
/// `send_irc`.
pub fn to_line(command: &Command) -> String {
    String::from(command).trim_end_matches(['\r', '\n']).to_string()
}

/// One-line console form of the message.
pub fn render(message: &Message) -> String {
    let nick = sender(message).unwrap_or("*");
    if let Some(payload) = ctcp(&message.command) {
        return format!("CTCP {} from {}", payload, nick);
    }

    match &message.command {
        Command::PRIVMSG(target, text) => format!("[{}] <{}> {}", target, nick, text),
        Command::NOTICE(_, text) => format!("-{}- {}", nick, text),
        Command::JOIN(channel, _, _) => format!("{} has joined {}", nick, channel),
        Command::PART(channel, _) => format!("{} has left {}", nick, channel),
        Command::QUIT(reason) => format!("{} has quit ({})", nick, reason.as_deref().unwrap_or_default()),
        // Numerics: first param is our own nick.
        Command::Response(response, args) => format!("{:03} {}", *response as u16, after_target(args)),
        Command::Raw(code, args) if code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{} {}", code, after_target(args))
        }
        command => String::from(command),
    }
}

fn after_target(args: &[String]) -> String {
    args.get(1..).unwrap_or_default().join(" ")
}
