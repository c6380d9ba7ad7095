//! Console slash-command dispatcher.
//!
//! `/name args...` input is looked up case-insensitively in a registry that
//! is built once at startup and read-only afterwards. Each entry carries a
//! minimum argument count and a [`CommandHandler`] that turns the arguments
//! into protocol lines.

use async_trait::async_trait;
use std::collections::HashMap;

use super::connection::LineSink;
use super::error::CommandError;
use super::message::CTCP_DELIM;

pub const COMMAND_PREFIX: char = '/';

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, args: &str, sink: &dyn LineSink) -> Result<(), CommandError>;
}

struct CommandEntry {
    min_args: usize,
    handler: Box<dyn CommandHandler>,
}

#[derive(Default)]
pub struct CommandDispatcher {
    commands: HashMap<String, CommandEntry>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `/msg`, `/join`, `/part` and `/ctcp`.
    pub fn with_builtins() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register("msg", 2, MsgCommand);
        dispatcher.register("join", 1, ChannelCommand::join());
        dispatcher.register("part", 1, ChannelCommand::part());
        dispatcher.register("ctcp", 2, CtcpCommand);
        dispatcher
    }

    /// Registering an existing name replaces the previous entry.
    pub fn register(&mut self, name: &str, min_args: usize, handler: impl CommandHandler + 'static) {
        self.commands.insert(
            name.to_lowercase(),
            CommandEntry {
                min_args,
                handler: Box::new(handler),
            },
        );
    }

    /// Parse `input` and run the matching handler against `sink`.
    ///
    /// Lookup and argument-count failures have no side effect.
    pub async fn dispatch(&self, input: &str, sink: &dyn LineSink) -> Result<(), CommandError> {
        let command = input.strip_prefix(COMMAND_PREFIX).unwrap_or(input);
        let (name, args) = command.split_once(' ').unwrap_or((command, ""));
        let name = name.to_lowercase();

        let entry = self
            .commands
            .get(&name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        let given = argument_count(args);
        if given < entry.min_args {
            return Err(CommandError::InsufficientArguments {
                name,
                required: entry.min_args,
                given,
            });
        }

        entry.handler.handle(args, sink).await
    }
}

/// Number of arguments as the dispatcher counts them: one more than the
/// number of spaces. Leading, trailing and repeated spaces each add one, and
/// an empty argument string counts as one.
pub fn argument_count(args: &str) -> usize {
    1 + args.matches(' ').count()
}

fn split_target(args: &str) -> (&str, &str) {
    args.split_once(' ').unwrap_or((args, ""))
}

fn with_channel_prefix(channel: &str) -> String {
    if channel.starts_with('#') {
        channel.to_string()
    } else {
        format!("#{}", channel)
    }
}

/// `/msg <target> <text...>` -> `PRIVMSG <target> :<text>`
pub struct MsgCommand;

#[async_trait]
impl CommandHandler for MsgCommand {
    async fn handle(&self, args: &str, sink: &dyn LineSink) -> Result<(), CommandError> {
        let (target, text) = split_target(args);
        println!("To {}: {}", target, text);
        sink.send_irc(&format!("PRIVMSG {} :{}", target, text)).await?;
        Ok(())
    }
}

/// `/join <channel>` and `/part <channel>`; a missing `#` is added.
pub struct ChannelCommand {
    verb: &'static str,
}

impl ChannelCommand {
    pub fn join() -> Self {
        Self { verb: "JOIN" }
    }

    pub fn part() -> Self {
        Self { verb: "PART" }
    }
}

#[async_trait]
impl CommandHandler for ChannelCommand {
    async fn handle(&self, args: &str, sink: &dyn LineSink) -> Result<(), CommandError> {
        // The space count lets `/join` through with no argument at all.
        if args.trim().is_empty() {
            return Err(CommandError::MissingArgument {
                name: self.verb.to_lowercase(),
                argument: "channel",
            });
        }
        let channel = with_channel_prefix(args);
        sink.send_irc(&format!("{} {}", self.verb, channel)).await?;
        Ok(())
    }
}

/// `/ctcp <target> <text...>` -> `PRIVMSG <target> :\x01<TEXT>\x01`
pub struct CtcpCommand;

#[async_trait]
impl CommandHandler for CtcpCommand {
    async fn handle(&self, args: &str, sink: &dyn LineSink) -> Result<(), CommandError> {
        let (target, text) = split_target(args);
        let payload = text.to_uppercase();
        sink.send_irc(&format!(
            "PRIVMSG {} :{}{}{}",
            target, CTCP_DELIM, payload, CTCP_DELIM
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::irc::error::{ConnectionError, Result as SendResult};
    use std::sync::Mutex;

    /// Records every line instead of writing to a socket.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) lines: Mutex<Vec<String>>,
        pub(crate) fail: bool,
    }

    impl RecordingSink {
        pub(crate) fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LineSink for RecordingSink {
        async fn send_irc(&self, line: &str) -> SendResult<()> {
            if self.fail {
                return Err(ConnectionError::closed("broken pipe"));
            }
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    async fn dispatch(input: &str) -> (Result<(), CommandError>, Vec<String>) {
        let dispatcher = CommandDispatcher::with_builtins();
        let sink = RecordingSink::default();
        let result = dispatcher.dispatch(input, &sink).await;
        (result, sink.lines())
    }

    #[tokio::test]
    async fn test_msg() {
        let (result, lines) = dispatch("/msg bob hello there").await;
        result.unwrap();
        assert_eq!(lines, vec!["PRIVMSG bob :hello there"]);
    }

    #[tokio::test]
    async fn test_join_adds_channel_prefix() {
        let (_, plain) = dispatch("/join foo").await;
        let (_, prefixed) = dispatch("/join #foo").await;
        assert_eq!(plain, vec!["JOIN #foo"]);
        assert_eq!(prefixed, vec!["JOIN #foo"]);
    }

    #[tokio::test]
    async fn test_part() {
        let (_, lines) = dispatch("/part rust").await;
        assert_eq!(lines, vec!["PART #rust"]);
    }

    #[tokio::test]
    async fn test_ctcp_is_upper_cased() {
        let (result, lines) = dispatch("/ctcp bob ping").await;
        result.unwrap();
        assert_eq!(lines, vec!["PRIVMSG bob :\x01PING\x01"]);
    }

    #[tokio::test]
    async fn test_name_is_case_insensitive() {
        let (_, upper) = dispatch("/JOIN foo").await;
        let (_, lower) = dispatch("/join foo").await;
        assert_eq!(upper, lower);
        assert_eq!(upper, vec!["JOIN #foo"]);
    }

    #[tokio::test]
    async fn test_prefix_is_optional() {
        let (_, lines) = dispatch("join foo").await;
        assert_eq!(lines, vec!["JOIN #foo"]);
    }

    #[tokio::test]
    async fn test_unknown_command_sends_nothing() {
        let (result, lines) = dispatch("/frobnicate x").await;
        assert!(matches!(result, Err(CommandError::NotFound(name)) if name == "frobnicate"));
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_msg_without_text_is_insufficient() {
        let (result, lines) = dispatch("/msg bob").await;
        assert!(matches!(
            result,
            Err(CommandError::InsufficientArguments { required: 2, given: 1, .. })
        ));
        assert!(lines.is_empty());
    }

    // Known quirk: arguments are counted by spaces, so a trailing space
    // satisfies `/msg` and an empty message goes out.
    #[tokio::test]
    async fn test_trailing_space_counts_as_argument() {
        assert_eq!(argument_count("bob "), 2);
        let (result, lines) = dispatch("/msg bob ").await;
        result.unwrap();
        assert_eq!(lines, vec!["PRIVMSG bob :"]);
    }

    #[test]
    fn test_argument_count_counts_spaces() {
        assert_eq!(argument_count(""), 1);
        assert_eq!(argument_count("bob"), 1);
        assert_eq!(argument_count("bob hello there"), 3);
        assert_eq!(argument_count("bob  hello"), 3);
        assert_eq!(argument_count(" bob"), 2);
    }

    #[tokio::test]
    async fn test_join_without_channel_is_refused() {
        let (result, lines) = dispatch("/join").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingArgument { ref name, argument: "channel" } if name == "join"
        ));
        assert_eq!(err.to_string(), "Missing channel for /join");
        assert!(lines.is_empty());

        let (result, lines) = dispatch("/part ").await;
        assert!(matches!(result, Err(CommandError::MissingArgument { .. })));
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_register_overwrites() {
        let mut dispatcher = CommandDispatcher::with_builtins();
        dispatcher.register("JOIN", 1, ChannelCommand::part());

        let sink = RecordingSink::default();
        dispatcher.dispatch("/join foo", &sink).await.unwrap();
        assert_eq!(sink.lines(), vec!["PART #foo"]);
    }

    #[tokio::test]
    async fn test_empty_registry_reports_not_found() {
        let dispatcher = CommandDispatcher::new();
        let sink = RecordingSink::default();
        assert!(matches!(
            dispatcher.dispatch("/msg a b", &sink).await,
            Err(CommandError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_send_failure_is_propagated() {
        let dispatcher = CommandDispatcher::with_builtins();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            dispatcher.dispatch("/join foo", &sink).await,
            Err(CommandError::Connection(ConnectionError::ConnectionClosed { .. }))
        ));
    }
}
