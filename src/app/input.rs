//! Operator input loop.
//!
//! Each console line is one of: empty (ignored), a `/command` (dispatched),
//! the bare word `quit` (ends the loop), or anything else (sent verbatim as a
//! raw protocol line).

use tokio::sync::mpsc;
use tracing::debug;

use super::lifecycle::Lifecycle;
use crate::irc::commands::{CommandDispatcher, COMMAND_PREFIX};
use crate::irc::connection::LineSink;
use crate::irc::error::CommandError;

pub const QUIT_TOKEN: &str = "quit";

/// Why the input loop ended.
#[derive(Debug, PartialEq, Eq)]
pub enum InputExit {
    Quit,
    EndOfInput,
    ConnectionLost,
    Stopped,
}

/// Runs until `quit`, end of input, a fatal send error, or a stop request.
/// Always stops `lifecycle` on the way out so the receive loop follows.
pub async fn run_input_loop(
    input: &mut mpsc::UnboundedReceiver<String>,
    dispatcher: &CommandDispatcher,
    sink: &dyn LineSink,
    lifecycle: &Lifecycle,
) -> InputExit {
    let exit = loop {
        let line = tokio::select! {
            line = input.recv() => line,
            _ = lifecycle.stopped() => break InputExit::Stopped,
        };
        let Some(line) = line else {
            break InputExit::EndOfInput;
        };

        if line.is_empty() {
            continue;
        }

        let result = if line.starts_with(COMMAND_PREFIX) {
            dispatcher.dispatch(&line, sink).await
        } else if line == QUIT_TOKEN {
            println!("Disconnecting");
            break InputExit::Quit;
        } else {
            sink.send_irc(&line).await.map_err(CommandError::from)
        };

        match result {
            Ok(()) => {}
            Err(CommandError::Connection(e)) if e.is_fatal() => {
                println!("{}", e);
                break InputExit::ConnectionLost;
            }
            Err(e) => println!("{}", e),
        }
    };

    debug!(?exit, "input loop finished");
    lifecycle.stop();
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irc::commands::tests::RecordingSink;

    async fn run(lines: &[&str], sink: &RecordingSink) -> (InputExit, Lifecycle) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        for line in lines {
            tx.send(line.to_string()).unwrap();
        }
        drop(tx);
        let dispatcher = CommandDispatcher::with_builtins();
        let lifecycle = Lifecycle::new();
        let exit = run_input_loop(&mut rx, &dispatcher, sink, &lifecycle).await;
        (exit, lifecycle)
    }

    #[tokio::test]
    async fn test_routes_commands_and_raw_lines() {
        let sink = RecordingSink::default();
        let (exit, lifecycle) = run(
            &["", "/join rust", "WHOIS bob", "/nope", "/msg bob", "/ctcp bob version", "quit", "NEVER SENT"],
            &sink,
        )
        .await;

        assert_eq!(exit, InputExit::Quit);
        assert!(!lifecycle.is_running());
        assert_eq!(
            sink.lines(),
            vec!["JOIN #rust", "WHOIS bob", "PRIVMSG bob :\x01VERSION\x01"]
        );
    }

    #[tokio::test]
    async fn test_end_of_input_stops() {
        let sink = RecordingSink::default();
        let (exit, lifecycle) = run(&["PING :x"], &sink).await;
        assert_eq!(exit, InputExit::EndOfInput);
        assert!(!lifecycle.is_running());
        assert_eq!(sink.lines(), vec!["PING :x"]);
    }

    #[tokio::test]
    async fn test_quit_is_exact_match() {
        let sink = RecordingSink::default();
        let (exit, _) = run(&["QUIT :bye"], &sink).await;
        assert_eq!(exit, InputExit::EndOfInput);
        assert_eq!(sink.lines(), vec!["QUIT :bye"]);
    }

    #[tokio::test]
    async fn test_fatal_send_error_ends_loop() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let (exit, lifecycle) = run(&["/join rust", "PRIVMSG x :y"], &sink).await;
        assert_eq!(exit, InputExit::ConnectionLost);
        assert!(!lifecycle.is_running());
    }

    #[tokio::test]
    async fn test_stop_request_ends_loop() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<String>();
        let dispatcher = CommandDispatcher::with_builtins();
        let sink = RecordingSink::default();
        let lifecycle = Lifecycle::new();
        lifecycle.stop();
        let exit = run_input_loop(&mut rx, &dispatcher, &sink, &lifecycle).await;
        assert_eq!(exit, InputExit::Stopped);
    }
}
