//! Session orchestration: connect, log in, run the input and receive loops,
//! tear down.

pub mod console;
pub mod input;
pub mod lifecycle;
pub mod receive;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{BehaviorConfig, Settings};
use crate::irc::commands::CommandDispatcher;
use crate::irc::connection::{Connection, LineObserver};
use crate::irc::error::ConnectionError;
use crate::irc::responder::{CtcpVersionResponder, InboundHandler, PingResponder};
use crate::logging::Transcript;
use lifecycle::Lifecycle;

fn responders(behavior: &BehaviorConfig) -> Vec<Box<dyn InboundHandler>> {
    let mut responders: Vec<Box<dyn InboundHandler>> = Vec::new();
    if behavior.reply_ping {
        responders.push(Box::new(PingResponder));
    }
    if behavior.reply_ctcp_version {
        responders.push(Box::new(CtcpVersionResponder::new(behavior.version_string.clone())));
    }
    responders
}

/// Run one session against the configured server.
///
/// Order: allocate socket, connect, log in, then start the input loop and
/// the interrupt watcher, and receive on the calling task until the
/// connection drops, the operator quits, or an interrupt arrives. The
/// connection is always released before returning. Setup failures are
/// returned; a failure after login is reported and ends the session.
pub async fn run_session(
    settings: Settings,
    mut input: mpsc::UnboundedReceiver<String>,
) -> Result<(), ConnectionError> {
    let mut conn = Connection::new();
    if let Some(transcript) = Transcript::new(&settings.logging, &settings.host) {
        let observer: Arc<dyn LineObserver> = Arc::new(transcript);
        conn = conn.with_observer(observer);
    }
    let conn = Arc::new(conn);

    let result = establish(&conn, &settings).await;
    if let Err(e) = result {
        conn.disconnect().await;
        return Err(e);
    }

    let lifecycle = Arc::new(Lifecycle::new());

    let interrupt = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received");
                lifecycle.stop();
            }
        })
    };

    let input_task = {
        let conn = conn.clone();
        let lifecycle = lifecycle.clone();
        let dispatcher = CommandDispatcher::with_builtins();
        tokio::spawn(async move {
            input::run_input_loop(&mut input, &dispatcher, &*conn, &lifecycle).await
        })
    };

    let responders = responders(&settings.behavior);
    let outcome = receive::run_receive_loop(&conn, &responders, &lifecycle).await;
    if let Err(e) = &outcome {
        println!("{}", e);
    }

    lifecycle.stop();
    interrupt.abort();
    match input_task.await {
        Ok(exit) => debug!(?exit, "input loop joined"),
        Err(e) => debug!(error = %e, "input task ended abnormally"),
    }

    conn.disconnect().await;
    println!("Disconnected.");
    Ok(())
}

async fn establish(conn: &Connection, settings: &Settings) -> Result<(), ConnectionError> {
    conn.init_socket().await?;
    println!("Socket initialized. Connecting...");

    conn.connect(&settings.host, settings.port).await?;
    debug!(peer = ?conn.peer_addr(), "tcp handshake complete");
    println!("Connected. Logging in...");

    conn.login(&settings.credentials).await?;
    println!("Logged.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use crate::irc::connection::Credentials;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn settings(port: u16) -> Settings {
        Settings {
            host: "127.0.0.1".into(),
            port,
            credentials: Credentials {
                nick: "aion".into(),
                user: "ircx".into(),
                pass: None,
                realname: "ircx".into(),
            },
            behavior: BehaviorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_responders_follow_behavior() {
        assert_eq!(responders(&BehaviorConfig::default()).len(), 2);
        let quiet = BehaviorConfig {
            reply_ping: false,
            reply_ctcp_version: false,
            ..BehaviorConfig::default()
        };
        assert!(responders(&quiet).is_empty());
    }

    #[tokio::test]
    async fn test_session_relays_input_until_quit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut seen = Vec::new();
            for _ in 0..2 {
                seen.push(lines.next_line().await.unwrap().unwrap());
            }
            write.write_all(b":srv 001 aion :Welcome\r\n").await.unwrap();
            tx.send("/join rust".to_string()).unwrap();
            seen.push(lines.next_line().await.unwrap().unwrap());
            tx.send("quit".to_string()).unwrap();
            // Session closes its side after quit.
            assert!(lines.next_line().await.unwrap().is_none());
            seen
        });

        tokio::time::timeout(Duration::from_secs(5), run_session(settings(port), rx))
            .await
            .unwrap()
            .unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen, vec!["NICK aion", "USER ircx 8 * :ircx", "JOIN #rust"]);
    }

    #[tokio::test]
    async fn test_session_reports_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (_tx, rx) = mpsc::unbounded_channel();
        let result = run_session(settings(port), rx).await;
        assert!(matches!(result, Err(ConnectionError::Connect { .. })));
    }
}
