//! Network receive loop.

use tracing::debug;

use super::lifecycle::Lifecycle;
use crate::irc::connection::Connection;
use crate::irc::error::ConnectionError;
use crate::irc::message;
use crate::irc::responder::InboundHandler;

/// Print every inbound line and let the responders answer it.
///
/// Runs while the connection is up and `lifecycle` is running. A stop request
/// interrupts a pending receive. Transport errors end the loop and are
/// returned; they are never retried.
pub async fn run_receive_loop(
    conn: &Connection,
    responders: &[Box<dyn InboundHandler>],
    lifecycle: &Lifecycle,
) -> Result<(), ConnectionError> {
    while conn.connected() && lifecycle.is_running() {
        let lines = tokio::select! {
            received = conn.receive() => received?,
            _ = lifecycle.stopped() => break,
        };

        for line in lines {
            handle_line(conn, responders, &line).await?;
        }
    }

    debug!(state = %conn.state(), running = lifecycle.is_running(), "receive loop finished");
    Ok(())
}

async fn handle_line(
    conn: &Connection,
    responders: &[Box<dyn InboundHandler>],
    line: &str,
) -> Result<(), ConnectionError> {
    let Some(msg) = message::parse(line) else {
        println!("{}", line);
        return Ok(());
    };
    println!("{}", message::render(&msg));

    for responder in responders {
        if let Some(reply) = responder.respond(&msg) {
            conn.send_irc(&message::to_line(&reply)).await?;
        }
    }
    Ok(())
}
