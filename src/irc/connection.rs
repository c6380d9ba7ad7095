//! The single IRC server connection and its lifecycle.
//!
//! [`Connection`] is shared by the input side (which sends) and the receive
//! side (which reads). The TCP stream is split into independent halves, each
//! behind its own lock: concurrent send and receive never contend, while two
//! sends are serialized so a line always reaches the socket whole. The
//! lifecycle state lives in a [`StateCell`] so a failure observed on one side
//! is visible to the other without taking either lock.

use async_trait::async_trait;
use futures::{FutureExt, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpSocket;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use super::error::{ConnectionError, Result};
use super::framer::LineFramer;
use super::state::{ConnectionState, StateCell};

/// Identity sent during registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub nick: String,
    pub user: String,
    pub pass: Option<String>,
    pub realname: String,
}

/// Anything that accepts outgoing protocol lines.
#[async_trait]
pub trait LineSink: Send + Sync {
    async fn send_irc(&self, line: &str) -> Result<()>;
}

/// Sees every line that crosses the wire, in either direction.
pub trait LineObserver: Send + Sync {
    fn inbound(&self, line: &str);
    fn outbound(&self, line: &str);
}

struct Inbound {
    frames: FramedRead<OwnedReadHalf, LineFramer>,
    /// Set when the stream ended while draining already-buffered lines; the
    /// next receive reports it.
    closed: Option<String>,
}

pub struct Connection {
    state: StateCell,
    socket: Mutex<Option<TcpSocket>>,
    writer: Mutex<Option<FramedWrite<OwnedWriteHalf, LineFramer>>>,
    reader: Mutex<Option<Inbound>>,
    peer: OnceLock<SocketAddr>,
    observer: Option<Arc<dyn LineObserver>>,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            state: StateCell::new(),
            socket: Mutex::new(None),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            peer: OnceLock::new(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Non-blocking; safe from any task.
    pub fn connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer.get().copied()
    }

    fn expect_state(&self, expected: ConnectionState, operation: &'static str) -> Result<()> {
        match self.state.get() {
            state if state == expected => Ok(()),
            ConnectionState::Disconnected => Err(ConnectionError::closed("connection already closed")),
            state => Err(ConnectionError::InvalidState { operation, state }),
        }
    }

    fn advance(&self, from: ConnectionState, to: ConnectionState, operation: &'static str) -> Result<()> {
        self.state
            .advance(from, to)
            .map_err(|state| ConnectionError::InvalidState { operation, state })
    }

    /// Allocate the TCP endpoint. Valid only from `Unconnected`.
    pub async fn init_socket(&self) -> Result<()> {
        self.expect_state(ConnectionState::Unconnected, "init_socket")?;

        let socket = match TcpSocket::new_v4() {
            Ok(socket) => socket,
            Err(e) => {
                self.state.close();
                return Err(ConnectionError::Socket(e));
            }
        };
        *self.socket.lock().await = Some(socket);
        self.advance(ConnectionState::Unconnected, ConnectionState::SocketReady, "init_socket")
    }

    /// Resolve `host` and complete the TCP handshake. Valid only from
    /// `SocketReady`. IPv4 addresses are preferred; if the host only has IPv6
    /// addresses the endpoint is reallocated for that family.
    pub async fn connect(&self, host: &str, port: u16) -> Result<()> {
        self.expect_state(ConnectionState::SocketReady, "connect")?;

        let addr = match resolve(host, port).await {
            Ok(addr) => addr,
            Err(source) => {
                self.state.close();
                return Err(ConnectionError::Resolve {
                    host: host.to_string(),
                    port,
                    source,
                });
            }
        };

        let connect_error = |source| ConnectionError::Connect {
            host: host.to_string(),
            port,
            source,
        };

        let socket = match self.socket.lock().await.take() {
            Some(socket) if addr.is_ipv4() => Ok(socket),
            _ if addr.is_ipv4() => TcpSocket::new_v4(),
            _ => TcpSocket::new_v6(),
        };

        let stream = match socket {
            Ok(socket) => socket.connect(addr).await,
            Err(e) => Err(e),
        };
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                self.state.close();
                return Err(connect_error(e));
            }
        };

        let _ = self.peer.set(addr);
        let (read_half, write_half) = stream.into_split();
        *self.reader.lock().await = Some(Inbound {
            frames: FramedRead::new(read_half, LineFramer::new()),
            closed: None,
        });
        *self.writer.lock().await = Some(FramedWrite::new(write_half, LineFramer::new()));

        self.advance(ConnectionState::SocketReady, ConnectionState::Connected, "connect")?;
        info!(host, port, %addr, "connected");
        Ok(())
    }

    /// Send the registration sequence: `PASS` (if any), `NICK`, `USER`.
    ///
    /// This does not wait for the server's welcome. A rejected registration
    /// shows up later in the receive loop, as an error numeric or as the
    /// server closing the connection.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        if let Some(pass) = credentials.pass.as_deref() {
            self.send_irc(&format!("PASS {}", pass)).await?;
        }
        self.send_irc(&format!("NICK {}", credentials.nick)).await?;
        self.send_irc(&format!(
            "USER {} 8 * :{}",
            credentials.user, credentials.realname
        ))
        .await
    }

    /// Send one protocol line. The terminator is added here.
    ///
    /// A line with an embedded CR/LF or over the length limit is refused
    /// without touching the connection; a write failure closes it.
    pub async fn send_irc(&self, line: &str) -> Result<()> {
        self.expect_state(ConnectionState::Connected, "send")?;

        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| ConnectionError::closed("socket released"))?;

        writer
            .encoder()
            .validate_outgoing(line)
            .map_err(ConnectionError::InvalidLine)?;

        if let Err(e) = writer.send(line.to_string()).await {
            self.state.close();
            warn!(error = %e, "send failed, closing connection");
            return Err(ConnectionError::Send(e));
        }

        debug!(line, ">>");
        if let Some(observer) = &self.observer {
            observer.outbound(line);
        }
        Ok(())
    }

    /// Wait for at least one complete line, then return it together with any
    /// further lines that are already buffered.
    ///
    /// End of stream or a read/framing error closes the connection and is
    /// reported as [`ConnectionError::ConnectionClosed`].
    pub async fn receive(&self) -> Result<Vec<String>> {
        self.expect_state(ConnectionState::Connected, "receive")?;

        let mut guard = self.reader.lock().await;
        let result = match guard.as_mut() {
            Some(inbound) => self.read_lines(inbound).await,
            None => Err(ConnectionError::closed("socket released")),
        };

        // A disconnect that raced with this receive could not take the read
        // half; release it here.
        if self.state.get() == ConnectionState::Disconnected {
            guard.take();
        }
        result
    }

    async fn read_lines(&self, inbound: &mut Inbound) -> Result<Vec<String>> {
        if let Some(reason) = inbound.closed.take() {
            self.state.close();
            return Err(ConnectionError::closed(reason));
        }

        let first = match inbound.frames.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                self.state.close();
                return Err(ConnectionError::closed(e.to_string()));
            }
            None => {
                self.state.close();
                return Err(ConnectionError::closed("server closed the connection"));
            }
        };

        let mut lines = vec![first];
        while let Some(next) = inbound.frames.next().now_or_never() {
            match next {
                Some(Ok(line)) => lines.push(line),
                Some(Err(e)) => {
                    inbound.closed = Some(e.to_string());
                    break;
                }
                None => {
                    inbound.closed = Some("server closed the connection".to_string());
                    break;
                }
            }
        }

        for line in &lines {
            debug!(line = line.as_str(), "<<");
            if let Some(observer) = &self.observer {
                observer.inbound(line);
            }
        }
        Ok(lines)
    }

    /// Release the socket. Calling this on a closed connection is a no-op.
    ///
    /// The write half is shut down at once. If a receive is in flight the
    /// read half stays with that call and is dropped when it returns. A
    /// receive that is cancelled instead leaves it for the next `disconnect`.
    pub async fn disconnect(&self) {
        let was_open = self.state.close();

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.get_mut().shutdown().await {
                debug!(error = %e, "shutdown of write half failed");
            }
        }
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.take();
        }
        self.socket.lock().await.take();

        if was_open {
            info!("disconnected");
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSink for Connection {
    async fn send_irc(&self, line: &str) -> Result<()> {
        Connection::send_irc(self, line).await
    }
}

async fn resolve(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port)).await?.collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "host resolved to no addresses",
            )
        })
}
