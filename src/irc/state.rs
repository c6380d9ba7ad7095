//! Connection lifecycle state.
//!
//! The state only ever moves forward:
//! `Unconnected -> SocketReady -> Connected -> Disconnected`. Any failure jumps
//! straight to `Disconnected`, which is terminal. The cell is shared between
//! the input and receive sides, so every transition is a single atomic
//! operation and is visible to the other side immediately.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    Unconnected = 0,
    SocketReady = 1,
    Connected = 2,
    Disconnected = 3,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Unconnected,
            1 => Self::SocketReady,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconnected => "unconnected",
            Self::SocketReady => "socket ready",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Unconnected as u8))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`. Fails with the observed state if the cell
    /// was not in `from`.
    pub fn advance(&self, from: ConnectionState, to: ConnectionState) -> Result<(), ConnectionState> {
        debug_assert!(from < to);
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ConnectionState::from_u8)
    }

    /// Force the terminal state. Returns `true` only for the call that
    /// actually performed the transition.
    pub fn close(&self) -> bool {
        self.0.swap(ConnectionState::Disconnected as u8, Ordering::AcqRel)
            != ConnectionState::Disconnected as u8
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
