//! IRC protocol layer: line framing, the server connection, inbound parsing,
//! and console command dispatch.

pub mod commands;
pub mod connection;
pub mod error;
pub mod framer;
pub mod message;
pub mod responder;
pub mod state;
