//! IRC protocol layer: framing, parsing, commands and the connection.

pub mod codec;
pub mod commands;
pub mod connection;
pub mod manager;
pub mod message;
