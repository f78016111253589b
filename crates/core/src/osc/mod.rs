pub mod codec;
pub mod transport;

use thiserror::Error;

pub use transport::{resolve, OscListener, OscSender};

pub const DEFAULT_PORT: u16 = 5005;
pub const DEFAULT_CHANNEL: &str = "/midi";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not resolve hostname '{host}' to an IP address")]
    Resolve { host: String },
    #[error("failed to encode OSC packet: {0}")]
    Encode(String),
    #[error("failed to decode OSC packet: {0}")]
    Decode(String),
    #[error("{addr}: expected 3 arguments, got {count}")]
    Arity { addr: String, count: usize },
    #[error("{addr}: argument {index} is not numeric ({found})")]
    ArgumentType {
        addr: String,
        index: usize,
        found: String,
    },
    #[error("{addr}: argument {index} = {value} is outside 0..=255")]
    OutOfRange {
        addr: String,
        index: usize,
        value: i64,
    },
}
