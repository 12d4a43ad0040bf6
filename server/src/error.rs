//! Error types for the server process and for individual connections

use crate::config::ConfigError;
use crate::dictionary::DictionaryError;
use shared::LineError;
use std::net::SocketAddr;
use thiserror::Error;

/// Failures that stop the server. Nothing client-scoped ends up here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why a single client was dropped
///
/// These never propagate past the event loop; they only end up in the logs.
#[derive(Debug, Error)]
pub enum DisconnectReason {
    #[error("connection closed by peer")]
    Closed,
    #[error("read failed: {0}")]
    ReadFailed(std::io::Error),
    #[error("write failed")]
    WriteFailed,
    #[error("outbound queue full")]
    QueueFull,
    #[error("protocol violation: {0}")]
    Protocol(#[from] LineError),
}

impl DisconnectReason {
    /// True for ordinary hang-ups, as opposed to misbehaving or broken peers
    pub fn is_graceful(&self) -> bool {
        matches!(self, DisconnectReason::Closed)
    }
}
