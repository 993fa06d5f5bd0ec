//! Everything that talks to the physical pod over its Unix domain socket:
//! the connection acceptor, message framing, the sequential command queue
//! and the typed client on top.

mod client;
mod commands;
mod framer;
mod queue;
mod transport;

use std::time::Duration;

use pod_common::MalformedStatus;
use thiserror::Error;

pub use client::{DeviceManager, PodClient, EMPTY_ARG};
pub use commands::Command;
pub use framer::MessageFramer;
pub use queue::CommandQueue;
pub use transport::UnixSocketServer;

/// Fixed byte sequence marking the end of one protocol message.
pub const SEPARATOR: &[u8] = b"\n\n";

/// Idle time the device needs between consecutive commands. Encoded as an
/// explicit post-response wait in the queue worker, not as a retry.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("device stream ended before a message terminator")]
    StreamEnded,
    #[error("device connection is closed")]
    Closed,
    #[error(transparent)]
    MalformedStatus(#[from] MalformedStatus),
}
