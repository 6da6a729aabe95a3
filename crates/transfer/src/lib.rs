//! One-shot file transfer between Wi-Fi Direct peers.
//!
//! After group negotiation completes, the elected group owner receives and
//! the other peer sends: the owner binds a well-known port, accepts exactly
//! one inbound connection, and drains it into a file; the peer dials the
//! owner and streams a local file into the socket.
//!
//! # Wire format
//!
//! A raw, unbounded byte stream copied verbatim — no framing, no length
//! prefix, no handshake, no checksum. End-of-stream is the only completion
//! signal, so the receiver cannot distinguish truncation from a finished
//! transfer. This is a known property of the protocol, kept for
//! compatibility rather than hardened away.

pub mod client;
pub mod copy;
pub mod error;
pub mod server;
pub mod session;

pub use client::FileSender;
pub use copy::copy_stream;
pub use error::TransferError;
pub use server::FileReceiver;
pub use session::{
    GroupInfo, SessionConfig, SessionHandle, SessionOutcome, TransferEndpoint, TransferRole,
    spawn_receive, spawn_send, start_session,
};

use std::time::Duration;

/// Well-known TCP port the group owner listens on.
pub const TRANSFER_PORT: u16 = 8988;

/// Stream-copy buffer size (1 KiB).
pub const COPY_BUFFER_SIZE: usize = 1024;

/// Default bound on the peer's connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
