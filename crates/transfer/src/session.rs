//! Session types and the role-dispatch surface consumed by the
//! negotiation layer.
//!
//! The platform's group-formation callback decides which side runs which
//! role; this module takes that result as an explicit [`GroupInfo`] value
//! (no ambient system state) and runs the role operation on a spawned
//! task, delivering the outcome over a oneshot channel.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::client::FileSender;
use crate::error::TransferError;
use crate::server::FileReceiver;
use crate::{DEFAULT_CONNECT_TIMEOUT, TRANSFER_PORT};

/// Which side of the transfer this device runs after group formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferRole {
    /// Elected group owner; always the file receiver.
    GroupOwner,
    /// Non-owner peer; always the file sender.
    Peer,
}

impl fmt::Display for TransferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferRole::GroupOwner => write!(f, "group-owner"),
            TransferRole::Peer => write!(f, "peer"),
        }
    }
}

/// Result of the platform's group-formation callback.
///
/// The owner never needs its own address — only the peer dials — so a
/// receiving side may carry an unspecified address here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupInfo {
    pub is_group_owner: bool,
    pub group_owner_address: IpAddr,
}

impl GroupInfo {
    pub fn role(&self) -> TransferRole {
        if self.is_group_owner {
            TransferRole::GroupOwner
        } else {
            TransferRole::Peer
        }
    }

    /// Endpoint the peer dials to reach the owner.
    pub fn owner_endpoint(&self, port: u16) -> TransferEndpoint {
        TransferEndpoint::new(self.group_owner_address, port)
    }
}

/// The (address, port) pair the sender dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEndpoint {
    pub address: IpAddr,
    pub port: u16,
}

impl TransferEndpoint {
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self { address, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl fmt::Display for TransferEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Per-session parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Port the owner listens on and the peer dials.
    pub port: u16,
    /// Bound on the peer's connection attempt.
    pub connect_timeout: Duration,
    /// Optional bound on the owner's accept wait; unbounded when `None`.
    pub accept_timeout: Option<Duration>,
    /// Where the owner materializes received files.
    pub output_dir: PathBuf,
}

impl SessionConfig {
    /// Config with the well-known port and default timeouts.
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            port: TRANSFER_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            accept_timeout: None,
            output_dir,
        }
    }
}

/// Successful outcome of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// Owner side: the received file's path.
    Received { path: PathBuf },
    /// Peer side: total bytes streamed to the owner.
    Sent { bytes: u64 },
}

/// Handle to a session running on a spawned task.
///
/// `outcome` resolves exactly once when the session finishes; triggering
/// `cancel` aborts the session cooperatively and resolves it with
/// [`TransferError::Cancelled`].
pub struct SessionHandle {
    pub cancel: CancellationToken,
    pub outcome: oneshot::Receiver<Result<SessionOutcome, TransferError>>,
}

/// Spawns the owner-side session: bind, accept one peer, receive the file.
pub fn spawn_receive(
    config: SessionConfig,
    progress: Option<mpsc::Sender<u64>>,
) -> SessionHandle {
    let cancel = CancellationToken::new();
    let (tx, rx) = oneshot::channel();
    let task_cancel = cancel.clone();

    tokio::spawn(async move {
        let receiver = FileReceiver::new(config.output_dir, task_cancel);
        let result = receiver
            .run(config.port, config.accept_timeout, progress.as_ref())
            .await
            .map(|path| SessionOutcome::Received { path });
        let _ = tx.send(result);
    });

    SessionHandle {
        cancel,
        outcome: rx,
    }
}

/// Spawns the peer-side session: connect to the owner and stream `source`.
pub fn spawn_send(
    config: SessionConfig,
    endpoint: TransferEndpoint,
    source: PathBuf,
    progress: Option<mpsc::Sender<u64>>,
) -> SessionHandle {
    let cancel = CancellationToken::new();
    let (tx, rx) = oneshot::channel();
    let task_cancel = cancel.clone();

    tokio::spawn(async move {
        let result = FileSender::connect_and_send(
            &endpoint,
            &source,
            config.connect_timeout,
            &task_cancel,
            progress.as_ref(),
        )
        .await
        .map(|bytes| SessionOutcome::Sent { bytes });
        let _ = tx.send(result);
    });

    SessionHandle {
        cancel,
        outcome: rx,
    }
}

/// Starts the role-appropriate session for a freshly formed group.
///
/// Owners receive; peers send, so `source` must name the payload when this
/// device is not the owner.
pub fn start_session(
    group: &GroupInfo,
    config: SessionConfig,
    source: Option<PathBuf>,
    progress: Option<mpsc::Sender<u64>>,
) -> Result<SessionHandle, TransferError> {
    match group.role() {
        TransferRole::GroupOwner => Ok(spawn_receive(config, progress)),
        TransferRole::Peer => {
            let source = source.ok_or_else(|| {
                TransferError::SourceUnavailable(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no source file selected",
                ))
            })?;
            let endpoint = group.owner_endpoint(config.port);
            Ok(spawn_send(config, endpoint, source, progress))
        }
    }
}
