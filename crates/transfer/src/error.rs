//! Error types for the transfer core.

/// Errors produced by a transfer session.
///
/// Every failure is terminal for its session; nothing is retried
/// internally. The caller surfaces the error and may retry the whole
/// negotiation.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The receiver could not claim its listening port.
    #[error("failed to bind listening socket: {0}")]
    BindFailed(#[source] std::io::Error),

    /// The sender could not reach the group owner (refused or timed out).
    #[error("failed to connect to group owner: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The sender's source file could not be opened.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[source] std::io::Error),

    /// A read or write failed mid-copy. The receiver keeps whatever bytes
    /// landed before the failure; there is no rollback.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The optional accept bound elapsed before a peer connected.
    #[error("timed out waiting for a peer connection")]
    AcceptTimeout,

    #[error("cancelled")]
    Cancelled,
}
