//! File-receiving server (group-owner role).
//!
//! Binds the well-known port, accepts a single connection, and drains it
//! into a timestamp-named file under the output directory. The listener is
//! dropped after the one accept; this is not a long-lived service.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::COPY_BUFFER_SIZE;
use crate::copy::copy_stream;
use crate::error::TransferError;

/// One-shot file receiver.
///
/// Each instance serves exactly one transfer: bind, accept one peer,
/// receive the stream, report the materialized path. Surfacing the file to
/// the user afterwards is the caller's concern.
pub struct FileReceiver {
    output_dir: PathBuf,
    cancel: CancellationToken,
}

impl FileReceiver {
    pub fn new(output_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self { output_dir, cancel }
    }

    /// Binds the listening socket.
    ///
    /// A port that cannot be claimed is fatal for the session; nothing is
    /// retried.
    pub async fn bind(&self, port: u16) -> Result<TcpListener, TransferError> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(TransferError::BindFailed)?;
        info!(port = listener.local_addr()?.port(), "receiver listening");
        Ok(listener)
    }

    /// Accepts one connection and receives its stream into a new file.
    ///
    /// Waits for the peer under the cancellation token and the optional
    /// `accept_timeout` (unbounded when `None`). The output directory is
    /// created if missing and the destination is named with a millisecond
    /// timestamp so consecutive transfers never collide. On a mid-copy
    /// failure the partial file is left in place.
    ///
    /// Returns the path of the materialized file.
    pub async fn accept_and_receive(
        &self,
        listener: TcpListener,
        accept_timeout: Option<Duration>,
        progress: Option<&mpsc::Sender<u64>>,
    ) -> Result<PathBuf, TransferError> {
        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(TransferError::Cancelled);
            }
            result = accept_one(&listener, accept_timeout) => result?,
        };

        // Drop the listener — exactly one connection per session, so a
        // second dial is refused from here on.
        drop(listener);

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let dest = self
            .output_dir
            .join(format!("recv-{}.bin", Utc::now().timestamp_millis()));
        let file = tokio::fs::File::create(&dest).await?;

        let bytes = copy_stream(stream, file, COPY_BUFFER_SIZE, &self.cancel, progress).await?;
        info!(bytes, path = %dest.display(), "file received");
        Ok(dest)
    }

    /// Binds and receives in one call.
    pub async fn run(
        &self,
        port: u16,
        accept_timeout: Option<Duration>,
        progress: Option<&mpsc::Sender<u64>>,
    ) -> Result<PathBuf, TransferError> {
        let listener = self.bind(port).await?;
        self.accept_and_receive(listener, accept_timeout, progress)
            .await
    }
}

async fn accept_one(
    listener: &TcpListener,
    accept_timeout: Option<Duration>,
) -> Result<TcpStream, TransferError> {
    let (stream, addr) = match accept_timeout {
        Some(bound) => match tokio::time::timeout(bound, listener.accept()).await {
            Ok(result) => result?,
            Err(_) => return Err(TransferError::AcceptTimeout),
        },
        None => listener.accept().await?,
    };
    info!(%addr, "peer connected");
    Ok(stream)
}
