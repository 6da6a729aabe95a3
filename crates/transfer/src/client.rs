//! File-sending client (peer role).
//!
//! Opens the source file, dials the group owner's endpoint with a bounded
//! connection attempt, and streams the file. There is no acknowledgement
//! from the far side; the socket shutdown is the only end-of-transfer
//! signal the owner receives.

use std::path::Path;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::COPY_BUFFER_SIZE;
use crate::copy::copy_stream;
use crate::error::TransferError;
use crate::session::TransferEndpoint;

/// One-shot file sender.
pub struct FileSender;

impl FileSender {
    /// Opens `source`, connects to the owner endpoint, and streams the
    /// file until exhaustion.
    ///
    /// The source is opened before dialing — a missing file should not
    /// cost a connection attempt. A refused or timed-out dial yields
    /// [`TransferError::ConnectFailed`]. The socket is shut down by the
    /// copy on every exit path; the final teardown happens on drop and is
    /// never escalated.
    ///
    /// Returns the number of bytes sent.
    pub async fn connect_and_send(
        endpoint: &TransferEndpoint,
        source: &Path,
        connect_timeout: Duration,
        cancel: &CancellationToken,
        progress: Option<&mpsc::Sender<u64>>,
    ) -> Result<u64, TransferError> {
        let file = tokio::fs::File::open(source)
            .await
            .map_err(TransferError::SourceUnavailable)?;

        let addr = endpoint.socket_addr();
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(TransferError::Cancelled);
            }
            result = tokio::time::timeout(connect_timeout, TcpStream::connect(addr)) => {
                match result {
                    Ok(Ok(s)) => {
                        info!(%addr, "connected to group owner");
                        s
                    }
                    Ok(Err(e)) => return Err(TransferError::ConnectFailed(e)),
                    Err(_) => {
                        return Err(TransferError::ConnectFailed(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "connection attempt timed out",
                        )));
                    }
                }
            }
        };

        let bytes = copy_stream(file, stream, COPY_BUFFER_SIZE, cancel, progress).await?;
        info!(bytes, source = %source.display(), "file sent");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::FileReceiver;
    use std::net::{IpAddr, Ipv4Addr};

    fn localhost(port: u16) -> TransferEndpoint {
        TransferEndpoint::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    fn write_source(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Integration test: sender -> receiver full round trip.
    #[tokio::test]
    async fn round_trip() {
        let recv_dir = tempfile::tempdir().unwrap();
        let send_dir = tempfile::tempdir().unwrap();
        let data = vec![0xC3u8; 50_000];
        let source = write_source(send_dir.path(), "photo.jpg", &data);

        let cancel = CancellationToken::new();
        let receiver = FileReceiver::new(recv_dir.path().to_path_buf(), cancel.clone());
        let listener = receiver.bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            receiver.accept_and_receive(listener, None, None).await
        });

        let sent =
            FileSender::connect_and_send(&localhost(port), &source, Duration::from_secs(5), &cancel, None)
                .await
                .unwrap();
        let dest = server.await.unwrap().unwrap();

        assert_eq!(sent, data.len() as u64);
        assert!(dest.starts_with(recv_dir.path()));
        assert_eq!(std::fs::read(&dest).unwrap(), data);
    }

    #[tokio::test]
    async fn empty_file_round_trip() {
        let recv_dir = tempfile::tempdir().unwrap();
        let send_dir = tempfile::tempdir().unwrap();
        let source = write_source(send_dir.path(), "empty.bin", b"");

        let cancel = CancellationToken::new();
        let receiver = FileReceiver::new(recv_dir.path().to_path_buf(), cancel.clone());
        let listener = receiver.bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            receiver.accept_and_receive(listener, None, None).await
        });

        let sent =
            FileSender::connect_and_send(&localhost(port), &source, Duration::from_secs(5), &cancel, None)
                .await
                .unwrap();
        let dest = server.await.unwrap().unwrap();

        assert_eq!(sent, 0);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_source_is_source_unavailable() {
        let cancel = CancellationToken::new();
        let result = FileSender::connect_and_send(
            &localhost(1),
            Path::new("/nonexistent/gone.bin"),
            Duration::from_millis(100),
            &cancel,
            None,
        )
        .await;
        assert!(matches!(result, Err(TransferError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn dead_port_is_connect_failed() {
        let send_dir = tempfile::tempdir().unwrap();
        let source = write_source(send_dir.path(), "data.bin", b"data");

        // Grab a port the OS knows is free, then release it so nothing
        // listens there.
        let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let cancel = CancellationToken::new();
        let result = FileSender::connect_and_send(
            &localhost(port),
            &source,
            Duration::from_secs(2),
            &cancel,
            None,
        )
        .await;
        assert!(matches!(result, Err(TransferError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn cancellation_before_dial() {
        let send_dir = tempfile::tempdir().unwrap();
        let source = write_source(send_dir.path(), "data.bin", b"data");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = FileSender::connect_and_send(
            &localhost(1),
            &source,
            Duration::from_secs(1),
            &cancel,
            None,
        )
        .await;
        assert!(matches!(result, Err(TransferError::Cancelled)));
    }

    /// After the single accepted connection completes, the listening
    /// endpoint is gone and a second dial is refused.
    #[tokio::test]
    async fn second_dial_after_session_is_refused() {
        let recv_dir = tempfile::tempdir().unwrap();
        let send_dir = tempfile::tempdir().unwrap();
        let source = write_source(send_dir.path(), "once.bin", b"only once");

        let cancel = CancellationToken::new();
        let receiver = FileReceiver::new(recv_dir.path().to_path_buf(), cancel.clone());
        let listener = receiver.bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            receiver.accept_and_receive(listener, None, None).await
        });

        FileSender::connect_and_send(&localhost(port), &source, Duration::from_secs(5), &cancel, None)
            .await
            .unwrap();
        server.await.unwrap().unwrap();

        let second = TcpStream::connect(("127.0.0.1", port)).await;
        assert!(second.is_err());
    }
}
