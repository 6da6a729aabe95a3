//! Buffer-driven stream copy shared by both roles.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TransferError;

/// Drains `reader` into `writer` using a fixed-size buffer.
///
/// A zero-byte read is normal completion, not an error. Both streams are
/// consumed: the writer is shut down on the way out (escalated on the
/// success path since an unflushed sink means undelivered bytes,
/// best-effort on the failure path) and the reader is dropped, so callers
/// cannot reuse or re-close either end.
///
/// Cancellation is checked once per iteration. Cumulative byte counts are
/// pushed through `progress` without blocking; a full channel drops the
/// update rather than stalling the copy.
///
/// Returns the number of bytes copied.
pub async fn copy_stream<R, W>(
    mut reader: R,
    mut writer: W,
    buffer_size: usize,
    cancel: &CancellationToken,
    progress: Option<&mpsc::Sender<u64>>,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    let mut total: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            let _ = writer.shutdown().await;
            return Err(TransferError::Cancelled);
        }

        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                let _ = writer.shutdown().await;
                return Err(TransferError::Io(e));
            }
        };

        if let Err(e) = writer.write_all(&buf[..n]).await {
            let _ = writer.shutdown().await;
            return Err(TransferError::Io(e));
        }
        total += n as u64;

        if let Some(tx) = progress {
            let _ = tx.try_send(total);
        }
    }

    writer.shutdown().await?;
    debug!(total, "stream copy complete");
    Ok(total)
}
