//! Bidirectional stream splicing
//!
//! Copies bytes both ways between two streams. A direction that reaches a
//! clean end of stream finishes silently; a direction that fails pushes its
//! error onto the [`ErrorSink`]. A graceful close on both sides therefore
//! produces no signal at all, so whoever watches the sink must also treat
//! the sink's senders going away as completion.

use crate::error::SocksError;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Channel end that relay tasks report failures on
pub type ErrorSink = mpsc::UnboundedSender<SocksError>;

/// Receiving end paired with [`ErrorSink`]
pub type ErrorSource = mpsc::UnboundedReceiver<SocksError>;

/// Create a connected sink/source pair
pub fn error_channel() -> (ErrorSink, ErrorSource) {
    mpsc::unbounded_channel()
}

/// Join handle that aborts its task when dropped
#[derive(Debug)]
pub struct AbortOnDrop<T>(pub JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Splice `a` and `b` until both directions finish
///
/// The a→b direction runs on a spawned task, b→a runs on the caller's task.
/// Cancelling the caller also cancels the spawned half.
pub async fn splice<A, B>(a: A, b: B, errors: ErrorSink)
where
    A: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);

    let forward_errors = errors.clone();
    let mut forward = AbortOnDrop(tokio::spawn(async move {
        copy_half(&mut a_read, &mut b_write, "A->B", &forward_errors).await;
    }));

    copy_half(&mut b_read, &mut a_write, "B->A", &errors).await;

    let _ = (&mut forward.0).await;
}

async fn copy_half<R, W>(reader: &mut R, writer: &mut W, direction: &str, errors: &ErrorSink)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match tokio::io::copy(reader, writer).await {
        Ok(bytes) => {
            debug!("{} finished: {} bytes", direction, bytes);
            let _ = writer.shutdown().await;
        }
        Err(e) => {
            debug!("{} error: {}", direction, e);
            let _ = errors.send(SocksError::Io(e));
        }
    }
}
