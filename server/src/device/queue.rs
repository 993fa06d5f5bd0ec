use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::framer::MessageFramer;
use super::{DeviceError, SEPARATOR, SETTLE_DELAY};

enum Request {
    Exec {
        frame: Vec<u8>,
        reply: oneshot::Sender<Result<Vec<u8>, DeviceError>>,
    },
    Shutdown,
}

/// Strict FIFO execution lane for the shared device connection. A single
/// worker task owns the stream halves, so any number of concurrent callers
/// collapse into one consumer and no two request/response cycles ever
/// interleave. A failed request reports on its own reply channel and never
/// wedges the ones queued behind it.
#[derive(Clone)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<Request>,
}

impl CommandQueue {
    pub fn spawn<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(stream, rx));
        Self { tx }
    }

    /// Submits one complete wire frame and waits for the next framed
    /// response. Completion order matches submission order.
    pub async fn exec(&self, frame: Vec<u8>) -> Result<Vec<u8>, DeviceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request::Exec {
                frame,
                reply: reply_tx,
            })
            .map_err(|_| DeviceError::Closed)?;
        reply_rx.await.map_err(|_| DeviceError::Closed)?
    }

    /// Stops the worker and drops the stream. Idempotent.
    pub fn close(&self) {
        let _ = self.tx.send(Request::Shutdown);
    }
}

async fn run_worker<S>(stream: S, mut rx: mpsc::UnboundedReceiver<Request>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut framer = MessageFramer::new(read_half, SEPARATOR);

    while let Some(request) = rx.recv().await {
        match request {
            Request::Exec { frame, reply } => {
                let result = exchange(&mut write_half, &mut framer, &frame).await;
                if result.is_ok() {
                    // Give the device idle time before the next command.
                    tokio::time::sleep(SETTLE_DELAY).await;
                }
                // The caller may have given up; that is not the queue's problem.
                let _ = reply.send(result);
            }
            Request::Shutdown => break,
        }
    }
    debug!("device command worker stopped");
}

async fn exchange<R, W>(
    write_half: &mut W,
    framer: &mut MessageFramer<R>,
    frame: &[u8],
) -> Result<Vec<u8>, DeviceError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_half.write_all(frame).await?;
    write_half.flush().await?;
    framer.read_message().await
}
