use std::io::ErrorKind;
use std::path::Path;
use std::task::Poll;

use tokio::net::{UnixListener, UnixStream};
use tracing::debug;

use super::DeviceError;

/// Persistent-listener acceptor for the device socket. The physical pod is
/// the client that connects to us; only one connection is meaningful at a
/// time, and a reconnect means the previous socket is dead or stale.
pub struct UnixSocketServer {
    listener: UnixListener,
}

impl UnixSocketServer {
    /// Binds the listener, removing a stale socket file left over from a
    /// previous run first. A missing file is fine; any other cleanup
    /// failure is fatal to startup.
    pub async fn start(path: &Path) -> Result<Self, DeviceError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "removed stale socket file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let listener = UnixListener::bind(path)?;
        debug!(path = %path.display(), "listening for device connection");
        Ok(Self { listener })
    }

    /// Returns the freshest connection: suspends until one arrives, then
    /// drains any additional pending connections, dropping the older ones.
    pub async fn wait_for_connection(&self) -> Result<UnixStream, DeviceError> {
        let (mut stream, _) = self.listener.accept().await?;
        while let Some(result) = self.try_accept().await {
            debug!("device reconnected, dropping the previous pending socket");
            (stream, _) = result?;
        }
        Ok(stream)
    }

    async fn try_accept(
        &self,
    ) -> Option<std::io::Result<(UnixStream, tokio::net::unix::SocketAddr)>> {
        std::future::poll_fn(|cx| match self.listener.poll_accept(cx) {
            Poll::Ready(result) => Poll::Ready(Some(result)),
            Poll::Pending => Poll::Ready(None),
        })
        .await
    }
}
