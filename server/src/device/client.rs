use std::path::Path;

use pod_common::{parse_device_status, DeviceStatus};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::commands::Command;
use super::queue::CommandQueue;
use super::transport::UnixSocketServer;
use super::{DeviceError, SEPARATOR};

/// Argument the firmware expects for commands that carry no payload.
pub const EMPTY_ARG: &str = "empty";

/// Typed command/response API over one device connection. Cheap to clone;
/// all clones share the same sequential command queue.
#[derive(Clone)]
pub struct PodClient {
    queue: CommandQueue,
}

impl PodClient {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self {
            queue: CommandQueue::spawn(stream),
        }
    }

    /// Sends one framed request and returns the device's response text.
    pub async fn send_message(&self, message: &str) -> Result<String, DeviceError> {
        debug!(%message, "sending message to device socket");
        let mut frame = Vec::with_capacity(message.len() + SEPARATOR.len());
        frame.extend_from_slice(message.as_bytes());
        frame.extend_from_slice(SEPARATOR);

        let response = self.queue.exec(frame).await?;
        debug!(%message, "message sent to device socket");
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    /// Sends a symbolic command with an argument. Embedded newlines would
    /// corrupt the line-based framing, so they are stripped from the arg.
    pub async fn call_function(&self, command: Command, arg: &str) -> Result<String, DeviceError> {
        debug!(%command, %arg, "calling device function");
        let cleaned;
        let arg = if arg.contains('\n') {
            cleaned = arg.replace('\n', "");
            cleaned.as_str()
        } else {
            arg
        };
        self.send_message(&format!("{}\n{}", command.code(), arg)).await
    }

    pub async fn get_device_status(&self) -> Result<DeviceStatus, DeviceError> {
        let response = self.send_message(Command::DeviceStatus.code()).await?;
        Ok(parse_device_status(&response)?)
    }

    /// Destroys the underlying socket if not already destroyed. Idempotent.
    pub fn close(&self) {
        self.queue.close();
    }
}

/// Owns the socket listener plus the current client, rebuilding the client
/// lazily after a failure: a transport error drops the cached client and
/// the next command waits for the device to reconnect.
pub struct DeviceManager {
    server: UnixSocketServer,
    current: Mutex<Option<PodClient>>,
}

impl DeviceManager {
    pub async fn start(socket_path: &Path) -> Result<Self, DeviceError> {
        Ok(Self {
            server: UnixSocketServer::start(socket_path).await?,
            current: Mutex::new(None),
        })
    }

    /// Returns the current client, waiting for the device to connect when
    /// there is none.
    pub async fn client(&self) -> Result<PodClient, DeviceError> {
        let mut slot = self.current.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let stream = self.server.wait_for_connection().await?;
        debug!("device connected");
        let client = PodClient::from_stream(stream);
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Drops the cached client so the next call reconnects.
    pub async fn reset(&self) {
        let mut slot = self.current.lock().await;
        if let Some(client) = slot.take() {
            client.close();
        }
    }

    /// Executes one symbolic command against the device, discarding the
    /// cached connection on failure so the caller's retry reconnects.
    pub async fn execute_function(&self, command: Command, arg: &str) -> Result<String, DeviceError> {
        let client = self.client().await?;
        match client.call_function(command, arg).await {
            Ok(response) => {
                debug!(%command, "device response: {response}");
                Ok(response)
            }
            Err(err) => {
                warn!(%command, "device command failed, dropping connection: {err}");
                self.reset().await;
                Err(err)
            }
        }
    }

    pub async fn device_status(&self) -> Result<DeviceStatus, DeviceError> {
        let client = self.client().await?;
        match client.get_device_status().await {
            Ok(status) => Ok(status),
            Err(err @ DeviceError::MalformedStatus(_)) => Err(err),
            Err(err) => {
                warn!("device status query failed, dropping connection: {err}");
                self.reset().await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;
    use super::super::framer::MessageFramer;

    const STATUS_BODY: &str = "tgHeatLevelR = 100\n\
                               tgHeatLevelL = -100\n\
                               heatTimeL = 600\n\
                               heatLevelL = 0\n\
                               heatTimeR = 0\n\
                               heatLevelR = 0\n\
                               sensorLabel = lab\n\
                               waterLevel = true\n\
                               priming = false\n\
                               settings = a0";

    #[tokio::test(start_paused = true)]
    async fn decodes_a_status_query_end_to_end() {
        let (local, remote) = tokio::io::duplex(4096);
        let client = PodClient::from_stream(local);

        tokio::spawn(async move {
            let (read_half, mut write_half) = tokio::io::split(remote);
            let mut framer = MessageFramer::new(read_half, SEPARATOR);
            let request = framer.read_message().await.unwrap();
            assert_eq!(request, Command::DeviceStatus.code().as_bytes());
            write_half
                .write_all(format!("{STATUS_BODY}\n\n").as_bytes())
                .await
                .unwrap();
        });

        let status = client.get_device_status().await.unwrap();
        assert!(status.left.is_on);
        assert_eq!(status.left.target_temperature_f, 55);
        assert_eq!(status.right.target_temperature_f, 110);
        assert_eq!(status.left.current_temperature_f, 83);
    }

    #[tokio::test(start_paused = true)]
    async fn strips_newlines_from_function_arguments() {
        let (local, remote) = tokio::io::duplex(4096);
        let client = PodClient::from_stream(local);

        let peer = tokio::spawn(async move {
            let (read_half, mut write_half) = tokio::io::split(remote);
            let mut framer = MessageFramer::new(read_half, SEPARATOR);
            let request = framer.read_message().await.unwrap();
            write_half.write_all(b"ok\n\n").await.unwrap();
            request
        });

        client
            .call_function(Command::TempLevelLeft, "4\n2")
            .await
            .unwrap();
        assert_eq!(peer.await.unwrap(), b"11\n42");
    }
}
