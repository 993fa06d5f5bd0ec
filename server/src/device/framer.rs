use tokio::io::{AsyncRead, AsyncReadExt};

use super::DeviceError;

const READ_CHUNK_BYTES: usize = 4096;

/// Reassembles discrete messages out of a raw byte stream, delimited by a
/// fixed separator. Bytes after a separator stay buffered for the next
/// message, and separators split across read chunks are handled.
pub struct MessageFramer<R> {
    reader: R,
    separator: Vec<u8>,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> MessageFramer<R> {
    pub fn new(reader: R, separator: &[u8]) -> Self {
        Self {
            reader,
            separator: separator.to_vec(),
            buffer: Vec::new(),
        }
    }

    /// Suspends until a complete message is available, then returns it
    /// without the separator. Fails with [`DeviceError::StreamEnded`] if
    /// the stream closes before a terminator arrives.
    pub async fn read_message(&mut self) -> Result<Vec<u8>, DeviceError> {
        loop {
            if let Some(index) = find_separator(&self.buffer, &self.separator) {
                let message = self.buffer[..index].to_vec();
                self.buffer.drain(..index + self.separator.len());
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_BYTES];
            let read = self.reader.read(&mut chunk).await?;
            if read == 0 {
                return Err(DeviceError::StreamEnded);
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }
}

fn find_separator(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::device::SEPARATOR;

    #[tokio::test]
    async fn yields_messages_split_across_arbitrary_chunks() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = MessageFramer::new(rx, SEPARATOR);

        let writer = tokio::spawn(async move {
            // Split mid-message and mid-separator.
            for chunk in [&b"hel"[..], b"lo\n", b"\nwor", b"ld\n\nrest\n\n"] {
                tx.write_all(chunk).await.unwrap();
            }
        });

        assert_eq!(framer.read_message().await.unwrap(), b"hello");
        assert_eq!(framer.read_message().await.unwrap(), b"world");
        assert_eq!(framer.read_message().await.unwrap(), b"rest");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn keeps_residual_bytes_for_the_next_message() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = MessageFramer::new(rx, SEPARATOR);

        tx.write_all(b"first\n\nsecond\n\n").await.unwrap();
        assert_eq!(framer.read_message().await.unwrap(), b"first");
        assert_eq!(framer.read_message().await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn errors_when_the_stream_ends_mid_message() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = MessageFramer::new(rx, SEPARATOR);

        tx.write_all(b"dangling").await.unwrap();
        drop(tx);

        assert!(matches!(
            framer.read_message().await,
            Err(DeviceError::StreamEnded)
        ));
    }
}
