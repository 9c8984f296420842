use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;

use crate::codec::HeadEncoder;
use crate::protocol::{MessageHead, SendError};

/// Size of the chunks a payload is copied in
pub const PAYLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// Buffered writer for one side of a connection.
///
/// Heads are encoded into the buffer, payloads are appended chunk by chunk, and the buffer is
/// written out whenever a chunk fills up or [`flush`](Self::flush) is called. A small payload
/// therefore leaves in the same write as its head.
#[derive(Debug)]
pub struct MessageWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: HeadEncoder,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, PAYLOAD_CHUNK_SIZE)
    }

    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), encoder: HeadEncoder }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Encodes `head` into the buffer without touching the underlying writer.
    #[inline]
    pub fn write_head<T: MessageHead>(&mut self, head: &T) -> Result<(), SendError> {
        self.encoder.encode(head, &mut self.buffer)
    }

    /// Copies `payload` until it is exhausted, in chunks of [`PAYLOAD_CHUNK_SIZE`] bytes.
    ///
    /// Returns the number of payload bytes copied. The last partial chunk stays buffered.
    pub async fn write_payload<P>(&mut self, payload: &mut P) -> Result<u64, SendError>
    where
        P: AsyncRead + Unpin + ?Sized,
    {
        let mut chunk = vec![0u8; PAYLOAD_CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let n = payload.read(&mut chunk).await?;
            if n == 0 {
                return Ok(total);
            }

            total += n as u64;
            self.buffer.extend_from_slice(&chunk[..n]);
            if self.buffer.len() >= PAYLOAD_CHUNK_SIZE {
                self.write_buffer().await?;
            }
        }
    }

    /// Writes out everything buffered and flushes the underlying writer.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        self.write_buffer().await?;
        Ok(self.writer.flush().await?)
    }

    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.buffer.clear();
        Ok(self.writer.shutdown().await?)
    }

    async fn write_buffer(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::protocol::{HttpVersion, Response};

    #[tokio::test]
    async fn head_and_small_payload() {
        let mut writer = MessageWriter::new(Vec::new());
        let mut response = Response::new(HttpVersion::Http11, StatusCode::OK);
        response.header_mut().set_content_length(5);

        writer.write_head(&response).unwrap();
        assert!(writer.get_mut().is_empty());

        let copied = writer.write_payload(&mut &b"hello"[..]).await.unwrap();
        assert_eq!(copied, 5);
        writer.flush().await.unwrap();

        assert_eq!(&writer.get_mut()[..], b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello");
    }

    #[tokio::test]
    async fn large_payload_in_chunks() {
        let payload = vec![b'x'; PAYLOAD_CHUNK_SIZE * 3 + 17];
        let mut writer = MessageWriter::new(Vec::new());

        let copied = writer.write_payload(&mut &payload[..]).await.unwrap();
        assert_eq!(copied, payload.len() as u64);
        assert!(writer.get_mut().len() >= PAYLOAD_CHUNK_SIZE * 3);

        writer.flush().await.unwrap();
        assert_eq!(writer.get_mut().len(), payload.len());
    }
}
