use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf, Take};

/// The payload bytes of one request, read straight from the connection.
///
/// The payload is delimited by the request's `Content-Length` header; a request without one
/// has an empty payload. Whatever the listener leaves unread is drained by the handler before
/// the response is written, so the next request on the connection starts at a head.
pub struct RequestPayload<'a> {
    inner: Take<&'a mut (dyn AsyncRead + Send + Unpin)>,
}

impl<'a> RequestPayload<'a> {
    pub(crate) fn new(reader: &'a mut (dyn AsyncRead + Send + Unpin), length: u64) -> Self {
        Self { inner: reader.take(length) }
    }

    /// Number of payload bytes not read yet.
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads the rest of the payload into memory.
    pub async fn bytes(&mut self) -> io::Result<Bytes> {
        let mut buffer = Vec::with_capacity(usize::try_from(self.remaining()).unwrap_or_default().min(64 * 1024));
        self.inner.read_to_end(&mut buffer).await?;
        self.ensure_complete()?;
        Ok(Bytes::from(buffer))
    }

    /// Discards the rest of the payload, returning the number of bytes skipped.
    pub async fn drain(&mut self) -> io::Result<u64> {
        let skipped = tokio::io::copy(&mut self.inner, &mut tokio::io::sink()).await?;
        self.ensure_complete()?;
        Ok(skipped)
    }

    fn ensure_complete(&self) -> io::Result<()> {
        if self.remaining() > 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside request payload"));
        }
        Ok(())
    }
}

impl AsyncRead for RequestPayload<'_> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl std::fmt::Debug for RequestPayload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPayload").field("remaining", &self.remaining()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limited_to_length() {
        let mut source: &[u8] = b"hello world";
        let mut payload = RequestPayload::new(&mut source, 5);

        assert_eq!(&payload.bytes().await.unwrap()[..], b"hello");
        assert!(payload.is_empty());
        assert_eq!(source, b" world");
    }

    #[tokio::test]
    async fn drain_reports_truncation() {
        let mut source: &[u8] = b"abc";
        let mut payload = RequestPayload::new(&mut source, 10);

        let result = payload.drain().await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }
}
