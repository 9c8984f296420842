use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf, Take};

use crate::client::ClientError;
use crate::client::exchange::Transport;
use crate::codec::BodyKind;
use crate::protocol::Response;

/// A response head together with the stream its body is read from.
#[derive(Debug)]
pub struct ClientResponse<B = ResponseBody> {
    response: Response,
    body: B,
}

impl<B> ClientResponse<B> {
    pub(crate) fn new(response: Response, body: B) -> Self {
        Self { response, body }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_parts(self) -> (Response, B) {
        (self.response, self.body)
    }
}

impl<B: AsyncRead + Unpin> ClientResponse<B> {
    /// Reads the whole body into memory.
    pub async fn bytes(self) -> Result<(Response, Bytes), ClientError> {
        let (response, mut body) = self.into_parts();
        let mut buffer = Vec::new();
        body.read_to_end(&mut buffer).await?;
        Ok((response, Bytes::from(buffer)))
    }
}

/// Body of a response received by the unpooled [`Client`](crate::client::Client).
///
/// The body owns the connection it arrives on; dropping it closes the connection.
#[derive(Debug)]
pub struct ResponseBody {
    inner: Take<Transport>,
    kind: BodyKind,
}

impl ResponseBody {
    pub(crate) fn new(transport: Transport, kind: BodyKind) -> Self {
        Self { inner: transport.take(kind.limit()), kind }
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }
}

impl AsyncRead for ResponseBody {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);

        if let Poll::Ready(Ok(())) = result {
            truncated(this.kind, buf.filled().len() - before, buf.remaining(), this.inner.limit())?;
        }
        result
    }
}

/// A delimited body whose connection ended before the declared length is an error, not EOF.
pub(crate) fn truncated(kind: BodyKind, read: usize, capacity: usize, remaining: u64) -> io::Result<()> {
    if read == 0 && capacity > 0 && remaining > 0 && kind.is_delimited() {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside response body"));
    }
    Ok(())
}
