use std::error::Error;
use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use tokio::io::AsyncRead;

use crate::connection::RequestPayload;
use crate::protocol::{ConnectionMode, HttpVersion, Request, Response};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Application hook invoked once per parsed request.
///
/// The listener receives the request head and the request payload, and returns the [`Reply`]
/// the connection handler writes back. An error is answered with `500 Internal Server Error`
/// and the connection is closed.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn on_request(&self, request: Request, payload: &mut RequestPayload<'_>) -> Result<Reply, BoxError>;
}

/// A response head plus an optional payload source.
///
/// The payload is copied to the connection after the head and dropped once exhausted. Its
/// length must agree with the `Content-Length` set on the response unless the response
/// closes the connection.
pub struct Reply {
    response: Response,
    payload: Option<Box<dyn AsyncRead + Send + Unpin>>,
}

impl Reply {
    pub fn new(response: Response) -> Self {
        Self { response, payload: None }
    }

    pub fn with_payload<P>(response: Response, payload: P) -> Self
    where
        P: AsyncRead + Send + Unpin + 'static,
    {
        Self { response, payload: Some(Box::new(payload)) }
    }

    /// Replies with an in-memory body, setting `Content-Length` to its size.
    pub fn with_bytes<B: Into<Bytes>>(mut response: Response, body: B) -> Self {
        let body = body.into();
        response.header_mut().set_content_length(body.len() as u64);
        Self::with_payload(response, Cursor::new(body))
    }

    /// An empty-bodied reply with `status` that closes the connection.
    pub fn closing(version: HttpVersion, status: StatusCode) -> Self {
        let mut response = Response::new(version, status);
        response.header_mut().set_content_length(0);
        response.set_connection_mode(ConnectionMode::Close);
        Self::new(response)
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn into_parts(self) -> (Response, Option<Box<dyn AsyncRead + Send + Unpin>>) {
        (self.response, self.payload)
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply").field("response", &self.response).field("has_payload", &self.has_payload()).finish()
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::new(response)
    }
}

/// [`Listener`] built from an async function of the request head.
///
/// The request payload is not exposed and gets drained by the handler.
#[derive(Debug)]
pub struct ListenerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut, Err> Listener for ListenerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Reply, Err>> + Send,
    Err: Into<BoxError>,
{
    async fn on_request(&self, request: Request, _payload: &mut RequestPayload<'_>) -> Result<Reply, BoxError> {
        (self.f)(request).await.map_err(Into::into)
    }
}

pub fn listener_fn<F, Fut, Err>(f: F) -> ListenerFn<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future<Output = Result<Reply, Err>>,
    Err: Into<BoxError>,
{
    ListenerFn { f }
}
