use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::codec::{MAX_HEAD_BYTES, read_head};
use crate::connection::{Listener, MessageWriter, Reply, RequestPayload};
use crate::protocol::{HttpError, ParseError, Request, SendError};

/// The server side of one connection.
///
/// A handler owns both halves of its transport for its whole life. [`run`](Self::run) loops
/// over request/response exchanges:
///
/// 1. read a request head; end of stream, an idle timeout or a malformed head closes the
///    connection without a response
/// 2. pass the head and its payload to the [`Listener`]
/// 3. drain whatever payload the listener left unread
/// 4. [`respond`](Self::respond) with the listener's reply
/// 5. close if the response is not keep-alive, otherwise continue with the next request
///
/// The loop also ends as soon as the handler is cancelled through its [`HandlerHandle`].
pub struct RequestHandler<R, W> {
    reader: BufReader<R>,
    writer: MessageWriter<W>,
    idle_timeout: Option<Duration>,
    handle: HandlerHandle,
}

impl<R, W> RequestHandler<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(id: u64, reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::with_capacity(MAX_HEAD_BYTES, reader),
            writer: MessageWriter::new(writer),
            idle_timeout: None,
            handle: HandlerHandle::new(id),
        }
    }

    /// Closes the connection if no new request head starts within `idle_timeout`.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn id(&self) -> u64 {
        self.handle.id
    }

    /// Returns a handle that can cancel this handler from another task.
    pub fn handle(&self) -> HandlerHandle {
        self.handle.clone()
    }

    /// Serves requests until the connection closes, then shuts the transport down.
    ///
    /// End of stream and cancellation are a normal end and return `Ok`. Malformed requests
    /// and transport failures return the error after the connection has been closed.
    pub async fn run<L>(mut self, listener: Arc<L>) -> Result<(), HttpError>
    where
        L: Listener + ?Sized,
    {
        let id = self.handle.id;
        let token = self.handle.token.clone();

        let result = loop {
            let exchange = select! {
                biased;
                _ = token.cancelled() => {
                    debug!(connection = id, "handler cancelled");
                    break Ok(());
                }
                exchange = self.exchange(listener.as_ref()) => exchange,
            };

            match exchange {
                Ok(true) => continue,
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.close().await;
        result
    }

    /// Writes `reply` to the connection: the serialized head, then the payload source copied
    /// in fixed-size chunks until exhausted. The payload source is dropped afterwards.
    pub async fn respond(&mut self, reply: Reply) -> Result<(), SendError> {
        let (response, payload) = reply.into_parts();
        self.writer.write_head(&response)?;

        if let Some(mut payload) = payload {
            let copied = self.writer.write_payload(&mut payload).await?;
            trace!(connection = self.handle.id, payload_size = copied, "copied response payload");
        }

        self.writer.flush().await
    }

    /// Handles one request. Returns whether the connection stays open for another one.
    async fn exchange<L>(&mut self, listener: &L) -> Result<bool, HttpError>
    where
        L: Listener + ?Sized,
    {
        let Some(request) = self.read_request().await? else {
            return Ok(false);
        };

        let version = request.version();
        let length = request.header().content_length()?.unwrap_or(0);
        debug!(connection = self.handle.id, method = %request.method(), path = request.path(), "received request");

        let mut payload = RequestPayload::new(&mut self.reader, length);
        let result = listener.on_request(request, &mut payload).await;
        payload.drain().await.map_err(ParseError::io)?;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                error!(connection = self.handle.id, cause = %e, "listener failed to handle request");
                Reply::closing(version, StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        let keep_alive = reply.response().is_keep_alive();
        self.respond(reply).await?;
        Ok(keep_alive)
    }

    async fn read_request(&mut self) -> Result<Option<Request>, ParseError> {
        let Some(idle_timeout) = self.idle_timeout else {
            return read_head(&mut self.reader).await;
        };

        match tokio::time::timeout(idle_timeout, read_head(&mut self.reader)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                info!(connection = self.handle.id, idle_timeout = ?idle_timeout, "connection idle, closing");
                Ok(None)
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            trace!(connection = self.handle.id, cause = %e, "shutdown transport failed");
        }
        self.handle.closed.store(true, Ordering::Release);
    }
}

impl<R, W> std::fmt::Debug for RequestHandler<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("id", &self.handle.id)
            .field("idle_timeout", &self.idle_timeout)
            .field("closed", &self.handle.is_closed())
            .finish_non_exhaustive()
    }
}

/// Cancels a [`RequestHandler`] from outside its task.
///
/// Cancelling is idempotent and safe from any task: the first call signals the handler,
/// which aborts any blocked read, leaves its loop and shuts the transport down once.
#[derive(Debug, Clone)]
pub struct HandlerHandle {
    id: u64,
    token: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl HandlerHandle {
    fn new(id: u64) -> Self {
        Self { id, token: CancellationToken::new(), closed: Arc::new(AtomicBool::new(false)) }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Asks the handler to close its connection. Returns false if it was already asked to.
    pub fn cancel(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true once the handler has shut its transport down.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use http::Method;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    use super::*;
    use crate::connection::listener_fn;
    use crate::protocol::{ConnectionMode, HttpVersion, Response};

    type Handler = RequestHandler<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    fn handler_pair() -> (Handler, DuplexStream) {
        let (server, client) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);
        (RequestHandler::new(1, reader, writer), client)
    }

    fn hello(request: Request) -> Reply {
        let response = Response::new(request.version(), StatusCode::OK);
        Reply::with_bytes(response, "hello")
    }

    #[tokio::test]
    async fn http_10_closes_after_response() {
        let (handler, mut client) = handler_pair();
        let listener = Arc::new(listener_fn(|request| async move { Ok::<_, BoxErrorAlias>(hello(request)) }));
        let task = tokio::spawn(handler.run(listener));

        client.write_all(b"GET /index.html HTTP/1.0\r\n\r\n").await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        assert_eq!(output, "HTTP/1.0 200 OK\r\ncontent-length: 5\r\n\r\nhello");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn http_11_keeps_connection_open() {
        let (handler, mut client) = handler_pair();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let listener = Arc::new(listener_fn(move |request| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxErrorAlias>(hello(request))
            }
        }));
        let handle = handler.handle();
        let task = tokio::spawn(handler.run(listener));

        let expected = "HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello";
        for _ in 0..2 {
            client.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
            let mut output = vec![0u8; expected.len()];
            client.read_exact(&mut output).await.unwrap();
            assert_eq!(output, expected.as_bytes());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!handle.is_closed());

        assert!(handle.cancel());
        assert!(!handle.cancel());
        task.await.unwrap().unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn connection_close_header_closes() {
        let (handler, mut client) = handler_pair();
        let listener = Arc::new(listener_fn(|request: Request| async move {
            let mut response = Response::new(request.version(), StatusCode::NO_CONTENT);
            response.set_connection_mode(ConnectionMode::Close);
            Ok::<_, BoxErrorAlias>(Reply::new(response))
        }));
        let task = tokio::spawn(handler.run(listener));

        client.write_all(b"DELETE /items/1 HTTP/1.1\r\n\r\n").await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        assert_eq!(output, "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n");
        task.await.unwrap().unwrap();
    }

    struct Echo;

    #[async_trait::async_trait]
    impl Listener for Echo {
        async fn on_request(&self, request: Request, payload: &mut RequestPayload<'_>) -> Result<Reply, BoxErrorAlias> {
            assert_eq!(request.method(), &Method::POST);
            let body = payload.bytes().await?;
            Ok(Reply::with_bytes(Response::new(request.version(), StatusCode::OK), body))
        }
    }

    #[tokio::test]
    async fn payload_is_delimited_by_content_length() {
        let (handler, mut client) = handler_pair();
        let task = tokio::spawn(handler.run(Arc::new(Echo)));

        client.write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcPOST /echo HTTP/1.0\r\ncontent-length: 2\r\n\r\nde").await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        assert_eq!(
            output,
            "HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\nabcHTTP/1.0 200 OK\r\ncontent-length: 2\r\n\r\nde"
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unread_payload_is_drained() {
        let (handler, mut client) = handler_pair();
        let listener = Arc::new(listener_fn(|request| async move { Ok::<_, BoxErrorAlias>(hello(request)) }));
        let task = tokio::spawn(handler.run(listener));

        client.write_all(b"PUT /a HTTP/1.1\r\nContent-Length: 4\r\n\r\nxxxxGET /b HTTP/1.0\r\n\r\n").await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        assert_eq!(output.matches("hello").count(), 2);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn listener_error_answers_500_and_closes() {
        let (handler, mut client) = handler_pair();
        let listener = Arc::new(listener_fn(|_request| async move { Err::<Reply, _>("boom") }));
        let task = tokio::spawn(handler.run(listener));

        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        assert_eq!(output, "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn malformed_request_closes_without_response() {
        let (handler, mut client) = handler_pair();
        let listener = Arc::new(listener_fn(|request| async move { Ok::<_, BoxErrorAlias>(hello(request)) }));
        let task = tokio::spawn(handler.run(listener));

        client.write_all(b"NONSENSE\r\n\r\n").await.unwrap();

        let mut output = Vec::new();
        client.read_to_end(&mut output).await.unwrap();
        assert!(output.is_empty());
        assert!(matches!(task.await.unwrap(), Err(HttpError::RequestError { .. })));
    }

    #[tokio::test]
    async fn peer_close_ends_quietly() {
        let (handler, client) = handler_pair();
        let listener = Arc::new(listener_fn(|request| async move { Ok::<_, BoxErrorAlias>(hello(request)) }));
        let task = tokio::spawn(handler.run(listener));

        drop(client);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_closes() {
        let (handler, mut client) = handler_pair();
        let handler = handler.with_idle_timeout(Some(Duration::from_secs(5)));
        let listener = Arc::new(listener_fn(|request| async move { Ok::<_, BoxErrorAlias>(hello(request)) }));
        let task = tokio::spawn(handler.run(listener));

        let mut output = Vec::new();
        client.read_to_end(&mut output).await.unwrap();
        assert!(output.is_empty());
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn respond_without_listener() {
        let (mut handler, mut client) = handler_pair();
        let response = Response::new(HttpVersion::Http11, StatusCode::ACCEPTED).with_message("Queued");

        handler.respond(Reply::new(response)).await.unwrap();

        let expected = b"HTTP/1.1 202 Queued\r\n\r\n";
        let mut output = vec![0u8; expected.len()];
        client.read_exact(&mut output).await.unwrap();
        assert_eq!(&output[..], expected);
    }

    #[test]
    fn debug_shows_id_and_timeout() {
        let (handler, _client) = handler_pair();
        let handler = handler.with_idle_timeout(Some(Duration::from_secs(5)));

        let debug = format!("{handler:?}");
        assert!(debug.starts_with("RequestHandler { id: 1"));
        assert!(debug.contains("idle_timeout: Some(5s)"));
    }

    type BoxErrorAlias = crate::connection::BoxError;
}
