use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf, Take};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::client::exchange::{self, Transport, target};
use crate::client::response::truncated;
use crate::client::{ClientConfig, ClientError, ClientResponse};
use crate::codec::BodyKind;
use crate::protocol::{OutgoingRequest, Request, Response};

/// A keep-alive client holding at most one connection per `host:port`.
///
/// Requests to the same host share its connection one at a time: the connection is locked
/// from sending the request until the returned [`PooledBody`] has been read to the end or
/// dropped, so requests to one host are serialized while requests to different hosts run in
/// parallel. A request that meets a dead connection (closed by the peer while idle, reset,
/// refused) is sent again on a new connection, up to `max_attempts` attempts in total.
///
/// The pool is cheap to clone; clones share the same connections.
///
/// ```no_run
/// use ferry_http::client::ConnectionPool;
/// use ferry_http::protocol::Request;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = ConnectionPool::new();
/// for path in ["/a", "/b", "/c"] {
///     let request = Request::get(&format!("http://127.0.0.1:8080{path}"))?;
///     let (response, body) = pool.request(request).await?.bytes().await?;
///     println!("{path}: {} ({} bytes)", response.code(), body.len());
/// }
/// pool.close_all();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    config: ClientConfig,
    hosts: Mutex<HashMap<String, Arc<AsyncMutex<PooledConnection>>>>,
    in_flight: Arc<Semaphore>,
}

/// The pooled connection to one host. `transport` is `None` until connected, and again after
/// a failure or a response that does not leave the connection reusable.
#[derive(Debug)]
struct PooledConnection {
    key: String,
    host: String,
    port: u16,
    transport: Option<Transport>,
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let in_flight = Arc::new(Semaphore::new(config.get_max_in_flight()));
        Self { inner: Arc::new(PoolInner { config, hosts: Mutex::new(HashMap::new()), in_flight }) }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Sends `request` on the pooled connection to its host.
    ///
    /// The connection stays locked until the returned body reaches its end or is dropped. A
    /// body dropped early closes the connection instead of returning it to the pool.
    pub async fn request<R>(&self, request: R) -> Result<ClientResponse<PooledBody>, ClientError>
    where
        R: Into<OutgoingRequest>,
    {
        let (head, body) = request.into().into_parts();
        let (host, port) = target(head.url())?;
        let key = head.url().host_with_port();

        let connection = self.inner.connection(&key, &host, port);
        let mut connection = connection.lock_owned().await;
        let max_attempts = self.inner.config.get_max_attempts();

        let mut attempt = 1;
        loop {
            let error = match self.inner.attempt(&mut connection, &head, &body).await {
                Ok(response) => match response.body_kind(head.method()) {
                    Ok(kind) => return Ok(PooledBody::respond(connection, response, kind)),
                    Err(e) => e.into(),
                },
                Err(e) => e,
            };

            connection.transport = None;
            if !error.is_transport() {
                return Err(error);
            }
            if attempt >= max_attempts {
                warn!(host = %key, attempts = attempt, cause = %error, "giving up on request");
                return Err(ClientError::RetriesExhausted { attempts: attempt, source: Box::new(error) });
            }

            warn!(host = %key, attempt, cause = %error, "pooled connection failed, reconnecting");
            attempt += 1;
        }
    }

    /// Runs [`request`](Self::request) on a spawned task and passes the outcome to `callback`.
    ///
    /// The callback is invoked exactly once and may keep the body past its own return; the
    /// connection is released when the body is finished or dropped.
    pub fn request_async<R, F, Fut>(&self, request: R, callback: F) -> JoinHandle<()>
    where
        R: Into<OutgoingRequest>,
        F: FnOnce(Result<ClientResponse<PooledBody>, ClientError>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let request = request.into();
        let pool = self.clone();

        tokio::spawn(async move {
            let result = match Arc::clone(&pool.inner.in_flight).acquire_owned().await {
                Ok(_permit) => pool.request(request).await,
                Err(_closed) => Err(ClientError::Closed),
            };
            callback(result).await;
        })
    }

    /// Drops every pooled connection.
    ///
    /// Connections in use are closed once their current response is released.
    pub fn close_all(&self) {
        let mut hosts = self.inner.lock_hosts();
        let count = hosts.len();
        for (_key, connection) in hosts.drain() {
            if let Ok(mut connection) = connection.try_lock() {
                connection.transport = None;
            }
        }
        info!(count, "closed pooled connections");
    }

    /// Number of hosts the pool currently holds a connection slot for.
    pub fn connection_count(&self) -> usize {
        self.inner.lock_hosts().len()
    }
}

impl PoolInner {
    fn lock_hosts(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<PooledConnection>>>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection(&self, key: &str, host: &str, port: u16) -> Arc<AsyncMutex<PooledConnection>> {
        let mut hosts = self.lock_hosts();
        let connection = hosts.entry(key.to_string()).or_insert_with(|| {
            debug!(host = %key, "new pooled connection slot");
            Arc::new(AsyncMutex::new(PooledConnection { key: key.to_string(), host: host.to_string(), port, transport: None }))
        });
        Arc::clone(connection)
    }

    /// One send/receive round on the locked connection, connecting first if needed.
    async fn attempt(&self, connection: &mut PooledConnection, head: &Request, body: &Bytes) -> Result<Response, ClientError> {
        if connection.transport.is_none() {
            let transport = exchange::connect(&connection.host, connection.port, &self.config).await?;
            debug!(host = %connection.key, "opened pooled connection");
            connection.transport = Some(transport);
        }
        let Some(transport) = connection.transport.as_mut() else {
            return Err(ClientError::Closed);
        };

        exchange::send_request(transport, head, body).await?;
        exchange::receive_response(transport, &self.config).await
    }
}

/// Body of a response received through a [`ConnectionPool`].
///
/// The body holds its host's connection locked. Reading it to the end returns the connection
/// to the pool when the response allows keep-alive; dropping it earlier, or a response that
/// closes the connection, discards the connection so the next request reconnects.
pub struct PooledBody {
    inner: Option<Take<Transport>>,
    connection: Option<OwnedMutexGuard<PooledConnection>>,
    kind: BodyKind,
    reusable: bool,
}

impl PooledBody {
    fn respond(
        mut connection: OwnedMutexGuard<PooledConnection>,
        response: Response,
        kind: BodyKind,
    ) -> ClientResponse<PooledBody> {
        let inner = connection.transport.take().map(|transport| transport.take(kind.limit()));
        let reusable = response.is_keep_alive() && kind.is_delimited();
        let mut body = Self { inner, connection: Some(connection), kind, reusable };

        if kind == BodyKind::Empty {
            body.release(true);
        }
        ClientResponse::new(response, body)
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Returns true while the body still holds its connection.
    pub fn is_locked(&self) -> bool {
        self.connection.is_some()
    }

    fn release(&mut self, complete: bool) {
        let inner = self.inner.take();
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        match inner {
            Some(inner) if complete && self.reusable => {
                trace!(host = %connection.key, "connection returned to pool");
                connection.transport = Some(inner.into_inner());
            }
            _ => {
                trace!(host = %connection.key, complete, "connection discarded");
                connection.transport = None;
            }
        }
    }
}

impl AsyncRead for PooledBody {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(Ok(()));
        };

        let before = buf.filled().len();
        let result = ready!(Pin::new(&mut *inner).poll_read(cx, buf));
        let read = buf.filled().len() - before;
        let remaining = inner.limit();

        let result = result.and_then(|()| truncated(this.kind, read, buf.remaining(), remaining));
        match &result {
            Err(_) => this.release(false),
            Ok(()) if remaining == 0 || (read == 0 && buf.remaining() > 0) => this.release(remaining == 0),
            Ok(()) => {}
        }
        Poll::Ready(result)
    }
}

impl Drop for PooledBody {
    fn drop(&mut self) {
        let complete = self.inner.as_ref().is_some_and(|inner| inner.limit() == 0);
        self.release(complete);
    }
}

impl std::fmt::Debug for PooledBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBody")
            .field("kind", &self.kind)
            .field("remaining", &self.inner.as_ref().map(Take::limit))
            .field("locked", &self.is_locked())
            .finish()
    }
}
