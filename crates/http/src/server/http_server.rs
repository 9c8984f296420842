use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::connection::{Listener, RequestHandler};
use crate::server::registry::HandlerRegistry;
use crate::server::{ServerBuilder, ServerConfig, ServerError};

/// An HTTP/1.x server.
///
/// A server is either stopped or listening. [`start`](Self::start) binds the configured
/// address and spawns the accept loop; every accepted connection is served by its own
/// [`RequestHandler`] task, at most `max_connections` at a time. [`stop`](Self::stop) stops
/// accepting, cancels every live handler and waits until all of them have finished.
///
/// # Example
///
/// ```no_run
/// use ferry_http::connection::{Reply, listener_fn};
/// use ferry_http::protocol::Response;
/// use ferry_http::server::Server;
/// use http::StatusCode;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut server = Server::builder()
///     .address("127.0.0.1:8080")
///     .listener(listener_fn(|request| async move {
///         let response = Response::new(request.version(), StatusCode::OK);
///         Ok::<_, std::io::Error>(Reply::with_bytes(response, "Hello World!\r\n"))
///     }))
///     .build()?;
///
/// let address = server.start().await?;
/// println!("listening on {address}");
/// tokio::signal::ctrl_c().await?;
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Server<L> {
    config: ServerConfig,
    listener: Arc<L>,
    handlers: Arc<HandlerRegistry>,
    running: Option<Running>,
}

struct Running {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    accept_task: JoinHandle<Result<(), ServerError>>,
    tracker: TaskTracker,
}

impl<L> Server<L> {
    pub fn builder() -> ServerBuilder<L> {
        ServerBuilder::new()
    }

    pub(crate) fn new(config: ServerConfig, listener: L) -> Self {
        Self { config, listener: Arc::new(listener), handlers: Arc::new(HandlerRegistry::default()), running: None }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether the accept loop is running.
    ///
    /// Turns false as soon as the loop ends on an accept error; [`stop`](Self::stop) then
    /// returns that error.
    pub fn is_listening(&self) -> bool {
        self.running.as_ref().is_some_and(|running| !running.accept_task.is_finished())
    }

    /// The bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.handlers.len()
    }

    /// Number of connections accepted since the server was created.
    pub fn accepted_connections(&self) -> u64 {
        self.handlers.accepted()
    }
}

impl<L> Server<L>
where
    L: Listener + 'static,
{
    /// Binds the configured address and starts accepting connections in the background.
    ///
    /// Returns the bound address, which differs from the configured one when port 0 was
    /// requested.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted);
        }

        let address = self.config.address;
        let tcp_listener = TcpListener::bind(address).await.map_err(|source| ServerError::Bind { address, source })?;
        let local_addr = tcp_listener.local_addr().map_err(|source| ServerError::Bind { address, source })?;
        info!(address = %local_addr, max_connections = self.config.max_connections, "start listening");

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let accept_loop = AcceptLoop {
            tcp_listener,
            listener: Arc::clone(&self.listener),
            handlers: Arc::clone(&self.handlers),
            permits: Arc::new(Semaphore::new(self.config.max_connections)),
            config: self.config.clone(),
            shutdown: shutdown.clone(),
            tracker: tracker.clone(),
            next_id: 0,
        };
        let accept_task = tokio::spawn(accept_loop.run());

        self.running = Some(Running { local_addr, shutdown, accept_task, tracker });
        Ok(local_addr)
    }
}

impl<L> Server<L> {
    /// Stops the server; does nothing if it is not listening.
    ///
    /// Closes the listening socket, cancels every live handler and waits for all of their
    /// tasks to end. Returns the error that ended the accept loop early, if any.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.shutdown.cancel();
        let accept_result = match running.accept_task.await {
            Ok(result) => result,
            Err(e) => Err(ServerError::Accept { source: std::io::Error::other(e) }),
        };

        let cancelled = self.handlers.cancel_all();
        debug!(cancelled, "cancelled live connections");

        running.tracker.close();
        running.tracker.wait().await;
        info!(address = %running.local_addr, "server stopped");

        accept_result
    }
}

impl<L> Drop for Server<L> {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
            self.handlers.cancel_all();
        }
    }
}

impl<L> std::fmt::Debug for Server<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .field("listening", &self.is_listening())
            .field("active_connections", &self.active_connections())
            .finish_non_exhaustive()
    }
}

struct AcceptLoop<L> {
    tcp_listener: TcpListener,
    listener: Arc<L>,
    handlers: Arc<HandlerRegistry>,
    permits: Arc<Semaphore>,
    config: ServerConfig,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    next_id: u64,
}

impl<L> AcceptLoop<L>
where
    L: Listener + 'static,
{
    async fn run(mut self) -> Result<(), ServerError> {
        loop {
            // a slot is taken before accepting, so excess connections wait in the backlog
            let permit = select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => return Ok(()),
                },
            };

            let (tcp_stream, peer) = select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                accepted = self.tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        error!(cause = %e, "failed to accept, stop listening");
                        return Err(ServerError::Accept { source: e });
                    }
                },
            };

            self.next_id += 1;
            let (reader, writer) = tcp_stream.into_split();
            let handler = RequestHandler::new(self.next_id, reader, writer).with_idle_timeout(self.config.idle_timeout);
            let id = handler.id();
            self.handlers.register(handler.handle());
            debug!(connection = id, peer = %peer, available_permits = self.permits.available_permits(), "accepted connection");

            let listener = Arc::clone(&self.listener);
            let handlers = Arc::clone(&self.handlers);
            self.tracker.spawn(async move {
                let _permit = permit;
                match handler.run(listener).await {
                    Ok(()) => debug!(connection = id, peer = %peer, "connection closed"),
                    Err(e) => warn!(connection = id, peer = %peer, cause = %e, "connection closed with error"),
                }
                handlers.done(id);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::connection::{Reply, listener_fn};
    use crate::protocol::{Request, Response};

    fn server() -> Server<impl Listener> {
        Server::builder()
            .address("127.0.0.1:0")
            .listener(listener_fn(|request: Request| async move {
                Ok::<_, std::io::Error>(Reply::new(Response::new(request.version(), StatusCode::OK)))
            }))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn ended_accept_loop_is_not_listening() {
        let mut server = server();
        server.start().await.unwrap();
        assert!(server.is_listening());

        server.running.as_ref().unwrap().accept_task.abort();
        while server.is_listening() {
            tokio::task::yield_now().await;
        }
        assert!(server.local_addr().is_some());

        assert!(matches!(server.stop().await, Err(ServerError::Accept { .. })));
        assert!(!server.is_listening());

        server.start().await.unwrap();
        assert!(server.is_listening());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn debug_shows_state() {
        let mut server = server();
        assert!(format!("{server:?}").contains("listening: false"));

        let address = server.start().await.unwrap();
        let debug = format!("{server:?}");
        assert!(debug.contains("listening: true"));
        assert!(debug.contains(&address.to_string()));

        server.stop().await.unwrap();
    }
}
