//! An asynchronous HTTP/1.x protocol engine
//!
//! This crate implements the request/response exchange of HTTP/1.0 and HTTP/1.1 on top of
//! tokio: message head parsing and serialization, a server that serves many kept-alive
//! connections at once, and clients that either open a connection per request or keep one
//! connection per host in a pool that reconnects transparently.
//!
//! # Features
//!
//! - Line oriented head parsing that tolerates `\n` and `\r\n` line endings
//! - Case-insensitive, insertion ordered headers
//! - Keep-alive on both sides, with the HTTP/1.0 and `Connection: close` rules applied
//! - Request and response payloads streamed through `AsyncRead`, delimited by `Content-Length`
//! - Bounded concurrency: connection slots on the server, in-flight slots on the clients
//! - Graceful shutdown that waits for every live connection
//!
//! # Example
//!
//! ```no_run
//! use ferry_http::client::ConnectionPool;
//! use ferry_http::connection::{Reply, listener_fn};
//! use ferry_http::protocol::{Request, Response};
//! use ferry_http::server::Server;
//! use http::StatusCode;
//! use tracing::{Level, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let mut server = Server::builder()
//!         .address("127.0.0.1:0")
//!         .listener(listener_fn(|request: Request| async move {
//!             info!(path = request.path(), "receiving request");
//!             let response = Response::new(request.version(), StatusCode::OK);
//!             Ok::<_, std::io::Error>(Reply::with_bytes(response, "Hello World!\r\n"))
//!         }))
//!         .build()?;
//!     let address = server.start().await?;
//!
//!     let pool = ConnectionPool::new();
//!     let request = Request::get(&format!("http://{address}/hello"))?;
//!     let (response, body) = pool.request(request).await?.bytes().await?;
//!     info!(code = response.code(), body = ?body, "got response");
//!
//!     pool.close_all();
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: URL, header, request and response types and the error taxonomy
//! - [`codec`]: head decoding and encoding, body framing
//! - [`connection`]: the server's per-connection loop and the [`Listener`](connection::Listener) hook
//! - [`server`]: binding, accepting, connection bookkeeping and shutdown
//! - [`client`]: the unpooled [`Client`](client::Client) and the [`ConnectionPool`](client::ConnectionPool)
//!
//! ## Error Handling
//!
//! - [`protocol::ParseError`]: malformed or oversized messages, and read failures
//! - [`protocol::SendError`]: write failures
//! - [`protocol::HttpError`]: how a server connection ended abnormally
//! - [`server::ServerError`]: configuration, bind and accept failures
//! - [`client::ClientError`]: connect, exchange, timeout and retry failures
//!
//! # Limitations
//!
//! - No chunked transfer encoding: payloads are delimited by `Content-Length` or by closing
//!   the connection
//! - HTTP/2.0 is accepted as a version label only, there is no binary framing
//! - No TLS support
//! - Maximum head size: 8KB
//! - Maximum number of headers: 64

pub mod client;
pub mod codec;
pub mod connection;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
