//! Server side connection handling
//!
//! Each accepted connection is driven by a [`RequestHandler`] that reads requests, hands them
//! to the application's [`Listener`] and writes the returned [`Reply`] back, for as long as
//! the keep-alive rule allows.
//!
//! # Components
//!
//! - [`RequestHandler`]: the per-connection request/response loop
//! - [`HandlerHandle`]: idempotent cancellation of a running handler
//! - [`Listener`] / [`listener_fn`]: the application hook producing replies
//! - [`RequestPayload`]: the request body, limited by its `Content-Length`
//! - [`MessageWriter`]: buffered writing of heads and chunked payload copying
//!
//! # Keep-alive
//!
//! After a response is sent the connection is closed if the response version is HTTP/1.0 or
//! the response carries `Connection: close`. Any other response, including an HTTP/1.1
//! response without a `Connection` header, keeps the connection open.

mod listener;
mod message_writer;
mod payload;
mod request_handler;

pub use listener::BoxError;
pub use listener::Listener;
pub use listener::ListenerFn;
pub use listener::Reply;
pub use listener::listener_fn;
pub use message_writer::MessageWriter;
pub use message_writer::PAYLOAD_CHUNK_SIZE;
pub use payload::RequestPayload;
pub use request_handler::HandlerHandle;
pub use request_handler::RequestHandler;
