//! HTTP clients.
//!
//! - [`Client`]: opens a new connection for every request
//! - [`ConnectionPool`]: keeps one connection per host alive across requests, serializes
//!   requests to the same host on it and reconnects when it finds the connection dead
//!
//! Both send an [`OutgoingRequest`](crate::protocol::OutgoingRequest), i.e. a
//! [`Request`](crate::protocol::Request) head plus an optional body, and return a
//! [`ClientResponse`] whose body is read from the connection as a stream. Both offer an async
//! callback variant that runs the request on its own task.

mod config;
mod error;
mod exchange;
mod pool;
mod response;
mod unpooled;

pub use unpooled::Client;
pub use config::ClientConfig;
pub use config::DEFAULT_CONNECT_TIMEOUT;
pub use config::DEFAULT_MAX_ATTEMPTS;
pub use config::DEFAULT_MAX_IN_FLIGHT;
pub use config::DEFAULT_READ_TIMEOUT;
pub use error::ClientError;
pub use pool::ConnectionPool;
pub use pool::PooledBody;
pub use response::ClientResponse;
pub use response::ResponseBody;
