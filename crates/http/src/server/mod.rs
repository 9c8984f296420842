//! The listening side: binds a socket, accepts connections and serves each one with a
//! [`RequestHandler`](crate::connection::RequestHandler).
//!
//! Concurrency is bounded by [`ServerConfig::max_connections`]; shutdown through
//! [`Server::stop`] waits for every connection task to finish.

mod config;
mod error;
mod http_server;
mod registry;

pub use config::DEFAULT_IDLE_TIMEOUT;
pub use config::DEFAULT_MAX_CONNECTIONS;
pub use config::ServerBuilder;
pub use config::ServerConfig;
pub use error::ServerError;
pub use http_server::Server;
