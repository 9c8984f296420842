use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::server::{Server, ServerError};

/// Default number of connections served at the same time
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default time a kept-alive connection may wait for its next request
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    /// Connections beyond this limit wait in the accept backlog until a slot frees up.
    pub max_connections: usize,
    /// `None` keeps idle connections open until the peer closes them.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

pub struct ServerBuilder<L> {
    address: Option<Result<SocketAddr, ServerError>>,
    max_connections: usize,
    idle_timeout: Option<Duration>,
    listener: Option<L>,
}

impl<L> ServerBuilder<L> {
    pub(crate) fn new() -> Self {
        let config = ServerConfig::default();
        Self { address: None, max_connections: config.max_connections, idle_timeout: config.idle_timeout, listener: None }
    }

    /// Sets the address to bind; the first resolved address is used.
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        let resolved = match address.to_socket_addrs() {
            Ok(mut addresses) => addresses.next().ok_or_else(|| ServerError::invalid_address("no address resolved")),
            Err(e) => Err(ServerError::invalid_address(e)),
        };
        self.address = Some(resolved);
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn listener(mut self, listener: L) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn build(self) -> Result<Server<L>, ServerError> {
        let address = self.address.ok_or(ServerError::MissingAddress)??;
        let listener = self.listener.ok_or(ServerError::MissingListener)?;
        let config = ServerConfig { address, max_connections: self.max_connections, idle_timeout: self.idle_timeout };
        Ok(Server::new(config, listener))
    }
}

impl<L> std::fmt::Debug for ServerBuilder<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("address", &self.address)
            .field("max_connections", &self.max_connections)
            .field("idle_timeout", &self.idle_timeout)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_address_and_listener() {
        let result = ServerBuilder::<()>::new().listener(()).build();
        assert!(matches!(result, Err(ServerError::MissingAddress)));

        let result = ServerBuilder::<()>::new().address("127.0.0.1:0").build();
        assert!(matches!(result, Err(ServerError::MissingListener)));

        let result = ServerBuilder::<()>::new().address("not an address").listener(()).build();
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[test]
    fn build_with_limits() {
        let server = ServerBuilder::new()
            .address("127.0.0.1:0")
            .max_connections(0)
            .idle_timeout(None)
            .listener(())
            .build()
            .unwrap();

        assert_eq!(server.config().max_connections, 1);
        assert_eq!(server.config().idle_timeout, None);
        assert_eq!(server.config().address.port(), 0);
    }

    #[test]
    fn builder_debug_hides_listener() {
        let builder = ServerBuilder::new().address("127.0.0.1:0").listener(());
        let debug = format!("{builder:?}");
        assert!(debug.contains("has_listener: true"));
        assert!(debug.contains("max_connections: 1024"));
    }
}
