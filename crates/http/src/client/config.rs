use std::time::Duration;

/// Default time allowed to establish a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed between sending a request and receiving the response head
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on requests spawned through `request_async` that run at the same time
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;

/// Default number of attempts the pool makes before giving up on a request
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Client settings, shared by [`Client`](crate::client::Client) and
/// [`ConnectionPool`](crate::client::ConnectionPool).
///
/// ```
/// use std::time::Duration;
/// use ferry_http::client::ClientConfig;
///
/// let config = ClientConfig::default().read_timeout(None).max_attempts(5);
/// assert_eq!(config.get_max_attempts(), 5);
/// assert_eq!(config.get_connect_timeout(), Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    max_in_flight: usize,
    max_attempts: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Total attempts per pooled request, the first one included. At least one.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn get_connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn get_read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn get_max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn get_max_attempts(&self) -> usize {
        self.max_attempts
    }
}
