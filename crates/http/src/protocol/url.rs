//! Minimal `protocol://host[:port]/path` URL handling.
//!
//! Only the pieces the engine needs to route a request are modelled: the scheme label, the
//! target host and port, and the request path (query string included). Rendering a URL back
//! to text is fail-fast: an incomplete URL is an error, never silently completed with
//! defaults.

use std::str::FromStr;

use crate::ensure;
use crate::protocol::ParseError;

/// Port assumed when a URL does not carry one, and elided again when rendering.
pub const DEFAULT_PORT: u16 = 80;

const DEFAULT_PROTOCOL: &str = "http";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    protocol: String,
    host: String,
    port: u16,
    path: String,
}

impl Default for Url {
    fn default() -> Self {
        Self { protocol: DEFAULT_PROTOCOL.to_string(), host: String::new(), port: DEFAULT_PORT, path: String::new() }
    }
}

impl Url {
    /// Parses an absolute URL such as `http://example.com:8080/index.html?a=1`.
    ///
    /// The host ends at the first `/` after the scheme; everything from there on is the path.
    /// A URL without a path gets `/`.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let (protocol, rest) =
            raw.split_once("://").ok_or_else(|| ParseError::invalid_url(format!("missing scheme in '{raw}'")))?;
        ensure!(!protocol.is_empty(), ParseError::invalid_url(format!("empty scheme in '{raw}'")));

        let (authority, path) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, "/"),
        };
        ensure!(!authority.is_empty(), ParseError::invalid_url(format!("empty host in '{raw}'")));

        let mut url = Url { protocol: protocol.to_ascii_lowercase(), path: path.to_string(), ..Url::default() };
        url.set_host(authority)?;
        Ok(url)
    }

    /// Builds a host-less URL from an origin-form request target such as `/index.html`.
    pub fn from_path<S: Into<String>>(path: S) -> Self {
        Self { path: path.into(), ..Url::default() }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn set_protocol<S: Into<String>>(&mut self, protocol: S) {
        self.protocol = protocol.into();
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path<S: Into<String>>(&mut self, path: S) {
        self.path = path.into();
    }

    /// Sets host and port from `host` or `host:port`; a missing port resets it to 80.
    pub fn set_host(&mut self, host_port: &str) -> Result<(), ParseError> {
        // bracketed ipv6 literal without a port
        let bare_ipv6 = host_port.starts_with('[') && host_port.ends_with(']');

        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) if !bare_ipv6 => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_e| ParseError::invalid_url(format!("invalid port '{port}' in '{host_port}'")))?;
                (host, port)
            }
            _ => (host_port, DEFAULT_PORT),
        };

        self.host = host.to_string();
        self.port = port;
        Ok(())
    }

    /// Returns `host` when the port is 80, `host:port` otherwise.
    pub fn host_with_port(&self) -> String {
        if self.port == DEFAULT_PORT { self.host.clone() } else { format!("{}:{}", self.host, self.port) }
    }

    /// Renders the full URL.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidUrl`] if the protocol, host or path is empty.
    pub fn render(&self) -> Result<String, ParseError> {
        ensure!(!self.protocol.is_empty(), ParseError::invalid_url("protocol is empty"));
        ensure!(!self.host.is_empty(), ParseError::invalid_url("host is empty"));
        ensure!(!self.path.is_empty(), ParseError::invalid_url("path is empty"));

        Ok(format!("{}://{}{}", self.protocol, self.host_with_port(), self.path))
    }
}

impl FromStr for Url {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
    }
}
