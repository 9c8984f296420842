//! Case-insensitive header bag shared by requests and responses.
//!
//! Keys are normalized to lower case on insertion and a key holds exactly one value: adding an
//! existing key replaces its value. Entries serialize in insertion order so the bytes put on
//! the wire are deterministic.

use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH};
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::protocol::ParseError;

const HEADER_DELIMITER: &str = ": ";

/// The persistence intent carried by a `Connection` header.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ConnectionMode {
    /// No `Connection` header, or a value this engine does not act on
    #[default]
    Unspecified,
    /// `Connection: close`
    Close,
    /// `Connection: keep-alive`
    KeepAlive,
}

impl ConnectionMode {
    fn from_value(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("close") {
            ConnectionMode::Close
        } else if value.eq_ignore_ascii_case("keep-alive") {
            ConnectionMode::KeepAlive
        } else {
            ConnectionMode::Unspecified
        }
    }

    fn as_value(self) -> Option<&'static str> {
        match self {
            ConnectionMode::Unspecified => None,
            ConnectionMode::Close => Some("close"),
            ConnectionMode::KeepAlive => Some("keep-alive"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    map: HeaderMap,
}

impl AsRef<HeaderMap> for Header {
    fn as_ref(&self) -> &HeaderMap {
        &self.map
    }
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under the lower-cased `key`, replacing any previous value.
    pub fn add(&mut self, key: &str, value: &str) -> Result<(), ParseError> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_e| ParseError::invalid_header(format!("invalid header name '{key}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_e| ParseError::invalid_header(format!("invalid value for header '{key}'")))?;

        self.map.insert(name, value);
        Ok(())
    }

    /// Returns the value stored under `key`, or an empty string when absent.
    pub fn get(&self, key: &str) -> &str {
        self.map.get(key).and_then(|value| std::str::from_utf8(value.as_bytes()).ok()).unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Removes `key`, returning true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(name, value)| (name.as_str(), std::str::from_utf8(value.as_bytes()).unwrap_or("")))
    }

    /// Parses one `Key: Value` header line, with or without its line terminator.
    pub fn add_line(&mut self, raw_line: &str) -> Result<(), ParseError> {
        let line = raw_line.trim_end_matches(['\r', '\n']);
        let (key, value) = line
            .split_once(HEADER_DELIMITER)
            .ok_or_else(|| ParseError::invalid_header(format!("missing ': ' delimiter in '{line}'")))?;

        self.add(key, value)
    }

    /// Writes every entry as a `key: value\r\n` line.
    pub fn encode(&self, dst: &mut BytesMut) {
        for (name, value) in &self.map {
            dst.put_slice(name.as_ref());
            dst.put_slice(HEADER_DELIMITER.as_bytes());
            dst.put_slice(value.as_ref());
            dst.put_slice(b"\r\n");
        }
    }

    pub fn serialize(&self) -> String {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        String::from_utf8_lossy(&dst).into_owned()
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.map
            .get(CONNECTION)
            .and_then(|value| value.to_str().ok())
            .map_or(ConnectionMode::Unspecified, ConnectionMode::from_value)
    }

    /// Sets the `Connection` header; [`ConnectionMode::Unspecified`] removes it.
    pub fn set_connection_mode(&mut self, mode: ConnectionMode) {
        match mode.as_value() {
            Some(value) => {
                self.map.insert(CONNECTION, HeaderValue::from_static(value));
            }
            None => {
                self.map.remove(CONNECTION);
            }
        }
    }

    /// Returns the declared `Content-Length`, if any.
    pub fn content_length(&self) -> Result<Option<u64>, ParseError> {
        let Some(value) = self.map.get(CONTENT_LENGTH) else {
            return Ok(None);
        };

        let str = value.to_str().map_err(|_e| ParseError::invalid_content_length("value can't to_str"))?;
        let length =
            str.trim().parse::<u64>().map_err(|_e| ParseError::invalid_content_length(format!("value {str} is not u64")))?;

        Ok(Some(length))
    }

    pub fn set_content_length(&mut self, length: u64) {
        self.map.insert(CONTENT_LENGTH, length.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup() {
        let mut header = Header::new();
        header.add("Content-Length", "10").unwrap();

        assert_eq!(header.get("content-length"), "10");
        assert_eq!(header.get("CONTENT-LENGTH"), "10");
        assert!(header.contains("content-LENGTH"));
        assert_eq!(header.get("accept"), "");
        assert!(!header.contains("accept"));
    }

    #[test]
    fn add_overwrites() {
        let mut header = Header::new();
        header.add("X-Token", "a").unwrap();
        header.add("x-token", "b").unwrap();

        assert_eq!(header.len(), 1);
        assert_eq!(header.get("X-TOKEN"), "b");
    }

    #[test]
    fn add_line_splits_on_first_delimiter() {
        let mut header = Header::new();
        header.add_line("Host: 127.0.0.1:8080\r\n").unwrap();
        header.add_line("X-Trace: a: b").unwrap();

        assert_eq!(header.get("host"), "127.0.0.1:8080");
        assert_eq!(header.get("x-trace"), "a: b");
    }

    #[test]
    fn add_line_without_delimiter() {
        let mut header = Header::new();
        assert!(matches!(header.add_line("Host 127.0.0.1"), Err(ParseError::InvalidHeader { .. })));
        assert!(matches!(header.add_line("Host:127.0.0.1"), Err(ParseError::InvalidHeader { .. })));
        assert!(matches!(header.add_line("Bad Name: x"), Err(ParseError::InvalidHeader { .. })));
        assert!(header.is_empty());
    }

    #[test]
    fn serialize_in_insertion_order() {
        let mut header = Header::new();
        header.add("Host", "example.com").unwrap();
        header.add("Accept", "*/*").unwrap();
        header.add("User-Agent", "ferry").unwrap();

        assert_eq!(header.serialize(), "host: example.com\r\naccept: */*\r\nuser-agent: ferry\r\n");
    }

    #[test]
    fn connection_mode() {
        let mut header = Header::new();
        assert_eq!(header.connection_mode(), ConnectionMode::Unspecified);

        header.add("Connection", "Keep-Alive").unwrap();
        assert_eq!(header.connection_mode(), ConnectionMode::KeepAlive);

        header.set_connection_mode(ConnectionMode::Close);
        assert_eq!(header.get("connection"), "close");
        assert_eq!(header.connection_mode(), ConnectionMode::Close);

        header.set_connection_mode(ConnectionMode::Unspecified);
        assert!(!header.contains("connection"));

        header.add("Connection", "upgrade").unwrap();
        assert_eq!(header.connection_mode(), ConnectionMode::Unspecified);
    }

    #[test]
    fn content_length() {
        let mut header = Header::new();
        assert_eq!(header.content_length().unwrap(), None);

        header.set_content_length(42);
        assert_eq!(header.content_length().unwrap(), Some(42));

        header.add("Content-Length", "abc").unwrap();
        assert!(matches!(header.content_length(), Err(ParseError::InvalidContentLength { .. })));
    }
}
