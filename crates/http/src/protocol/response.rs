//! HTTP response head.
//!
//! Mirrors [`Request`](crate::protocol::Request): a status line and a header block, parsed by
//! the codec or built programmatically. The keep-alive and body framing rules that both the
//! server handler and the clients rely on live here.

use bytes::{BufMut, Bytes, BytesMut};
use http::{Method, StatusCode};

use crate::codec::{BodyKind, HeadDecoder, encode_head};
use crate::protocol::{ConnectionMode, Header, HttpVersion, MessageHead, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: HttpVersion,
    status: StatusCode,
    message: String,
    header: Header,
}

impl Response {
    /// Creates a response whose message is the canonical reason phrase of `status`.
    pub fn new(version: HttpVersion, status: StatusCode) -> Self {
        let message = status.canonical_reason().unwrap_or_default().to_string();
        Self { version, status, message, header: Header::new() }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    /// Parses a complete response head held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        HeadDecoder::<Response>::decode_complete(bytes)
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn set_version(&mut self, version: HttpVersion) {
        self.version = version;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the numeric status code.
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.header.connection_mode()
    }

    pub fn set_connection_mode(&mut self, mode: ConnectionMode) {
        self.header.set_connection_mode(mode);
    }

    /// Returns false if the connection must be closed once this response has been sent.
    ///
    /// HTTP/1.0 always closes; otherwise only an explicit `Connection: close` does.
    pub fn is_keep_alive(&self) -> bool {
        self.version != HttpVersion::Http10 && self.connection_mode() != ConnectionMode::Close
    }

    /// Decides how the body following this head is delimited when answering `request_method`.
    pub fn body_kind(&self, request_method: &Method) -> Result<BodyKind, ParseError> {
        let bodiless = request_method == Method::HEAD
            || self.status.is_informational()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED;
        if bodiless {
            return Ok(BodyKind::Empty);
        }

        match self.header.content_length()? {
            Some(0) => Ok(BodyKind::Empty),
            Some(length) => Ok(BodyKind::Length(length)),
            None if self.is_keep_alive() => Ok(BodyKind::Empty),
            None => Ok(BodyKind::UntilEof),
        }
    }

    /// Serializes the status line and header block.
    pub fn encode(&self, dst: &mut BytesMut) {
        encode_head(self, dst);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }
}

impl MessageHead for Response {
    fn from_start_line(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (protocol, rest) = line
            .split_once(' ')
            .ok_or_else(|| ParseError::invalid_start_line(format!("expect 'HTTP/x.y CODE MESSAGE' but got '{line}'")))?;
        let version = HttpVersion::try_from(protocol)?;

        let (code, message) = rest.split_once(' ').unwrap_or((rest, ""));
        if code.len() != 3 {
            return Err(ParseError::InvalidStatus(code.to_string()));
        }
        let status = StatusCode::from_bytes(code.as_bytes()).map_err(|_e| ParseError::InvalidStatus(code.to_string()))?;

        Ok(Self { version, status, message: message.to_string(), header: Header::new() })
    }

    fn encode_start_line(&self, dst: &mut BytesMut) {
        dst.put_slice(self.version.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.message.as_bytes());
        dst.put_slice(b"\r\n");
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}
