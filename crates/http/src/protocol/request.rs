//! HTTP request head.
//!
//! A [`Request`] is built either by the codec from a request line plus header lines, or
//! programmatically from a target URL, in which case the `Host` header is filled in from the
//! URL. The request carries no body: the server hands payload bytes to listeners as a
//! separate stream and clients attach a body through [`OutgoingRequest`].

use bytes::{BufMut, Bytes, BytesMut};
use http::Method;
use http::header::HOST;

use crate::codec::{HeadDecoder, encode_head};
use crate::protocol::{ConnectionMode, Header, HttpVersion, MessageHead, ParseError, Url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
    version: HttpVersion,
    header: Header,
}

impl Request {
    /// Creates a request for `url`, adding a `Host` header derived from it.
    pub fn new(method: Method, url: &str, version: HttpVersion) -> Result<Self, ParseError> {
        let url = Url::parse(url)?;
        let mut header = Header::new();
        header.add(HOST.as_str(), &url.host_with_port())?;

        Ok(Self { method, url, version, header })
    }

    /// Creates an HTTP/1.1 `GET` request for `url`.
    pub fn get(url: &str) -> Result<Self, ParseError> {
        Self::new(Method::GET, url, HttpVersion::Http11)
    }

    /// Parses a complete request head held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        HeadDecoder::<Request>::decode_complete(bytes)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the method from its textual form, upper-casing it first.
    pub fn set_method(&mut self, method: &str) -> Result<(), ParseError> {
        self.method = parse_method(method)?;
        Ok(())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn set_version(&mut self, version: HttpVersion) {
        self.version = version;
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

    /// Serializes the request line and header block.
    pub fn encode(&self, dst: &mut BytesMut) {
        encode_head(self, dst);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }

    /// Attaches a body for sending through a client, setting `Content-Length` to its size.
    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> OutgoingRequest {
        let body = body.into();
        self.header.set_content_length(body.len() as u64);
        OutgoingRequest { head: self, body }
    }
}

impl MessageHead for Request {
    fn from_start_line(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let parts = line.split(' ').collect::<Vec<_>>();
        let [method, target, protocol] = parts.as_slice() else {
            return Err(ParseError::invalid_start_line(format!("expect 'METHOD PATH HTTP/x.y' but got '{line}'")));
        };

        let method = parse_method(method)?;
        if target.is_empty() {
            return Err(ParseError::invalid_start_line(format!("empty request target in '{line}'")));
        }
        // origin-form targets start with '/', anything else must be an absolute URL
        let url = if target.starts_with('/') { Url::from_path(*target) } else { Url::parse(target)? };
        let version = HttpVersion::try_from(*protocol)?;

        Ok(Self { method, url, version, header: Header::new() })
    }

    fn encode_start_line(&self, dst: &mut BytesMut) {
        dst.put_slice(self.method.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.url.path().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.version.as_str().as_bytes());
        dst.put_slice(b"\r\n");
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Fills the target host from the `Host` header for origin-form requests.
    fn finish(&mut self) -> Result<(), ParseError> {
        if self.url.host().is_empty() && self.header.contains(HOST.as_str()) {
            let host = self.header.get(HOST.as_str()).to_string();
            self.url.set_host(&host)?;
        }
        Ok(())
    }
}

fn parse_method(method: &str) -> Result<Method, ParseError> {
    if method.is_empty() {
        return Err(ParseError::InvalidMethod(method.to_string()));
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_e| ParseError::InvalidMethod(method.to_string()))
}

/// A request head plus the body bytes a client sends after it.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    head: Request,
    body: Bytes,
}

impl OutgoingRequest {
    pub fn head(&self) -> &Request {
        &self.head
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (Request, Bytes) {
        (self.head, self.body)
    }
}

impl From<Request> for OutgoingRequest {
    fn from(head: Request) -> Self {
        Self { head, body: Bytes::new() }
    }
}
