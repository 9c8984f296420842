//! Serialization of message heads.
//!
//! Both heads share one layout: the start line, one `key: value` line per header, and a
//! blank line. Bodies are never written by the encoder; callers stream them after the head.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::{MessageHead, SendError};

/// Initial buffer size reserved before serializing a head
const INIT_HEAD_SIZE: usize = 1024;

/// Encoder for [`MessageHead`]s implementing the [`Encoder`] trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadEncoder;

impl<T: MessageHead> Encoder<&T> for HeadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: &T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEAD_SIZE);
        encode_head(item, dst);
        Ok(())
    }
}

pub(crate) fn encode_head<T: MessageHead>(head: &T, dst: &mut BytesMut) {
    head.encode_start_line(dst);
    head.header().encode(dst);
    dst.put_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;
    use crate::protocol::{ConnectionMode, HttpVersion, Request, Response};

    #[test]
    fn encode_request() {
        let mut request = Request::new(Method::HEAD, "http://localhost:8080/ping", HttpVersion::Http10).unwrap();
        request.set_connection_mode(ConnectionMode::Close);

        let mut dst = BytesMut::new();
        HeadEncoder.encode(&request, &mut dst).unwrap();

        assert_eq!(&dst[..], b"HEAD /ping HTTP/1.0\r\nhost: localhost:8080\r\nconnection: close\r\n\r\n");
    }

    #[test]
    fn encode_appends() {
        let mut dst = BytesMut::from(&b"xx"[..]);
        HeadEncoder.encode(&Response::new(HttpVersion::Http11, StatusCode::NOT_FOUND), &mut dst).unwrap();

        assert_eq!(&dst[..], b"xxHTTP/1.1 404 Not Found\r\n\r\n");
    }
}
