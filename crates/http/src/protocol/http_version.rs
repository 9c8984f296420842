use std::fmt::{Display, Formatter};

use crate::protocol::ParseError;

/// The protocol versions this engine reads and writes.
///
/// `Http2` is a label only: messages tagged `HTTP/2.0` still use the text framing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    Http10,
    #[default]
    Http11,
    Http2,
}

impl HttpVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
            HttpVersion::Http2 => "HTTP/2.0",
        }
    }
}

impl TryFrom<&str> for HttpVersion {
    type Error = ParseError;

    /// Parses an `HTTP/<digit>.<digit>` token, ignoring the case of the `HTTP` prefix.
    fn try_from(str: &str) -> Result<Self, Self::Error> {
        let invalid = || ParseError::InvalidVersion(str.to_string());

        let (protocol, number) = str.split_at_checked(5).ok_or_else(invalid)?;
        if !protocol.eq_ignore_ascii_case("HTTP/") {
            return Err(invalid());
        }

        match number.as_bytes() {
            [b'1', b'.', b'0'] => Ok(HttpVersion::Http10),
            [b'1', b'.', b'1'] => Ok(HttpVersion::Http11),
            [b'2', b'.', b'0'] => Ok(HttpVersion::Http2),
            _ => Err(invalid()),
        }
    }
}

impl Display for HttpVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(HttpVersion::try_from("HTTP/1.0").unwrap(), HttpVersion::Http10);
        assert_eq!(HttpVersion::try_from("HTTP/1.1").unwrap(), HttpVersion::Http11);
        assert_eq!(HttpVersion::try_from("http/1.1").unwrap(), HttpVersion::Http11);
        assert_eq!(HttpVersion::try_from("HTTP/2.0").unwrap(), HttpVersion::Http2);
    }

    #[test]
    fn test_from_invalid_str() {
        for str in ["HTTP1.1", "HTTP/1.1 ", "HTTP/0.9", "HTTP/3.0", "HTTP/1", "HTTPS/1.1", "", "HTTP/é"] {
            assert!(matches!(HttpVersion::try_from(str), Err(ParseError::InvalidVersion(_))), "{str}");
        }
    }

    #[test]
    fn test_as_str_round_trip() {
        for version in [HttpVersion::Http10, HttpVersion::Http11, HttpVersion::Http2] {
            assert_eq!(HttpVersion::try_from(version.as_str()).unwrap(), version);
        }
    }
}
