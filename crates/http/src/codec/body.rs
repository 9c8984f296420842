/// How the payload following a message head is delimited.
///
/// Chunked transfer-encoding is not supported: a payload either has a declared length, runs
/// until the peer closes the connection, or is absent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// No payload follows the head
    Empty,
    /// Exactly this many bytes follow the head
    Length(u64),
    /// The payload ends when the peer closes the connection
    UntilEof,
}

impl BodyKind {
    /// Maximum number of bytes that belong to the payload.
    pub fn limit(self) -> u64 {
        match self {
            BodyKind::Empty => 0,
            BodyKind::Length(length) => length,
            BodyKind::UntilEof => u64::MAX,
        }
    }

    /// Returns true if the connection can carry another message once the payload is read.
    pub fn is_delimited(self) -> bool {
        !matches!(self, BodyKind::UntilEof)
    }
}
