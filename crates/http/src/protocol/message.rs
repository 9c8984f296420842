use bytes::BytesMut;

use crate::protocol::{Header, ParseError};

/// The head of an HTTP message: a start line followed by a header block.
///
/// [`Request`](crate::protocol::Request) and [`Response`](crate::protocol::Response) differ only
/// in their start line, so the codec drives both through this trait.
pub trait MessageHead: Sized {
    /// Parses the start line, which must not carry its line terminator.
    fn from_start_line(line: &str) -> Result<Self, ParseError>;

    /// Writes the start line including its trailing CRLF.
    fn encode_start_line(&self, dst: &mut BytesMut);

    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;

    /// Called once the blank line closing the header block has been read.
    fn finish(&mut self) -> Result<(), ParseError> {
        Ok(())
    }
}
