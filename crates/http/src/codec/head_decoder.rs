//! Line-oriented decoder for HTTP message heads.
//!
//! The head of a message is tokenized line by line: lines end with `\n`, optionally preceded
//! by `\r`. The first non-empty line is the start line, every following line up to a blank
//! one is a header line. The same tokenizer backs the in-memory [`Decoder`] implementation
//! and the async [`read_head`](crate::codec::read_head) used on live connections.
//!
//! # Limits
//!
//! - Maximum head size: 8KB ([`MAX_HEAD_BYTES`])
//! - Maximum number of headers: 64 ([`MAX_HEADERS`])

use std::io;
use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{MessageHead, ParseError};

/// Maximum size in bytes allowed for a message head, start line included
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Maximum number of header lines allowed in a message head
pub const MAX_HEADERS: usize = 64;

/// Decoder turning header lines into a [`MessageHead`] of type `T`.
///
/// The decoder is stateful: lines can be fed one at a time, and a partially received head
/// is kept until the blank line arrives. After an error the decoder must not be reused.
#[derive(Debug)]
pub struct HeadDecoder<T> {
    head: Option<T>,
    head_bytes: usize,
    header_count: usize,
}

impl<T> Default for HeadDecoder<T> {
    fn default() -> Self {
        Self { head: None, head_bytes: 0, header_count: 0 }
    }
}

impl<T: MessageHead> HeadDecoder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line, with or without its terminator.
    ///
    /// Returns the finished head once the blank line closing the header block is fed. Blank
    /// lines before the start line are skipped.
    pub fn decode_line(&mut self, line: &str) -> Result<Option<T>, ParseError> {
        let line = strip_line_terminator(line);

        let Some(mut head) = self.head.take() else {
            if !line.is_empty() {
                self.header_count = 0;
                self.head = Some(T::from_start_line(line)?);
            }
            return Ok(None);
        };

        if line.is_empty() {
            trace!(header_count = self.header_count, head_size = self.head_bytes, "parsed message head");
            self.header_count = 0;
            self.head_bytes = 0;
            head.finish()?;
            return Ok(Some(head));
        }

        ensure!(self.header_count < MAX_HEADERS, ParseError::too_many_headers(MAX_HEADERS));
        head.header_mut().add_line(line)?;
        self.header_count += 1;
        self.head = Some(head);
        Ok(None)
    }

    /// Decodes a complete head from `bytes`, ignoring anything after the blank line.
    pub fn decode_complete(bytes: &[u8]) -> Result<T, ParseError> {
        let mut src = BytesMut::from(bytes);
        Self::new()
            .decode(&mut src)?
            .ok_or_else(|| ParseError::io(io::Error::new(ErrorKind::UnexpectedEof, "incomplete message head")))
    }
}

impl<T: MessageHead> Decoder for HeadDecoder<T> {
    type Item = T;
    type Error = ParseError;

    /// Consumes whole lines from `src` until a head is complete.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))`: a head was decoded, `src` starts at the first body byte
    /// - `Ok(None)`: need more data, the incomplete last line stays in `src`
    /// - `Err(_)`: the head is malformed or exceeds the limits
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(index) = src.iter().position(|b| *b == b'\n') else {
                let pending = self.head_bytes + src.len();
                ensure!(pending <= MAX_HEAD_BYTES, ParseError::too_large_head(pending, MAX_HEAD_BYTES));
                return Ok(None);
            };

            self.head_bytes += index + 1;
            ensure!(self.head_bytes <= MAX_HEAD_BYTES, ParseError::too_large_head(self.head_bytes, MAX_HEAD_BYTES));

            let line = src.split_to(index + 1);
            let line = std::str::from_utf8(&line).map_err(|_e| ParseError::invalid_header("head is not valid utf-8"))?;

            if let Some(head) = self.decode_line(line)? {
                return Ok(Some(head));
            }
        }
    }
}

/// Strips a trailing `\n` and the `\r` that may precede it.
fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
