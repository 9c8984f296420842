use std::io;
use std::io::ErrorKind;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::codec::{HeadDecoder, MAX_HEAD_BYTES};
use crate::protocol::{MessageHead, ParseError};

/// Reads one message head from a buffered connection.
///
/// Lines are pulled from `reader` and fed to a [`HeadDecoder`] until the blank line; bytes
/// after the head stay buffered in `reader` for the body.
///
/// # Returns
///
/// - `Ok(Some(head))`: a complete head was read
/// - `Ok(None)`: the peer closed the stream before sending any byte of a new message
/// - `Err(ParseError::Io)`: the stream failed or ended in the middle of a head
/// - `Err(_)`: the head is malformed or exceeds the limits
pub async fn read_head<T, R>(reader: &mut R) -> Result<Option<T>, ParseError>
where
    T: MessageHead,
    R: AsyncBufRead + Unpin,
{
    let mut decoder = HeadDecoder::<T>::new();
    let mut line = Vec::with_capacity(256);
    let mut consumed = 0usize;

    loop {
        line.clear();
        let remaining = MAX_HEAD_BYTES - consumed;
        let n = (&mut *reader).take(remaining as u64).read_until(b'\n', &mut line).await?;

        if n == 0 && consumed == 0 {
            return Ok(None);
        }

        consumed += n;
        if line.last() != Some(&b'\n') {
            if consumed >= MAX_HEAD_BYTES {
                return Err(ParseError::too_large_head(consumed, MAX_HEAD_BYTES));
            }
            return Err(ParseError::io(io::Error::new(ErrorKind::UnexpectedEof, "connection closed inside message head")));
        }

        let str = std::str::from_utf8(&line).map_err(|_e| ParseError::invalid_header("head is not valid utf-8"))?;
        if let Some(head) = decoder.decode_line(str)? {
            return Ok(Some(head));
        }
    }
}
