//! HTTP codec module for encoding and decoding message heads
//!
//! The wire format is line oriented: a start line, `key: value` header lines and a blank
//! line. This module turns bytes into [`Request`](crate::protocol::Request) /
//! [`Response`](crate::protocol::Response) heads and back.
//!
//! # Components
//!
//! - [`HeadDecoder`]: line tokenizer implementing [`tokio_util::codec::Decoder`] over
//!   `BytesMut`, for in-memory parsing
//! - [`read_head`]: the same tokenizer driven by an async buffered reader, for live
//!   connections where the body follows the head on the same stream
//! - [`HeadEncoder`]: implements [`tokio_util::codec::Encoder`] for any head
//! - [`BodyKind`]: how the payload after a head is delimited
//!
//! # Example
//!
//! ```
//! use ferry_http::codec::{HeadDecoder, HeadEncoder};
//! use ferry_http::protocol::Request;
//! use tokio_util::bytes::BytesMut;
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut buffer = BytesMut::from("GET /index.html HTTP/1.0\r\n\r\n");
//! let request = HeadDecoder::<Request>::new().decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.path(), "/index.html");
//!
//! let mut output = BytesMut::new();
//! HeadEncoder.encode(&request, &mut output).unwrap();
//! assert_eq!(&output[..], b"GET /index.html HTTP/1.0\r\n\r\n");
//! ```

mod body;
mod head_decoder;
mod head_encoder;
mod head_reader;

pub use body::BodyKind;
pub use head_decoder::HeadDecoder;
pub use head_decoder::MAX_HEADERS;
pub use head_decoder::MAX_HEAD_BYTES;
pub use head_encoder::HeadEncoder;
pub(crate) use head_encoder::encode_head;
pub use head_reader::read_head;
