//! Core HTTP message abstractions.
//!
//! This module holds the protocol data model shared by the server and client sides:
//!
//! - [`Url`]: `protocol://host[:port]/path` targets with fail-fast rendering
//! - [`Header`]: case-insensitive, single-valued, insertion-ordered header bag
//! - [`Request`] / [`Response`]: message heads with their start-line grammar
//! - [`MessageHead`]: the seam the codec uses to parse and serialize either head
//! - [`HttpVersion`], [`ConnectionMode`]: the protocol labels the engine acts on
//! - [`ParseError`], [`SendError`], [`HttpError`]: the error taxonomy
//!
//! Message bodies are not part of these types. Payload bytes travel as plain async byte
//! streams next to the head, see [`crate::connection`] and [`crate::client`].

mod message;
pub use message::MessageHead;

mod url;
pub use url::DEFAULT_PORT;
pub use url::Url;

mod header;
pub use header::ConnectionMode;
pub use header::Header;

mod http_version;
pub use http_version::HttpVersion;

mod request;
pub use request::OutgoingRequest;
pub use request::Request;

mod response;
pub use response::Response;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
