use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::ParseError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("can't connect to {address}, cause: {source}")]
    Connect { address: String, source: io::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("invalid response: {source}")]
    Parse { source: ParseError },

    #[error("{operation} timed out after {duration:?}")]
    Timeout { operation: &'static str, duration: Duration },

    #[error("connection closed before a response was received")]
    Closed,

    #[error("request failed after {attempts} attempts, last cause: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Returns true if the failure came from the connection rather than from the exchanged
    /// messages, so that the request can be retried on a fresh connection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Io { .. } | Self::Closed)
    }
}

impl From<ParseError> for ClientError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Io { source } => Self::Io { source },
            e => Self::Parse { source: e },
        }
    }
}
