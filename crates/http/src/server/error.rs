use std::io;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("address must be set")]
    MissingAddress,

    #[error("listener must be set")]
    MissingListener,

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("can't bind {address}, cause: {source}")]
    Bind { address: SocketAddr, source: io::Error },

    #[error("accept failed: {source}")]
    Accept {
        #[from]
        source: io::Error,
    },

    #[error("server is already listening")]
    AlreadyStarted,
}

impl ServerError {
    pub fn invalid_address<S: ToString>(str: S) -> Self {
        Self::InvalidAddress { reason: str.to_string() }
    }
}
