use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while querying a server.
///
/// The variants separate "nothing came back" from "something came back,
/// but not from a Source server" from "something came back, but it could
/// not be decoded".
#[derive(Debug, Error)]
pub enum SourceQueryError {
    /// The endpoint could not be resolved, bound, connected, or written to.
    #[error("unable to connect to {endpoint}: {source}")]
    UnableToConnect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// No reply datagram arrived before the endpoint's timeout.
    #[error("did not receive a reply from {endpoint} within {timeout:?}")]
    DidNotReceive { endpoint: String, timeout: Duration },

    /// A reply arrived, but its header byte is not the one the request expects.
    #[error("invalid server reply: expected header {expected:#04x}, got {found:#04x}")]
    InvalidServer { expected: u8, found: u8 },

    /// A reply arrived, but it was truncated or held an undecodable string.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<std::str::Utf8Error> for SourceQueryError {
    fn from(e: std::str::Utf8Error) -> Self {
        SourceQueryError::MalformedResponse(format!("invalid utf-8 in string: {e}"))
    }
}
