//! Read results published by the background reader
//!
//! The socket is treated as an untyped byte stream: a result carries whatever
//! chunk a single read produced, or the terminal reason the stream ended.

use std::io;

use thiserror::Error;

/// Terminal outcome of a connection's read side
///
/// Delivered as part of a [`ReadResult`], never returned as an `Err` from
/// the client calls. Receiving one is the normal end of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The peer closed its end of the stream
    #[error("Connection closed by peer")]
    Eof,
    /// The connection was closed locally
    #[error("Connection closed")]
    Closed,
    /// The transport reported a read failure
    #[error("Read failed: {message}")]
    Io { kind: io::ErrorKind, message: String },
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        ReadError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// One published outcome of a single socket read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    data: Vec<u8>,
    error: Option<ReadError>,
}

impl ReadResult {
    /// A chunk of bytes read off the wire
    pub fn data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            error: None,
        }
    }

    /// A terminal result with an empty payload
    pub fn terminal(error: ReadError) -> Self {
        Self {
            data: Vec::new(),
            error: Some(error),
        }
    }

    /// Payload bytes; always empty for terminal results
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// The failure outcome, if this result ended the connection
    pub fn error(&self) -> Option<&ReadError> {
        self.error.as_ref()
    }

    /// Check if this result ended the connection
    pub fn is_terminal(&self) -> bool {
        self.error.is_some()
    }

    /// Get the payload, returning the error if this result was terminal
    pub fn into_result(self) -> Result<Vec<u8>, ReadError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}
