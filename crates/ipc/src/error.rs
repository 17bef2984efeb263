//! Error types for the socket client

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to connect to socket at {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No available unix socket connection to write")]
    NotConnected,

    #[error("Write failed after {written} bytes: {source}")]
    Write {
        written: usize,
        #[source]
        source: io::Error,
    },

    #[error("Timed out after {0:?} waiting for a read result")]
    Timeout(Duration),
}

impl Error {
    /// Bytes that reached the socket before the error occurred
    pub fn bytes_written(&self) -> usize {
        match self {
            Error::Write { written, .. } => *written,
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
