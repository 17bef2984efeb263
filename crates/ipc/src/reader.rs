//! Background reader loop
//!
//! Drains a connection's read side into the result channel. One loop runs per
//! connection generation and it is the only reader of that connection.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::response::{ReadError, ReadResult};

/// Upper bound on the payload of a single read result
pub const READ_BUFFER_SIZE: usize = 1024;

/// Read until the first error, publishing one result per read
///
/// Data chunks are published verbatim and in arrival order. EOF, a transport
/// error, or a shutdown signal publishes a single terminal result and ends
/// the loop. The shutdown receiver fires on any change and also when its
/// sender is dropped.
pub async fn read_loop<R>(
    mut reader: R,
    results: mpsc::UnboundedSender<ReadResult>,
    mut shutdown: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let outcome = tokio::select! {
            biased;
            _ = shutdown.changed() => Err(ReadError::Closed),
            read = reader.read(&mut buf) => match read {
                Ok(0) => Err(ReadError::Eof),
                Ok(n) => Ok(n),
                Err(e) => Err(ReadError::from(e)),
            },
        };

        match outcome {
            Ok(n) => {
                trace!(bytes = n, "Read chunk from socket");
                if results.send(ReadResult::data(&buf[..n])).is_err() {
                    debug!("Result channel dropped, stopping reader");
                    return;
                }
            }
            Err(reason) => {
                debug!(%reason, "Reader loop finished");
                // Nobody may be listening anymore (old generation)
                let _ = results.send(ReadResult::terminal(reason));
                return;
            }
        }
    }
}
