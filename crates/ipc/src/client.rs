//! Unix socket client handle
//!
//! Owns one connection generation at a time: the write half of the socket, the
//! receiving end of the result channel, and the shutdown signal of the reader
//! task draining the read half.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::reader::read_loop;
use crate::response::{ReadError, ReadResult};

/// Client for exchanging raw bytes with a process listening on a Unix socket
///
/// There is no framing and no request IDs. The response to a write is simply
/// whatever chunk the reader publishes next, which may be part of an earlier
/// reply, several replies, or a fragment of a large one. Callers needing
/// strict correlation must layer their own framing on top.
///
/// Every operation that writes or waits takes `&mut self`, so writers sharing
/// one handle are serialized and cannot consume each other's responses.
#[derive(Debug)]
pub struct Client {
    socket_path: PathBuf,
    conn: Option<Connection>,
}

/// One live connection generation
#[derive(Debug)]
struct Connection {
    writer: OwnedWriteHalf,
    results: mpsc::UnboundedReceiver<ReadResult>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Connection {
    /// Whether a close was requested for this generation, possibly by a Closer
    fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Outstanding Closers keep the sender alive, so signal explicitly
        self.shutdown.send_replace(true);
    }
}

/// Closes one connection generation from outside the owning handle
///
/// Obtained from [`Client::closer`] before a blocking wait, so another task can
/// unblock that wait. Closing delivers a [`ReadError::Closed`] result to the
/// waiter. A closer never affects a later generation of the same client.
#[derive(Debug, Clone)]
pub struct Closer {
    shutdown: Arc<watch::Sender<bool>>,
}

impl Closer {
    /// Request the connection to close; does not wait for the reader to exit
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Client {
    /// Create a new client for the given socket path
    ///
    /// Nothing is dialed until [`Client::connect`] is called.
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            conn: None,
        }
    }

    /// Create a client and connect it in one step
    pub async fn connect_to(socket_path: impl AsRef<Path>) -> Result<Self> {
        let mut client = Self::new(socket_path);
        client.connect().await?;
        Ok(client)
    }

    /// Get the socket path
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Check if a connection generation is currently live
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| !conn.is_closed())
    }

    /// Connect to the socket and start the background reader
    ///
    /// An existing connection is closed and replaced. On failure the client
    /// is left disconnected and connecting may be retried.
    pub async fn connect(&mut self) -> Result<()> {
        self.close();

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| Error::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        let (reader, writer) = stream.into_split();
        let (results_tx, results) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        tokio::spawn(read_loop(reader, results_tx, shutdown_rx));

        self.conn = Some(Connection {
            writer,
            results,
            shutdown: Arc::new(shutdown),
        });

        debug!(path = %self.socket_path.display(), "Connected to socket");
        Ok(())
    }

    /// Get a closer for the current connection, if any
    pub fn closer(&self) -> Option<Closer> {
        self.conn.as_ref().map(|conn| Closer {
            shutdown: Arc::clone(&conn.shutdown),
        })
    }

    /// Write bytes without waiting for a response
    ///
    /// Returns the number of bytes written, which on success is always
    /// `data.len()`. A generation closed through a [`Closer`] is released
    /// here and the write fails with [`Error::NotConnected`].
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.conn.as_ref().is_some_and(Connection::is_closed) {
            self.close();
        }
        let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;

        let mut written = 0;
        while written < data.len() {
            match conn.writer.write(&data[written..]).await {
                Ok(0) => {
                    return Err(Error::Write {
                        written,
                        source: std::io::ErrorKind::WriteZero.into(),
                    });
                }
                Ok(n) => written += n,
                Err(source) => return Err(Error::Write { written, source }),
            }
        }
        conn.writer
            .flush()
            .await
            .map_err(|source| Error::Write { written, source })?;

        trace!(bytes = written, "Wrote to socket");
        Ok(written)
    }

    /// Write bytes, then hand the next read result to `handler`
    ///
    /// The handler runs exactly once, before this call returns. The result it
    /// receives is the next chunk the reader publishes, not necessarily a
    /// reply to these bytes. If the write fails the handler is not called.
    pub async fn write_with<F>(&mut self, data: &[u8], handler: F) -> Result<usize>
    where
        F: FnOnce(ReadResult),
    {
        let written = self.write(data).await?;
        let result = self.next_result().await?;
        handler(result);
        Ok(written)
    }

    /// Write bytes, then feed read results to `handler` until it breaks
    ///
    /// Stops after the handler returns [`ControlFlow::Break`] or once a
    /// terminal result has been handed to it.
    pub async fn write_until<F>(&mut self, data: &[u8], mut handler: F) -> Result<usize>
    where
        F: FnMut(&ReadResult) -> ControlFlow<()>,
    {
        let written = self.write(data).await?;
        loop {
            let result = self.next_result().await?;
            if handler(&result).is_break() || result.is_terminal() {
                break;
            }
        }
        Ok(written)
    }

    /// Hand every read result to `handler` until the connection ends
    ///
    /// The terminal result is delivered too, after which the connection is
    /// released and the client is disconnected.
    pub async fn listen<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(ReadResult),
    {
        loop {
            let result = self.next_result().await?;
            let done = result.is_terminal();
            handler(result);
            if done {
                break;
            }
        }
        self.close();
        Ok(())
    }

    /// Wait for the next read result without writing anything
    pub async fn next_result(&mut self) -> Result<ReadResult> {
        let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;
        // The reader always publishes a terminal result before exiting, but
        // a closed channel must never leave the caller hanging
        let result = conn
            .results
            .recv()
            .await
            .unwrap_or_else(|| ReadResult::terminal(ReadError::Closed));

        // A Closer ended this generation; release the write side as well
        if result.is_terminal() && conn.is_closed() {
            self.close();
        }
        Ok(result)
    }

    /// Like [`Client::next_result`], giving up after `timeout`
    ///
    /// A result arriving after the timeout stays queued for the next wait.
    pub async fn next_result_timeout(&mut self, timeout: Duration) -> Result<ReadResult> {
        tokio::time::timeout(timeout, self.next_result())
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    /// Close the current connection, if any
    ///
    /// The reader is signalled and publishes a terminal result, but this call
    /// does not wait for it. Closing a disconnected client does nothing.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            debug!(path = %self.socket_path.display(), "Closed socket connection");
        }
    }
}
