//! Raw byte-stream client for processes listening on Unix sockets
//!
//! This crate dials a Unix domain socket, drains everything the peer sends
//! into an in-order queue of read results on a background task, and lets the
//! caller write bytes and optionally wait for the next result. It has no
//! knowledge of the peer's protocol: bytes go out and come back verbatim.
//!
//! # Architecture
//!
//! ```text
//!   Caller                    Client                        Peer
//! ┌──────────┐  write()   ┌──────────────┐   write half  ┌──────────┐
//! │          │──────────> │ OwnedWrite   │──────────────>│          │
//! │          │            ├──────────────┤               │ listening│
//! │ handler  │<───────────│ result queue │<── read_loop ─│  process │
//! └──────────┘ next chunk └──────────────┘   read half   └──────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ipc::Client;
//!
//! let mut client = Client::new("/tmp/mysocket");
//! client.connect().await?;
//!
//! client
//!     .write_with(b"hello", |res| println!("received: {:?}", res.payload()))
//!     .await?;
//!
//! client.close();
//! ```

mod client;
mod error;
mod reader;
mod response;

pub use client::{Client, Closer};
pub use error::{Error, Result};
pub use reader::READ_BUFFER_SIZE;
pub use response::{ReadError, ReadResult};
