//! Resilient TCP/TLS stream transport for GELF log frames.
//!
//! `gelfstream` delivers already-serialized log records to a remote collector
//! over a persistent stream connection, framing each payload with a single
//! trailing NUL byte. The writer tolerates transient network failure through
//! a bounded retry loop that re-dials between attempts, and retains frames
//! that failed terminal delivery in a bounded in-memory buffer, flushing them
//! opportunistically after the next successful write.
//!
//! Delivery is at-least-once best-effort: nothing is persisted across
//! restarts, ordering is not preserved across reconnects, and
//! [`SocketWriter::close`] does not flush.
//!
//! ```no_run
//! use gelfstream::WriterBuilder;
//!
//! let writer = WriterBuilder::new()
//!     .with_addr("graylog.example.com", 12201)
//!     .with_tls(None, false)
//!     .build()?;
//! writer.submit(&br#"{"version":"1.1","short_message":"hi"}"#.to_vec())?;
//! writer.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod config;
mod error;
mod transport;
mod warn;
mod wire;
mod writer;


pub use builder::{EndpointWriter, WriterBuilder};
pub use config::{
    DEFAULT_CLOSE_GRACE, DEFAULT_CLOSE_LOCK_TIMEOUT, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_MAX_RECONNECT, DEFAULT_PENDING_CAPACITY, DEFAULT_RECONNECT_DELAY, RetryPolicy,
    WriterOptions,
};
pub use error::{BuildError, RetryExhausted, WriterError};
pub use transport::{
    ActiveConnection, Connection, Dial, Endpoint, EndpointDialer, ShutdownHandle, TlsOptions,
    connect_endpoint,
};
pub use wire::{FRAME_TERMINATOR, WireRecord, frame_payload};
pub use writer::SocketWriter;
