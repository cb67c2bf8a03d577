//! Error types surfaced by the writer and its builder.

use std::{fmt, io};

use thiserror::Error;

/// Errors returned by write and submit operations.
#[derive(Debug, Error)]
pub enum WriterError {
    /// The record could not be serialized; nothing touched the network.
    #[error("serialization failed: {0}")]
    Serialize(#[source] io::Error),
    /// The connection accepted fewer bytes than the frame length without
    /// reporting an error. Wire frames are atomic, so a partial frame is a
    /// delivery failure.
    #[error("bad write ({written}/{expected})")]
    ShortWrite {
        /// Bytes the connection accepted.
        written: usize,
        /// Length of the frame.
        expected: usize,
    },
    /// Every configured attempt failed; terminal for this write.
    #[error(transparent)]
    RetryExhausted(#[from] RetryExhausted),
    /// Eager construction could not establish the initial connection.
    #[error("failed to connect: {0}")]
    Dial(#[source] io::Error),
}

/// Terminal report after the retry budget is spent.
///
/// Carries the last write failure and, when the most recent re-dial also
/// failed, the dial failure alongside it.
#[derive(Debug)]
pub struct RetryExhausted {
    /// Write attempts performed (`max_reconnect + 1`).
    pub attempts: u32,
    /// The failure observed on the final write attempt.
    pub write: io::Error,
    /// The failure of the most recent re-dial, if it failed.
    pub dial: Option<io::Error>,
}

impl fmt::Display for RetryExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "maximum reconnection attempts reached after {} attempts; giving up: write failed: {}",
            self.attempts, self.write
        )?;
        if let Some(dial) = &self.dial {
            write!(f, "; reconnection failed: {dial}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RetryExhausted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.write)
    }
}

/// Errors reported while validating and building a writer.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid writer configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst establishing the initial connection.
    #[error(transparent)]
    Io(#[from] io::Error),
}
