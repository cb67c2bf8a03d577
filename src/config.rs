//! Configuration values consumed by the stream writer.

use std::time::Duration;

/// Default number of reconnection attempts before giving up.
pub const DEFAULT_MAX_RECONNECT: u32 = 3;
/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default capacity of the pending-frame buffer.
pub const DEFAULT_PENDING_CAPACITY: usize = 1024;
/// Default grace period allowed for in-flight producers during close.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);
/// Default bound on waiting for the write guard during close.
pub const DEFAULT_CLOSE_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Bounded-reconnection policy applied to every write.
///
/// A write runs for `max_reconnect + 1` attempts, sleeping `reconnect_delay`
/// and re-dialing between them. Constant after construction.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of sleep/re-dial rounds per write.
    pub max_reconnect: u32,
    /// Delay observed before each re-dial.
    pub reconnect_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_reconnect: DEFAULT_MAX_RECONNECT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Runtime options for a [`SocketWriter`](crate::writer::SocketWriter).
#[derive(Clone, Debug)]
pub struct WriterOptions {
    /// Retry behaviour for failed writes.
    pub retry: RetryPolicy,
    /// Maximum number of undelivered frames retained for flushing; the
    /// oldest frame is discarded (and counted) once the cap is reached.
    pub pending_capacity: usize,
    /// How long close waits for producers still enqueueing work.
    pub close_grace: Duration,
    /// How long close waits for the write guard before tearing the
    /// connection down regardless.
    pub close_lock_timeout: Duration,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            close_grace: DEFAULT_CLOSE_GRACE,
            close_lock_timeout: DEFAULT_CLOSE_LOCK_TIMEOUT,
        }
    }
}

impl WriterOptions {
    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the pending-frame capacity.
    pub fn with_pending_capacity(mut self, capacity: usize) -> Self {
        self.pending_capacity = capacity;
        self
    }

    /// Override the close grace period.
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Override the close guard-acquisition timeout.
    pub fn with_close_lock_timeout(mut self, timeout: Duration) -> Self {
        self.close_lock_timeout = timeout;
        self
    }
}
