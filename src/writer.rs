//! Resilient delivery core: one connection, bounded retry, pending flush.

use std::{
    collections::VecDeque,
    io,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::{
    config::WriterOptions,
    error::{RetryExhausted, WriterError},
    transport::{Connection, Dial, ShutdownHandle},
    warn::DropWarner,
    wire::{WireRecord, frame_payload},
};

struct WriterState<C> {
    conn: Option<C>,
    pending: VecDeque<Vec<u8>>,
}

/// Stream writer with bounded-retry reconnection and best-effort retention.
///
/// The writer owns at most one live connection, obtained through its
/// [`Dial`] capability. A single mutex serializes the whole
/// attempt/sleep/re-dial/flush sequence: concurrent submitters block while
/// one caller drives the retry loop, and the inter-attempt sleep and dial
/// latency are imposed on everyone waiting. That is a deliberate
/// simplicity-over-throughput tradeoff for a logging path; do not move the
/// sleep outside the guard without revisiting the serialization contract.
///
/// Frames that fail terminal delivery through [`submit`](Self::submit) are
/// retained in a bounded in-memory buffer and re-attempted after the next
/// successful write. Delivery is at-least-once best-effort: nothing survives
/// a process restart, and [`close`](Self::close) does not flush.
pub struct SocketWriter<D: Dial> {
    dialer: D,
    options: WriterOptions,
    state: Mutex<WriterState<D::Conn>>,
    shutdown: Mutex<Option<ShutdownHandle>>,
    closed: AtomicBool,
    drops: DropWarner,
}

impl<D: Dial> std::fmt::Debug for SocketWriter<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketWriter")
            .field("options", &self.options)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<D: Dial> SocketWriter<D> {
    /// Create a writer without connecting.
    ///
    /// The first write finds the connection absent and goes through the
    /// reconnect path. Use [`connect`](Self::connect) to fail fast instead.
    pub fn new(dialer: D, options: WriterOptions) -> Self {
        Self {
            dialer,
            options,
            state: Mutex::new(WriterState {
                conn: None,
                pending: VecDeque::new(),
            }),
            shutdown: Mutex::new(None),
            closed: AtomicBool::new(false),
            drops: DropWarner::new(),
        }
    }

    /// Create a writer and establish the initial connection eagerly.
    ///
    /// Fails with [`WriterError::Dial`] when the collector is unreachable.
    pub fn connect(dialer: D, options: WriterOptions) -> Result<Self, WriterError> {
        let writer = Self::new(dialer, options);
        let conn = writer.dialer.dial().map_err(WriterError::Dial)?;
        *writer.shutdown.lock() = Some(conn.shutdown_handle());
        writer.state.lock().conn = Some(conn);
        Ok(writer)
    }

    /// Serialize `record`, frame it, and deliver it.
    ///
    /// Serialization failure returns immediately without touching the network
    /// or the pending buffer. Any delivery failure retains the frame for
    /// opportunistic redelivery and returns the error; no bytes are reported
    /// as delivered in that case. Never panics on network failure.
    pub fn submit<R: WireRecord + ?Sized>(&self, record: &R) -> Result<usize, WriterError> {
        let payload = record.to_wire().map_err(WriterError::Serialize)?;
        let frame = frame_payload(&payload).ok_or_else(|| {
            WriterError::Serialize(io::Error::new(
                io::ErrorKind::InvalidData,
                "payload contains the frame terminator",
            ))
        })?;
        self.deliver(&frame, true)
    }

    /// Deliver an already-framed payload (terminator included).
    ///
    /// Runs the retry-bounded write loop and, on success, flushes the pending
    /// buffer before returning the byte count. A complete-looking write that
    /// accepted fewer bytes than the frame length is reported as
    /// [`WriterError::ShortWrite`]. Unlike [`submit`](Self::submit), failures
    /// are not retained.
    pub fn write_frame(&self, frame: &[u8]) -> Result<usize, WriterError> {
        self.deliver(frame, false)
    }

    /// Number of frames currently awaiting redelivery.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Total frames discarded by pending-buffer eviction.
    pub fn dropped_frames(&self) -> u64 {
        self.drops.total()
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.state.lock().conn.is_some()
    }

    /// Close the writer's connection, best-effort.
    ///
    /// Idempotent; a second call is a no-op, and a writer that never
    /// connected succeeds trivially. Otherwise close sleeps a short grace
    /// period so in-flight producers can finish enqueueing, waits a bounded
    /// time for the write guard, then tears the connection down — even when
    /// the guard could not be acquired, so close never blocks indefinitely.
    /// Any send blocked inside the retry loop observes an immediate failure.
    /// Pending frames are not flushed; callers needing delivery before
    /// shutdown must drain via writes beforehand.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(state) = self.state.try_lock()
            && state.conn.is_none()
        {
            return;
        }
        thread::sleep(self.options.close_grace);
        match self.state.try_lock_for(self.options.close_lock_timeout) {
            Some(mut state) => {
                state.conn = None;
            }
            None => warn!(
                "close: write guard still held after {:?}; tearing the connection down anyway",
                self.options.close_lock_timeout
            ),
        }
        if let Some(handle) = self.shutdown.lock().take() {
            handle.shutdown();
        }
    }

    fn deliver(&self, frame: &[u8], retain_on_failure: bool) -> Result<usize, WriterError> {
        let mut state = self.state.lock();
        let result = self.send_with_retry(&mut state, frame).and_then(|n| {
            self.flush_pending(&mut state);
            if n == frame.len() {
                Ok(n)
            } else {
                Err(WriterError::ShortWrite {
                    written: n,
                    expected: frame.len(),
                })
            }
        });
        if result.is_err() && retain_on_failure {
            self.retain(&mut state, frame.to_vec());
        }
        result
    }

    /// The retry loop: `max_reconnect + 1` attempts, with a fixed sleep and a
    /// re-dial between attempts. A successful raw write breaks out
    /// immediately without consuming the remaining budget. A failed dial
    /// leaves the connection absent; the next iteration counts that as a
    /// failed attempt, and the dial error surfaces only in the terminal
    /// report.
    fn send_with_retry(
        &self,
        state: &mut WriterState<D::Conn>,
        frame: &[u8],
    ) -> Result<usize, WriterError> {
        let retry = &self.options.retry;
        let attempts = retry.max_reconnect + 1;
        let mut write_err: Option<io::Error> = None;
        let mut dial_err: Option<io::Error> = None;

        for attempt in 0..attempts {
            let outcome = match state.conn.as_mut() {
                Some(conn) => conn.send(frame),
                None => Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "connection absent, will attempt reconnect",
                )),
            };
            match outcome {
                Ok(n) => return Ok(n),
                Err(err) => {
                    warn!("write attempt {}/{attempts} failed: {err}", attempt + 1);
                    write_err = Some(err);
                    if attempt < retry.max_reconnect {
                        thread::sleep(retry.reconnect_delay);
                        match self.dialer.dial() {
                            Ok(conn) => {
                                debug!("reconnected after attempt {}", attempt + 1);
                                *self.shutdown.lock() = Some(conn.shutdown_handle());
                                state.conn = Some(conn);
                                dial_err = None;
                            }
                            Err(err) => {
                                warn!("reconnection failed: {err}");
                                *self.shutdown.lock() = None;
                                state.conn = None;
                                dial_err = Some(err);
                            }
                        }
                    }
                }
            }
        }

        let write = write_err.unwrap_or_else(|| io::Error::other("no write attempted"));
        Err(RetryExhausted {
            attempts,
            write,
            dial: dial_err,
        }
        .into())
    }

    /// Re-attempt every frame retained at flush start, keeping the failures.
    ///
    /// Runs under the write guard and never re-enters itself: redelivery goes
    /// through the raw retry loop, not the public path.
    fn flush_pending(&self, state: &mut WriterState<D::Conn>) {
        if state.pending.is_empty() {
            return;
        }
        debug!("flushing {} pending frames", state.pending.len());
        let mut remaining = VecDeque::new();
        while let Some(frame) = state.pending.pop_front() {
            match self.send_with_retry(state, &frame) {
                Ok(n) if n == frame.len() => {}
                Ok(n) => {
                    warn!("pending frame redelivered short ({n}/{}); kept", frame.len());
                    remaining.push_back(frame);
                }
                Err(err) => {
                    warn!("pending frame redelivery failed: {err}");
                    remaining.push_back(frame);
                }
            }
        }
        state.pending = remaining;
    }

    fn retain(&self, state: &mut WriterState<D::Conn>, frame: Vec<u8>) {
        let capacity = self.options.pending_capacity;
        if capacity == 0 {
            self.drops.record_drop();
            self.drops
                .warn_if_due(|count| warn!("retention disabled; discarded {count} frames"));
            return;
        }
        while state.pending.len() >= capacity {
            state.pending.pop_front();
            self.drops.record_drop();
            self.drops
                .warn_if_due(|count| warn!("pending buffer full; discarded {count} oldest frames"));
        }
        state.pending.push_back(frame);
    }
}
