//! Rate-limited accounting for discarded frames.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// How often to emit warnings about discarded frames.
pub const WARN_RATE_LIMIT_SECS: u64 = 5;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Helper that rate limits discarded-frame warnings.
///
/// The writer increments the counter via [`record_drop`](Self::record_drop)
/// whenever the pending buffer evicts a frame. The next call to
/// [`warn_if_due`](Self::warn_if_due) emits a warning through the provided
/// callback if the interval has elapsed. The total survives emission and is
/// readable via [`total`](Self::total) for observability.
#[derive(Default)]
pub struct DropWarner {
    last_warn: AtomicU64,
    pending: AtomicU64,
    total: AtomicU64,
}

impl DropWarner {
    /// Create a new [`DropWarner`]. The first warning can be emitted
    /// immediately.
    pub fn new() -> Self {
        Self {
            last_warn: AtomicU64::new(now_secs().saturating_sub(WARN_RATE_LIMIT_SECS)),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record one discarded frame.
    pub fn record_drop(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Total frames discarded over the writer's lifetime.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Emit a warning if the rate limit interval has elapsed.
    pub fn warn_if_due(&self, mut warn: impl FnMut(u64)) {
        let now = now_secs();
        let prev = self.last_warn.load(Ordering::Relaxed);
        if now.saturating_sub(prev) >= WARN_RATE_LIMIT_SECS {
            let count = self.pending.swap(0, Ordering::Relaxed);
            if count > 0 {
                warn(count);
            }
            self.last_warn.store(now, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_first_warning_immediately() {
        let warner = DropWarner::new();
        let mut warnings = Vec::new();
        warner.record_drop();
        warner.warn_if_due(|c| warnings.push(c));
        assert_eq!(warnings, vec![1]);
    }

    #[test]
    fn rate_limits_subsequent_warnings() {
        let warner = DropWarner::new();
        let mut warnings = Vec::new();
        warner.record_drop();
        warner.warn_if_due(|c| warnings.push(c));
        warner.record_drop();
        warner.warn_if_due(|c| warnings.push(c));
        assert_eq!(warnings, vec![1]);
    }

    #[test]
    fn total_survives_emission() {
        let warner = DropWarner::new();
        warner.record_drop();
        warner.record_drop();
        warner.warn_if_due(|_| {});
        assert_eq!(warner.total(), 2);
    }
}
