//! Host-advanced monotonic clock.
//!
//! The stack is driven entirely by its embedder: there is no timer hardware
//! here.  The embedder's periodic timer calls [`advance_ms`] and every other
//! component reads [`uptime_ms`].  Before the first advance, all accessors
//! return `0`.

use core::sync::atomic::{AtomicU64, Ordering};

static UPTIME_MS: AtomicU64 = AtomicU64::new(0);

/// Advance the monotonic clock by `delta` milliseconds.
///
/// Called from the embedder's timer path.
#[inline]
pub fn advance_ms(delta: u64) {
    UPTIME_MS.fetch_add(delta, Ordering::Relaxed);
}

/// Milliseconds since the embedder started driving the clock.
#[inline]
pub fn uptime_ms() -> u64 {
    UPTIME_MS.load(Ordering::Relaxed)
}
