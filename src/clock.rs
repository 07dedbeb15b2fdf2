//! Ledger time source
//!
//! Entry timestamps come from the confirming ledger, not the caller's
//! clock. The processor takes the clock as an injected capability so its
//! output stays a pure function of its committed inputs.

use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the ledger-confirmed current time.
pub trait LedgerClock: Send + Sync {
    /// Current time as seconds since the Unix epoch
    fn unix_timestamp(&self) -> i64;
}

/// Wall-clock implementation for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl LedgerClock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for hosts that relay an external confirming
/// system's time, and for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock pinned at the given timestamp
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Pin the clock to a new timestamp
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advance the clock by `secs`
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl LedgerClock for ManualClock {
    fn unix_timestamp(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
