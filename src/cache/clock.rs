//! Clock Module
//!
//! Time sources used to compute entry expiration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

// == Clock Trait ==
/// A source of monotonic time for expiration math.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

// == System Clock ==
/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// == Manual Clock ==
/// A virtual clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to a cache:
///
/// ```
/// use std::time::Duration;
/// use ttl_cache::cache::{Cache, ManualClock};
///
/// let clock = ManualClock::new();
/// let cache: Cache<u32, ManualClock> = Cache::with_clock(clock.clone());
///
/// cache.set("answer", 42, Duration::from_secs(10));
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(cache.get("answer"), None);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates a clock starting at the current real instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
