//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with an absolute expiry.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored value and the instant it stops being live.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration instant, None = `now + ttl` overflowed and the entry never expires
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    ///
    /// A zero `ttl` produces an entry that is already stale.
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    // == Is Live ==
    /// Returns true while `now` is strictly before the expiration instant.
    ///
    /// Boundary condition: at exactly `expires_at` the entry is stale.
    #[inline]
    pub fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now < expires,
            None => true,
        }
    }

    // == Time To Live ==
    /// Returns the time left before the entry goes stale.
    ///
    /// - `Some(Duration::ZERO)` if the entry is stale
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}
