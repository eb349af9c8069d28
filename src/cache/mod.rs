//! Cache Module
//!
//! Provides an in-memory cache with lazy TTL expiration and a runtime
//! enable/disable gate.

mod clock;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub(crate) use entry::CacheEntry;
pub(crate) use stats::CacheStats;
pub use stats::StatsSnapshot;
pub use store::Cache;
pub(crate) use store::Shared;

// == TTL Presets ==
/// Common TTLs. Plain durations with no special meaning to the cache.
pub mod ttl {
    use std::time::Duration;

    /// Values that go out of date within a minute or so.
    pub const SHORT: Duration = Duration::from_secs(60);

    /// Short-lived metadata such as remote listings or version lookups.
    pub const METADATA: Duration = Duration::from_secs(5 * 60);

    pub const MEDIUM: Duration = Duration::from_secs(15 * 60);

    /// Long-lived database entries.
    pub const DATABASE: Duration = Duration::from_secs(60 * 60);

    pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);
}
