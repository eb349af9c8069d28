//! TTL Cache - A thread-safe in-memory cache for command-line tooling
//!
//! Stores values under string keys with a per-entry TTL. Expired entries are
//! treated as misses on read and removed lazily, either by later writes to
//! the same key or by an optional background reaper. A runtime gate can
//! disable caching without discarding what is already stored.
//!
//! ```
//! use std::time::Duration;
//! use ttl_cache::cache::{ttl, Cache};
//!
//! let cache: Cache<String> = Cache::new();
//! cache.set("user:1", "Alice".to_string(), ttl::METADATA);
//! assert_eq!(cache.get("user:1").as_deref(), Some("Alice"));
//!
//! cache.disable();
//! assert_eq!(cache.get("user:1"), None);
//! cache.enable();
//! assert_eq!(cache.get("user:1").as_deref(), Some("Alice"));
//!
//! cache.set("gone", "x".to_string(), Duration::ZERO);
//! assert_eq!(cache.size(), 2);
//! assert_eq!(cache.cleanup(), 1);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, Clock, ManualClock, StatsSnapshot, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{spawn_cleanup_task, CleanupHandle};
