//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Cleanup reaper: removes stale cache entries at a fixed interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, CleanupHandle, MAX_CLEANUP_INTERVAL};
