//! Error types for the cache
//!
//! Cache data operations cannot fail; only starting the reaper can.

use thiserror::Error;

// == Cache Error Enum ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Reaper interval was zero or longer than `MAX_CLEANUP_INTERVAL`
    #[error("Cleanup interval must be greater than zero and at most one year")]
    InvalidInterval,

    /// Reaper started outside a tokio runtime
    #[error("Cleanup task requires a running tokio runtime")]
    NoRuntime,

    /// A reaper is already running for this cache
    #[error("A cleanup task is already running for this cache")]
    ReaperAlreadyRunning,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
