//! Cleanup Reaper Task
//!
//! Background task that periodically removes stale cache entries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{Cache, Clock, Shared};
use crate::error::{CacheError, Result};

/// Longest accepted reaper interval (one year).
pub const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Source of reaper ids; 0 is reserved for "no reaper".
static NEXT_REAPER_ID: AtomicU64 = AtomicU64::new(1);

/// Spawns a background task that runs [`Cache::cleanup`] once per `interval`.
///
/// The first pass happens one `interval` after the call. Each pass runs to
/// completion inside its tick, so passes never overlap. The task only holds a
/// weak reference to the cache and exits by itself once every `Cache` handle
/// has been dropped.
///
/// # Errors
/// - [`CacheError::InvalidInterval`] if `interval` is zero or above [`MAX_CLEANUP_INTERVAL`]
/// - [`CacheError::NoRuntime`] if called outside a tokio runtime
/// - [`CacheError::ReaperAlreadyRunning`] if this cache already has a reaper
///
/// # Example
/// ```ignore
/// let cache: Cache<String> = Cache::new();
/// let reaper = spawn_cleanup_task(&cache, Duration::from_secs(30))?;
/// // Later, during shutdown:
/// reaper.stop();
/// ```
pub fn spawn_cleanup_task<V, C>(cache: &Cache<V, C>, interval: Duration) -> Result<CleanupHandle>
where
    V: Send + Sync + 'static,
    C: Clock,
{
    if interval.is_zero() || interval > MAX_CLEANUP_INTERVAL {
        return Err(CacheError::InvalidInterval);
    }
    let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let start = time::Instant::now()
        .checked_add(interval)
        .ok_or(CacheError::InvalidInterval)?;

    let id = NEXT_REAPER_ID.fetch_add(1, Ordering::Relaxed);
    let slot = ReaperSlot {
        slot: Arc::clone(cache.reaper_slot()),
        id,
    };
    if slot
        .slot
        .compare_exchange(0, id, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(CacheError::ReaperAlreadyRunning);
    }

    let (stop_tx, stop_rx) = oneshot::channel();
    let task = runtime.spawn(run_reaper(
        cache.downgrade(),
        start,
        interval,
        stop_rx,
        slot.clone(),
    ));

    info!(
        "Starting cache cleanup task with interval of {}ms",
        interval.as_millis()
    );

    Ok(CleanupHandle {
        stop: Some(stop_tx),
        task,
        slot,
    })
}

async fn run_reaper<V, C>(
    cache: Weak<Shared<V, C>>,
    start: time::Instant,
    interval: Duration,
    mut stop: oneshot::Receiver<()>,
    // Dropped with the future, so the slot is freed on exit, panic or runtime shutdown.
    _slot: ReaperSlot,
) where
    V: Send + Sync + 'static,
    C: Clock,
{
    let mut ticker = time::interval_at(start, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Stop wins over a ready tick.
            biased;

            _ = &mut stop => break,
            _ = ticker.tick() => {
                let Some(shared) = cache.upgrade() else {
                    debug!("Cache dropped, cleanup task exiting");
                    break;
                };
                let removed = Cache::from_shared(shared).cleanup();

                if removed > 0 {
                    info!("Cache cleanup: removed {} stale entries", removed);
                } else {
                    debug!("Cache cleanup: no stale entries found");
                }
            }
        }
    }
}

// == Reaper Slot ==
/// A claim on a cache's single reaper slot.
#[derive(Debug, Clone)]
struct ReaperSlot {
    slot: Arc<AtomicU64>,
    id: u64,
}

impl ReaperSlot {
    /// Frees the slot if it still belongs to this reaper.
    fn release(&self) {
        let _ = self
            .slot
            .compare_exchange(self.id, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

impl Drop for ReaperSlot {
    fn drop(&mut self) {
        self.release();
    }
}

// == Cleanup Handle ==
/// Stop handle for a running reaper.
///
/// Calling [`stop`](CleanupHandle::stop) or dropping the handle closes the
/// stop signal. No new pass starts once the task observes it; a pass that is
/// already running finishes. Stopping never waits for that pass.
#[must_use = "dropping the handle stops the reaper"]
#[derive(Debug)]
pub struct CleanupHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    slot: ReaperSlot,
}

impl CleanupHandle {
    /// Signals the reaper to stop and returns immediately.
    pub fn stop(mut self) {
        self.signal_stop();
    }

    /// Signals the reaper to stop and waits for the task to exit.
    pub async fn stop_and_wait(mut self) {
        self.signal_stop();
        let _ = (&mut self.task).await;
    }

    /// Returns true once the reaper task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn signal_stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The receiver is gone only if the task already exited.
            let _ = stop.send(());
            self.slot.release();
            info!("Cache cleanup task stopped");
        }
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const TICK: Duration = Duration::from_millis(10);

    fn manual_cache() -> (Cache<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Cache::with_clock(clock.clone()), clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_stale_entries() {
        let (cache, clock) = manual_cache();
        cache.set("expire_soon", "value".to_string(), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.size(), 1);

        let handle = spawn_cleanup_task(&cache, TICK).unwrap();

        time::sleep(TICK * 5).await;

        assert_eq!(cache.size(), 0, "Stale entry should have been reaped");
        assert!(cache.stats().cleanup_runs >= 1);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_live_entries() {
        let (cache, _) = manual_cache();
        cache.set("long_lived", "value".to_string(), Duration::from_secs(3600));

        let handle = spawn_cleanup_task(&cache, TICK).unwrap();

        time::sleep(TICK * 5).await;

        assert_eq!(cache.get("long_lived").as_deref(), Some("value"));

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_stops() {
        let (cache, _) = manual_cache();

        let mut handle = spawn_cleanup_task(&cache, TICK).unwrap();
        handle.signal_stop();
        time::sleep(TICK * 3).await;

        assert!(handle.is_finished(), "Task should be finished after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cleanup_after_stop() {
        let (cache, _) = manual_cache();

        let handle = spawn_cleanup_task(&cache, TICK).unwrap();
        time::sleep(TICK * 3).await;
        handle.stop_and_wait().await;

        let runs = cache.stats().cleanup_runs;
        cache.set("stale", "x".to_string(), Duration::ZERO);
        time::sleep(TICK * 5).await;

        assert_eq!(cache.stats().cleanup_runs, runs);
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected() {
        let (cache, _) = manual_cache();

        let result = spawn_cleanup_task(&cache, Duration::ZERO);

        assert!(matches!(result, Err(CacheError::InvalidInterval)));
    }

    #[test]
    fn test_requires_runtime() {
        let (cache, _) = manual_cache();

        let result = spawn_cleanup_task(&cache, TICK);

        assert!(matches!(result, Err(CacheError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_reaper_rejected_until_stopped() {
        let (cache, _) = manual_cache();

        let first = spawn_cleanup_task(&cache, TICK).unwrap();
        assert!(matches!(
            spawn_cleanup_task(&cache, TICK),
            Err(CacheError::ReaperAlreadyRunning)
        ));

        first.stop();
        let second = spawn_cleanup_task(&cache, TICK).unwrap();
        second.stop_and_wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_exits_when_cache_dropped() {
        let (cache, _) = manual_cache();

        let handle = spawn_cleanup_task(&cache, TICK).unwrap();
        drop(cache);
        time::sleep(TICK * 5).await;

        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_rejected() {
        let (cache, _) = manual_cache();

        for interval in [Duration::MAX, MAX_CLEANUP_INTERVAL + Duration::from_nanos(1)] {
            assert!(matches!(
                spawn_cleanup_task(&cache, interval),
                Err(CacheError::InvalidInterval)
            ));
        }

        // A rejected start must not hold the slot.
        let handle = spawn_cleanup_task(&cache, TICK).unwrap();
        handle.stop_and_wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_interval_keeps_running() {
        let (cache, _) = manual_cache();

        let handle = spawn_cleanup_task(&cache, MAX_CLEANUP_INTERVAL).unwrap();
        time::sleep(Duration::from_secs(60)).await;

        assert!(!handle.is_finished(), "Reaper should still be waiting for its first tick");
        handle.stop_and_wait().await;
    }

    #[test]
    fn test_slot_released_when_runtime_shuts_down() {
        let (cache, _) = manual_cache();
        let build = || {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
        };

        let first_rt = build();
        let old = first_rt.block_on(async { spawn_cleanup_task(&cache, TICK).unwrap() });
        drop(first_rt);
        assert!(old.is_finished());

        let second_rt = build();
        second_rt.block_on(async {
            let handle = spawn_cleanup_task(&cache, TICK)
                .expect("slot should be free once the old task is gone");
            handle.stop_and_wait().await;
        });
        drop(old);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_task_exit_keeps_new_reaper_slot() {
        let (cache, _) = manual_cache();

        let first = spawn_cleanup_task(&cache, TICK).unwrap();
        first.stop();
        let second = spawn_cleanup_task(&cache, TICK).unwrap();

        // Let the first task observe its stop signal and exit.
        time::sleep(TICK * 3).await;

        assert!(matches!(
            spawn_cleanup_task(&cache, TICK),
            Err(CacheError::ReaperAlreadyRunning)
        ));
        second.stop_and_wait().await;
    }
}
