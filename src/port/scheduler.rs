//! Cooperative yield capability used by the polling loops.
//!
//! The adapter never blocks the thread it runs on. Whenever a readiness
//! condition does not hold yet it asks its `Scheduler` to suspend the calling
//! task for the poll interval, letting other tasks on the runtime progress.

use async_trait::async_trait;
use std::time::Duration;

/// Something that can suspend the current task for a while.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspend the calling task for `interval`, then resume it.
    async fn pause(&self, interval: Duration);
}

/// Scheduler backed by the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn pause(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Scheduler that only yields to the runtime, ignoring the interval.
///
/// Useful for simulated devices, where wall-clock pacing adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldScheduler;

#[async_trait]
impl Scheduler for YieldScheduler {
    async fn pause(&self, _interval: Duration) {
        tokio::task::yield_now().await;
    }
}
