// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Timer scheduling for the time-based flush trigger.
//!
//! The queue never sleeps itself: it asks a [`Scheduler`] to run a single-shot
//! task after a delay and cancels it whenever a flush happens for any reason.
//!
//! - [`TokioScheduler`]: one sleeping tokio task per timer, cancelled through a
//!   `CancellationToken`. Outside any tokio runtime the tasks run on the
//!   crate's background runtime, see [`background_handle`]
//! - [`ManualScheduler`]: virtual time for deterministic tests; timers fire
//!   only when [`ManualScheduler::advance`] moves the clock past their deadline

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::lock;

/// Work to run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

static BACKGROUND: OnceLock<Option<Runtime>> = OnceLock::new();

/// Handle to a single-worker runtime owned by the crate, built on first use.
///
/// Used for flush timers and network deliveries when the logger lives
/// outside any tokio runtime. `None` if the runtime could not be built.
pub fn background_handle() -> Option<Handle> {
    BACKGROUND
        .get_or_init(|| {
            match Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("client-logs")
                .enable_all()
                .build()
            {
                Ok(runtime) => {
                    debug!("SCHEDULER | Started background runtime");
                    Some(runtime)
                }
                Err(e) => {
                    error!("SCHEDULER | Unable to start background runtime: {}", e);
                    None
                }
            }
        })
        .as_ref()
        .map(|runtime| runtime.handle().clone())
}

/// Runtime of the calling context, falling back to [`background_handle`].
pub fn current_or_background() -> Option<Handle> {
    Handle::try_current().ok().or_else(background_handle)
}

/// Handle to a scheduled single-shot timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    token: CancellationToken,
}

impl TimerHandle {
    /// Fresh, uncancelled handle for a [`Scheduler`] implementation to return.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        }
    }

    /// Unique id of this timer within the process.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Schedules delayed, cancellable single-shot tasks.
///
/// A scheduler that cannot arm a timer returns an already-cancelled handle.
pub trait Scheduler: Send + Sync {
    /// Runs `task` once after `delay` unless the returned handle is cancelled first.
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle;

    /// Cancels a pending timer. Cancelling a fired or cancelled timer is a no-op.
    fn cancel(&self, handle: &TimerHandle) {
        handle.token.cancel();
    }
}

/// Scheduler backed by the tokio timer wheel.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Option<Handle>,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Captures the runtime of the calling context, or the background
    /// runtime outside of one.
    ///
    /// If neither is available timers come back cancelled and only size and
    /// forced flushes remain.
    #[must_use]
    pub fn current() -> Self {
        let handle = current_or_background();
        if handle.is_none() {
            debug!("SCHEDULER | No tokio runtime available, time-based flushing disabled");
        }
        Self { handle }
    }

    #[must_use]
    pub fn has_runtime(&self) -> bool {
        self.handle.is_some()
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("has_runtime", &self.has_runtime())
            .finish()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let timer = TimerHandle::new();
        if let Some(handle) = &self.handle {
            let token = timer.token.clone();
            handle.spawn(async move {
                tokio::select! {
                    () = token.cancelled() => {}
                    () = tokio::time::sleep(delay) => {
                        if !token.is_cancelled() {
                            task();
                        }
                    }
                }
            });
        } else {
            timer.token.cancel();
        }
        timer
    }
}

struct PendingTimer {
    handle: TimerHandle,
    due: Duration,
    task: TimerTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    timers: Vec<PendingTimer>,
}

/// Virtual-time scheduler.
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use datadog_client_logs::clock::{ManualScheduler, Scheduler};
///
/// let scheduler = ManualScheduler::new();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&fired);
/// scheduler.schedule_after(Duration::from_secs(5), Box::new(move || flag.store(true, Ordering::SeqCst)));
///
/// scheduler.advance(Duration::from_millis(4999));
/// assert!(!fired.load(Ordering::SeqCst));
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        lock(&self.state).now
    }

    /// Number of armed, non-cancelled timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.state)
            .timers
            .iter()
            .filter(|timer| !timer.handle.is_cancelled())
            .count()
    }

    /// Moves virtual time forward, firing every timer that falls due, in
    /// deadline order. Tasks run without the scheduler lock held so they may
    /// schedule or cancel timers themselves.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.state).now + by;
        loop {
            let next = {
                let mut state = lock(&self.state);
                state.timers.retain(|timer| !timer.handle.is_cancelled());
                let due_index = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.handle.id))
                    .map(|(index, _)| index);
                due_index.map(|index| {
                    let timer = state.timers.remove(index);
                    state.now = timer.due;
                    timer
                })
            };
            match next {
                Some(timer) => (timer.task)(),
                None => break,
            }
        }
        lock(&self.state).now = target;
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = lock(&self.state);
        let due = state.now + delay;
        state.timers.push(PendingTimer {
            handle: handle.clone(),
            due,
            task,
        });
        handle
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counter_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_timer_ids_are_unique() {
        let a = TimerHandle::new();
        let b = TimerHandle::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_manual_fires_at_deadline() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_after(Duration::from_millis(100), counter_task(&counter));

        scheduler.advance(Duration::from_millis(99));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_manual_fires_once() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_after(Duration::from_millis(10), counter_task(&counter));

        scheduler.advance(Duration::from_secs(1));
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_cancel() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_after(Duration::from_millis(10), counter_task(&counter));

        scheduler.cancel(&handle);
        assert!(handle.is_cancelled());
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_manual_fires_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, delay) in [("late", 30), ("early", 10), ("middle", 20)] {
            let order = Arc::clone(&order);
            scheduler.schedule_after(
                Duration::from_millis(delay),
                Box::new(move || order.lock().unwrap().push(label)),
            );
        }

        scheduler.advance(Duration::from_millis(50));
        assert_eq!(*order.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_manual_task_can_reschedule() {
        let scheduler = Arc::new(ManualScheduler::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let inner_scheduler = Arc::clone(&scheduler);
        let inner_counter = Arc::clone(&counter);
        scheduler.schedule_after(
            Duration::from_millis(10),
            Box::new(move || {
                inner_scheduler.schedule_after(
                    Duration::from_millis(10),
                    counter_task(&inner_counter),
                );
            }),
        );

        scheduler.advance(Duration::from_millis(15));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(Duration::from_millis(5));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tokio_scheduler_without_runtime_uses_background() {
        let scheduler = TokioScheduler::current();
        assert!(scheduler.has_runtime());
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_after(Duration::from_millis(20), counter_task(&counter));
        assert!(!handle.is_cancelled());

        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_background_cancel_prevents_firing() {
        let scheduler = TokioScheduler::current();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_after(Duration::from_millis(50), counter_task(&counter));
        scheduler.cancel(&handle);

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires() {
        let scheduler = TokioScheduler::current();
        assert!(scheduler.has_runtime());
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler.schedule_after(Duration::from_millis(5000), counter_task(&counter));

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel() {
        let scheduler = TokioScheduler::current();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = scheduler.schedule_after(Duration::from_millis(100), counter_task(&counter));

        scheduler.cancel(&handle);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
