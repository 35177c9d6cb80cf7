//! Single-shot cancellable timers.
//!
//! The click machine needs exactly one primitive: run a callback once after
//! a delay, with synchronous and idempotent cancellation. [`Scheduler`]
//! abstracts it so the machine runs on tokio in the app and on a manual
//! clock in tests and trace replays.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::error::ListError;

/// Deferred work handed to a [`Scheduler`].
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run a callback once after a delay.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

// =============================================================================
// TimerHandle
// =============================================================================

/// Owner of a scheduled callback. Dropping the handle cancels it.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the callback. Calling this more than once does nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether `cancel` would still have an effect.
    pub fn is_armed(&self) -> bool {
        self.cancel.is_some()
    }

    /// Release the handle without cancelling, e.g. from inside the callback.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.is_armed())
            .finish()
    }
}

// =============================================================================
// TokioScheduler
// =============================================================================

/// Timers as tokio tasks sleeping on the runtime's clock.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in.
    pub fn try_current() -> Result<Self, ListError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| ListError::RuntimeUnavailable(e.to_string()))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let abort = task.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

// =============================================================================
// ManualScheduler
// =============================================================================

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<(Duration, u64), TimerCallback>,
}

/// A virtual clock that only moves when told to.
///
/// Due callbacks fire in deadline order (ties in scheduling order) on the
/// thread calling [`ManualScheduler::advance`], outside the internal lock,
/// so a callback may schedule further timers.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualClock>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.lock().now
    }

    /// Number of scheduled, not yet fired or cancelled, callbacks.
    pub fn pending(&self) -> usize {
        self.inner.lock().timers.len()
    }

    /// Move the clock forward by `by`. Returns how many callbacks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        self.advance_to(target)
    }

    /// Move the clock to `target`, firing everything due on the way.
    /// A target in the past leaves the clock where it is.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let due = {
                let mut clock = self.inner.lock();
                let next = clock.timers.first_key_value().map(|(&key, _)| key);
                match next {
                    Some(key) if key.0 <= target => {
                        clock.now = clock.now.max(key.0);
                        clock.timers.remove(&key)
                    }
                    _ => {
                        clock.now = clock.now.max(target);
                        None
                    }
                }
            };
            match due {
                Some(callback) => {
                    callback();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let key = {
            let mut clock = self.inner.lock();
            let key = (clock.now + delay, clock.next_id);
            clock.next_id += 1;
            clock.timers.insert(key, callback);
            key
        };

        let weak: Weak<Mutex<ManualClock>> = Arc::downgrade(&self.inner);
        TimerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().timers.remove(&key);
            }
        })
    }
}
