//! Synchronous invocation primitives.
//!
//! An invocation couples one caller-thread call with its execution on the
//! owner thread:
//!
//! 1. The caller wraps the work in an [`Invocation`] and keeps the matching
//!    [`CompletionWaiter`].
//! 2. The owner thread runs the invocation against its [`Display`] and the
//!    [`CompletionHandle`] stores the result.
//! 3. The waiter wakes up and hands the result back to the caller.
//!
//! If the owner thread drops the invocation without running it (shutdown), the
//! waiter reports [`TetherError::OwnerThreadGone`]. If the caller gives up
//! (bounded wait), the invocation is cancelled and skipped if it has not
//! started yet.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Result, TetherError};
use crate::logging::targets;
use crate::native::Display;

/// Where a single invocation stands.
enum Slot<R> {
    /// Queued or running.
    Pending,
    /// Finished with a value.
    Done(R),
    /// Panicked on the owner thread.
    Panicked(String),
    /// Dropped by the owner thread without running.
    Abandoned,
    /// The caller stopped waiting.
    Cancelled,
    /// The outcome has been consumed.
    Taken,
}

struct CompletionState<R> {
    slot: Mutex<Slot<R>>,
    condvar: Condvar,
}

/// Create a completion handle/waiter pair for one invocation.
pub fn completion_pair<R>() -> (CompletionHandle<R>, CompletionWaiter<R>) {
    let state = Arc::new(CompletionState {
        slot: Mutex::new(Slot::Pending),
        condvar: Condvar::new(),
    });

    (
        CompletionHandle {
            inner: Some(state.clone()),
        },
        CompletionWaiter { inner: state },
    )
}

/// The owner-thread side of an invocation token.
///
/// Dropping the handle without completing it marks the invocation abandoned,
/// which wakes the waiter with [`TetherError::OwnerThreadGone`].
pub struct CompletionHandle<R> {
    inner: Option<Arc<CompletionState<R>>>,
}

impl<R> CompletionHandle<R> {
    /// Check if the waiting caller has given up.
    pub fn is_cancelled(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|state| matches!(*state.slot.lock(), Slot::Cancelled))
    }

    /// Store the result and wake the waiter.
    pub fn complete(mut self, value: R) {
        self.finish(Slot::Done(value));
    }

    /// Report a panic and wake the waiter.
    pub fn fail(mut self, message: String) {
        self.finish(Slot::Panicked(message));
    }

    fn finish(&mut self, outcome: Slot<R>) {
        let Some(state) = self.inner.take() else {
            return;
        };
        let mut slot = state.slot.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = outcome;
        }
        state.condvar.notify_all();
    }
}

impl<R> Drop for CompletionHandle<R> {
    fn drop(&mut self) {
        self.finish(Slot::Abandoned);
    }
}

/// The caller side of an invocation token.
pub struct CompletionWaiter<R> {
    inner: Arc<CompletionState<R>>,
}

impl<R> CompletionWaiter<R> {
    /// Block until the invocation completes.
    ///
    /// # Warning
    ///
    /// Calling this on the owner thread for an invocation queued to that same
    /// thread deadlocks. [`crate::OwnerThread::invoke`] guards against it.
    pub fn wait(self) -> Result<R> {
        let mut slot = self.inner.slot.lock();
        while matches!(*slot, Slot::Pending) {
            self.inner.condvar.wait(&mut slot);
        }
        Self::take(&mut slot)
    }

    /// Block until the invocation completes or `timeout` elapses.
    ///
    /// On timeout the invocation is cancelled: if the owner thread has not
    /// started it yet, it will be skipped.
    pub fn wait_timeout(self, timeout: Duration) -> Result<R> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.inner.slot.lock();
        while matches!(*slot, Slot::Pending) {
            if self.inner.condvar.wait_until(&mut slot, deadline).timed_out() {
                if matches!(*slot, Slot::Pending) {
                    *slot = Slot::Cancelled;
                    return Err(TetherError::Timeout(timeout));
                }
                break;
            }
        }
        Self::take(&mut slot)
    }

    /// Wait with an optional bound.
    pub fn wait_for(self, timeout: Option<Duration>) -> Result<R> {
        match timeout {
            Some(timeout) => self.wait_timeout(timeout),
            None => self.wait(),
        }
    }

    fn take(slot: &mut Slot<R>) -> Result<R> {
        match std::mem::replace(slot, Slot::Taken) {
            Slot::Done(value) => Ok(value),
            Slot::Panicked(message) => Err(TetherError::InvocationPanicked(message)),
            Slot::Abandoned | Slot::Cancelled | Slot::Taken => Err(TetherError::OwnerThreadGone),
            Slot::Pending => unreachable!("waiter only takes a finished slot"),
        }
    }
}

/// A type-erased request for the owner thread.
pub struct Invocation {
    label: &'static str,
    job: Box<dyn FnOnce(&mut Display) + Send>,
}

impl Invocation {
    /// Wrap `f` so that its result (or panic) is delivered through a
    /// completion pair. Returns the invocation and the caller's waiter.
    pub fn new<F, R>(label: &'static str, f: F) -> (Self, CompletionWaiter<R>)
    where
        F: FnOnce(&mut Display) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (completion, waiter) = completion_pair();
        let job = move |display: &mut Display| {
            if completion.is_cancelled() {
                tracing::debug!(target: targets::INVOCATION, label, "skipping cancelled invocation");
                return;
            }
            match catch_unwind(AssertUnwindSafe(|| f(display))) {
                Ok(value) => completion.complete(value),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(target: targets::INVOCATION, label, %message, "invocation panicked");
                    completion.fail(message);
                }
            }
        };

        (
            Self {
                label,
                job: Box::new(job),
            },
            waiter,
        )
    }

    /// The label used for tracing.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Execute the invocation. Must be called on the owner thread.
    pub fn execute(self, display: &mut Display) {
        (self.job)(display);
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_pair() {
        let (handle, waiter) = completion_pair();

        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.complete(42);
        });

        assert_eq!(waiter.wait().unwrap(), 42);
        thread.join().unwrap();
    }

    #[test]
    fn test_dropped_handle_reports_owner_gone() {
        let (handle, waiter) = completion_pair::<()>();
        drop(handle);
        assert!(matches!(waiter.wait(), Err(TetherError::OwnerThreadGone)));
    }

    #[test]
    fn test_completion_timeout_cancels() {
        let (handle, waiter) = completion_pair::<u32>();

        let err = waiter.wait_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, TetherError::Timeout(_)));
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_invocation_returns_value() {
        let mut display = Display::new("test");
        let (invocation, waiter) = Invocation::new("count", |display: &mut Display| {
            display.widget_count()
        });
        assert_eq!(invocation.label(), "count");

        invocation.execute(&mut display);
        assert_eq!(waiter.wait().unwrap(), 0);
    }

    #[test]
    fn test_invocation_panic_is_contained() {
        let mut display = Display::new("test");
        let (invocation, waiter) = Invocation::new("boom", |_: &mut Display| -> u8 {
            panic!("native call failed")
        });

        invocation.execute(&mut display);
        match waiter.wait() {
            Err(TetherError::InvocationPanicked(message)) => {
                assert_eq!(message, "native call failed")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_invocation_is_skipped() {
        let mut display = Display::new("test");
        let (invocation, waiter) = Invocation::new("create", |display: &mut Display| {
            display.create("Shell", None, crate::handle::Style::NONE)
        });

        assert!(waiter.wait_timeout(Duration::from_millis(1)).is_err());
        invocation.execute(&mut display);
        assert_eq!(display.widget_count(), 0);
    }
}
