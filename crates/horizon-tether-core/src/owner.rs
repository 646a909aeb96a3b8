//! The owner thread and its event loop.
//!
//! The owner thread is the only thread that ever touches the native
//! [`Display`]. It alternates between dispatching pending native events and
//! executing invocation requests handed to it by caller threads, sleeping when
//! there is nothing to do.
//!
//! # Example
//!
//! ```
//! use horizon_tether_core::{OwnerThread, OwnerThreadConfig, Style};
//!
//! let owner = OwnerThread::start(OwnerThreadConfig::with_name("ui"))?;
//!
//! // Runs on the owner thread; the caller blocks until it is done.
//! let count = owner.invoke(|display| {
//!     display.create("Shell", None, Style::NONE)?;
//!     Ok::<_, horizon_tether_core::NativeError>(display.widget_count())
//! })??;
//! assert_eq!(count, 1);
//!
//! owner.shutdown_and_join();
//! # Ok::<(), horizon_tether_core::TetherError>(())
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::config::{OwnerThreadBuilder, OwnerThreadConfig};
use crate::error::{Result, TetherError};
use crate::logging::targets;
use crate::invocation::{Invocation, panic_message};
use crate::native::{Display, NativeEvent};
use crate::thread_check::ThreadAffinity;

/// Information about a running native context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    /// Display name.
    pub name: String,
    /// The owner thread.
    pub thread: ThreadId,
}

/// A request for the owner thread.
enum Request {
    /// Run a synchronous invocation.
    Invoke(Invocation),
    /// Queue a native event.
    Native(NativeEvent),
    /// Re-check the shutdown flag.
    Wake,
}

/// Lifecycle of the loop.
enum Phase {
    Starting,
    Ready(ContextInfo),
    Stopped,
}

/// State shared between `OwnerThread` handles and the loop itself.
struct LoopState {
    phase: Mutex<Phase>,
    phase_changed: Condvar,
    shutdown: AtomicBool,
    faults: AtomicU64,
    affinity: OnceLock<ThreadAffinity>,
}

impl LoopState {
    fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Starting),
            phase_changed: Condvar::new(),
            shutdown: AtomicBool::new(false),
            faults: AtomicU64::new(0),
            affinity: OnceLock::new(),
        }
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock() = phase;
        self.phase_changed.notify_all();
    }

    fn is_stopped(&self) -> bool {
        matches!(*self.phase.lock(), Phase::Stopped)
    }
}

/// Marks the loop stopped however the owner thread exits, so nobody waits on
/// a dead context.
struct StopGuard(Arc<LoopState>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.set_phase(Phase::Stopped);
    }
}

struct OwnerShared {
    config: OwnerThreadConfig,
    sender: Sender<Request>,
    state: Arc<LoopState>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OwnerShared {
    fn request_shutdown(&self) {
        self.state.shutdown.store(true, Ordering::Release);
        let _ = self.sender.send(Request::Wake);
    }
}

impl Drop for OwnerShared {
    fn drop(&mut self) {
        // Don't block in drop - just request shutdown
        self.request_shutdown();
    }
}

/// Handle to the thread that owns the native display.
///
/// Cheap to clone; every clone refers to the same thread. When the last clone
/// is dropped the loop is asked to shut down.
#[derive(Clone)]
pub struct OwnerThread {
    shared: Arc<OwnerShared>,
}

impl OwnerThread {
    /// Create a builder for a custom owner thread.
    pub fn builder() -> OwnerThreadBuilder {
        OwnerThreadBuilder::new()
    }

    /// Launch the owner thread and block until its display is ready.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::Spawn`] if the thread cannot be spawned, or
    /// [`TetherError::Timeout`] if the display does not come up within
    /// `startup_timeout`.
    pub fn start(config: OwnerThreadConfig) -> Result<Self> {
        let owner = Self::spawn(config)?;
        owner.context()?;
        Ok(owner)
    }

    /// Launch the owner thread without waiting for the display.
    ///
    /// Invocations issued before the display is ready are queued and run once
    /// it is.
    pub fn spawn(config: OwnerThreadConfig) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let state = Arc::new(LoopState::new());

        let thread_state = state.clone();
        let thread_config = config.clone();

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || owner_loop(receiver, thread_state, thread_config))
            .map_err(TetherError::Spawn)?;

        Ok(Self {
            shared: Arc::new(OwnerShared {
                config,
                sender,
                state,
                handle: Mutex::new(Some(handle)),
            }),
        })
    }

    /// The configuration this thread was started with.
    pub fn config(&self) -> &OwnerThreadConfig {
        &self.shared.config
    }

    /// Block until the display exists and return its description.
    ///
    /// Waits with bounded polling (`context_poll_interval`) for at most
    /// `startup_timeout`.
    pub fn context(&self) -> Result<ContextInfo> {
        let config = &self.shared.config;
        let state = &self.shared.state;
        let deadline = Instant::now() + config.startup_timeout;

        let mut phase = state.phase.lock();
        loop {
            match &*phase {
                Phase::Ready(info) => return Ok(info.clone()),
                Phase::Stopped => return Err(TetherError::OwnerThreadGone),
                Phase::Starting => {}
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(target: targets::OWNER, name = %config.name, "display did not become ready in time");
                return Err(TetherError::Timeout(config.startup_timeout));
            }
            let step = config.context_poll_interval.min(deadline - now);
            state.phase_changed.wait_for(&mut phase, step);
        }
    }

    /// Check if the loop is running and accepting requests.
    pub fn is_running(&self) -> bool {
        !self.shared.state.shutdown.load(Ordering::Acquire) && !self.shared.state.is_stopped()
    }

    /// Check if the current thread is the owner thread.
    pub fn is_owner_thread(&self) -> bool {
        self.shared
            .state
            .affinity
            .get()
            .is_some_and(|affinity| affinity.is_same_thread())
    }

    /// Check if two handles refer to the same owner thread.
    pub fn same_as(&self, other: &OwnerThread) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Number of faults caught while dispatching native events.
    pub fn fault_count(&self) -> u64 {
        self.shared.state.faults.load(Ordering::Relaxed)
    }

    /// Run `f` on the owner thread and block until it returns.
    ///
    /// Uses the configured `invoke_timeout`, if any.
    pub fn invoke<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Display) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit("invoke", self.shared.config.invoke_timeout, f)
    }

    /// Run `f` on the owner thread, waiting at most `timeout`.
    ///
    /// If the timeout elapses before the owner thread starts the work, the
    /// work is skipped.
    pub fn invoke_timeout<F, R>(&self, timeout: Duration, f: F) -> Result<R>
    where
        F: FnOnce(&mut Display) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit("invoke", Some(timeout), f)
    }

    /// Deposit an invocation and wait for it.
    pub(crate) fn submit<F, R>(&self, label: &'static str, timeout: Option<Duration>, f: F) -> Result<R>
    where
        F: FnOnce(&mut Display) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_owner_thread() {
            return Err(TetherError::ReentrantInvocation);
        }
        if !self.is_running() {
            return Err(TetherError::OwnerThreadGone);
        }

        let (invocation, waiter) = Invocation::new(label, f);
        self.shared
            .sender
            .send(Request::Invoke(invocation))
            .map_err(|_| TetherError::OwnerThreadGone)?;

        waiter.wait_for(timeout)
    }

    /// Run `f` on the owner thread during its next dispatch cycle without
    /// waiting for it.
    ///
    /// A panic in `f` is logged and counted as a fault; the loop keeps going.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Display) + Send + 'static,
    {
        self.simulate(NativeEvent::run(f))
    }

    /// Queue a native event, as if the native toolkit had produced it.
    pub fn simulate(&self, event: NativeEvent) -> Result<()> {
        if !self.is_running() {
            return Err(TetherError::OwnerThreadGone);
        }
        self.shared
            .sender
            .send(Request::Native(event))
            .map_err(|_| TetherError::OwnerThreadGone)
    }

    /// Request loop termination. The loop exits after its current cycle.
    pub fn shutdown(&self) {
        tracing::info!(target: targets::OWNER, name = %self.shared.config.name, "shutdown requested");
        self.shared.request_shutdown();
    }

    /// Wait for the owner thread to exit.
    ///
    /// Returns `true` if the thread was joined, `false` if it was already
    /// joined, panicked, or this is the owner thread itself.
    pub fn join(&self) -> bool {
        if self.is_owner_thread() {
            return false;
        }
        let handle = self.shared.handle.lock().take();
        match handle {
            Some(h) => h.join().is_ok(),
            None => false,
        }
    }

    /// Request shutdown and wait for the thread to exit.
    pub fn shutdown_and_join(&self) -> bool {
        self.shutdown();
        self.join()
    }
}

impl fmt::Debug for OwnerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerThread")
            .field("name", &self.shared.config.name)
            .field("running", &self.is_running())
            .finish()
    }
}

/// The owner thread body.
#[tracing::instrument(skip_all, target = "horizon_tether_core::owner", level = "debug", fields(name = %config.name))]
fn owner_loop(receiver: Receiver<Request>, state: Arc<LoopState>, config: OwnerThreadConfig) {
    let _stopped = StopGuard(state.clone());

    let mut display = Display::new(config.name.clone());
    let affinity = ThreadAffinity::current();
    let _ = state.affinity.set(affinity);
    state.set_phase(Phase::Ready(ContextInfo {
        name: config.name.clone(),
        thread: affinity.thread_id(),
    }));
    tracing::info!(target: targets::OWNER, "owner thread ready");

    while !state.shutdown.load(Ordering::Acquire) {
        dispatch_native_events(&mut display, &state);

        let wait = if display.has_pending() {
            Duration::ZERO
        } else {
            config.idle_interval
        };

        match receiver.recv_timeout(wait) {
            Ok(Request::Invoke(invocation)) => {
                tracing::trace!(target: targets::OWNER, label = invocation.label(), "executing invocation");
                invocation.execute(&mut display);
            }
            Ok(Request::Native(event)) => display.post(event),
            Ok(Request::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Stop accepting work before draining so late callers fail fast.
    state.set_phase(Phase::Stopped);
    let abandoned = receiver
        .try_iter()
        .filter(|request| matches!(request, Request::Invoke(_)))
        .count();
    let released = display.release_all();

    tracing::info!(target: targets::OWNER, abandoned, released, "owner thread stopped");
}

/// Dispatch the native events that are pending at the start of this cycle.
fn dispatch_native_events(display: &mut Display, state: &LoopState) {
    for _ in 0..display.pending_count() {
        let Some(event) = display.next_event() else {
            break;
        };

        match catch_unwind(AssertUnwindSafe(|| display.dispatch(event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(target: targets::OWNER, %err, "native event targeted a destroyed widget");
            }
            Err(payload) => {
                state.faults.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    target: targets::OWNER,
                    message = %panic_message(payload.as_ref()),
                    "fault while dispatching native event; continuing"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Style;
    use std::sync::atomic::AtomicUsize;

    fn test_owner() -> OwnerThread {
        OwnerThread::builder()
            .name("owner-test")
            .idle_interval(Duration::from_millis(5))
            .start()
            .unwrap()
    }

    #[test]
    fn test_start_and_context() {
        let owner = test_owner();
        let info = owner.context().unwrap();
        assert_eq!(info.name, "owner-test");
        assert_ne!(info.thread, thread::current().id());
        assert!(owner.is_running());
        assert!(!owner.is_owner_thread());
        assert!(owner.shutdown_and_join());
    }

    #[test]
    fn test_invoke_runs_on_owner_thread() {
        let owner = test_owner();
        let owner_id = owner.context().unwrap().thread;

        let ran_on = owner.invoke(|_| thread::current().id()).unwrap();
        assert_eq!(ran_on, owner_id);
        owner.shutdown_and_join();
    }

    #[test]
    fn test_reentrant_invoke_is_rejected() {
        let owner = test_owner();
        let inner = owner.clone();

        let nested = owner
            .invoke(move |_| matches!(inner.invoke(|_| ()), Err(TetherError::ReentrantInvocation)))
            .unwrap();
        assert!(nested);
        owner.shutdown_and_join();
    }

    #[test]
    fn test_invoke_after_shutdown() {
        let owner = test_owner();
        owner.shutdown_and_join();

        assert!(!owner.is_running());
        assert!(matches!(owner.invoke(|_| ()), Err(TetherError::OwnerThreadGone)));
        assert!(matches!(owner.context(), Err(TetherError::OwnerThreadGone)));
    }

    #[test]
    fn test_native_fault_does_not_stop_loop() {
        let owner = test_owner();

        owner.post(|_| panic!("native handler exploded")).unwrap();
        // Invocations after the fault still execute.
        let count = owner.invoke(|display| display.widget_count()).unwrap();
        assert_eq!(count, 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while owner.fault_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(owner.fault_count(), 1);
        assert!(owner.is_running());
        owner.shutdown_and_join();
    }

    #[test]
    fn test_post_runs_asynchronously() {
        let owner = test_owner();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            owner
                .post(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        // Posted work is dispatched before any later invocation returns.
        owner.invoke(|_| ()).unwrap();
        owner.invoke(|_| ()).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        owner.shutdown_and_join();
    }

    #[test]
    fn test_invoke_timeout_on_stalled_owner() {
        let owner = test_owner();
        let staller = owner.clone();

        let blocker = thread::spawn(move || {
            staller.invoke(|_| thread::sleep(Duration::from_millis(300))).unwrap();
        });
        thread::sleep(Duration::from_millis(50));

        let result = owner.invoke_timeout(Duration::from_millis(20), |display| {
            display.create("Shell", None, Style::NONE)
        });
        assert!(matches!(result, Err(TetherError::Timeout(_))));

        blocker.join().unwrap();
        // The cancelled creation never ran.
        assert_eq!(owner.invoke(|display| display.widget_count()).unwrap(), 0);
        owner.shutdown_and_join();
    }

    #[test]
    fn test_shutdown_releases_native_objects() {
        let owner = test_owner();
        owner
            .invoke(|display| display.create("Shell", None, Style::NONE))
            .unwrap()
            .unwrap();
        assert!(owner.shutdown_and_join());
        assert!(!owner.join());
    }

    #[test]
    fn test_spawn_then_context() {
        let owner = OwnerThread::spawn(OwnerThreadConfig::with_name("lazy")).unwrap();
        // Requests issued before the display is ready are queued.
        let name = owner.invoke(|display| display.name().to_string()).unwrap();
        assert_eq!(name, "lazy");
        assert_eq!(owner.context().unwrap().name, "lazy");
        owner.shutdown_and_join();
    }
}
