//! Error types for Horizon Tether.

use std::fmt;
use std::time::Duration;

use crate::handle::HandleId;
use crate::native::{NativeId, ResourceId};

/// A specialized Result type for Horizon Tether operations.
pub type Result<T> = std::result::Result<T, TetherError>;

/// Why a handle failed its readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// The handle constructor has not finished.
    Constructing,
    /// The handle has been disposed.
    Disposed,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructing => write!(f, "handle is still being constructed"),
            Self::Disposed => write!(f, "handle has been disposed"),
        }
    }
}

/// The main error type for Horizon Tether operations.
#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    /// A handle was used before construction finished or after disposal.
    #[error("handle {handle} ({class}) is not ready: {reason}")]
    NotReady {
        handle: HandleId,
        class: &'static str,
        reason: NotReadyReason,
    },

    /// Creation was requested for a handle whose parent was never assigned.
    #[error("cannot create handle {handle} ({class}): no parent handle was assigned")]
    MissingParent {
        handle: HandleId,
        class: &'static str,
    },

    /// A parent assignment was rejected.
    #[error("invalid parent for handle {handle}: {reason}")]
    InvalidParent {
        handle: HandleId,
        reason: &'static str,
    },

    /// The owner thread did not complete the request within the bounded wait.
    #[error("owner thread did not respond within {0:?}")]
    Timeout(Duration),

    /// The owner thread has shut down or dropped the request.
    #[error("owner thread is not running")]
    OwnerThreadGone,

    /// The invocation panicked while executing on the owner thread.
    #[error("invocation panicked on the owner thread: {0}")]
    InvocationPanicked(String),

    /// `invoke` was called from the owner thread itself.
    #[error("invoke() called on the owner thread; use the display directly")]
    ReentrantInvocation,

    /// The owner thread could not be spawned.
    #[error("failed to spawn owner thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The native display rejected an operation.
    #[error(transparent)]
    Native(#[from] NativeError),
}

impl TetherError {
    /// Returns `true` for errors caused by misuse of the API rather than by
    /// the state of the owner thread.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::NotReady { .. }
                | Self::MissingParent { .. }
                | Self::InvalidParent { .. }
                | Self::ReentrantInvocation
        )
    }
}

/// Errors raised by the native display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    /// The native widget does not exist (never created or already destroyed).
    #[error("invalid or destroyed native widget {0:?}")]
    InvalidWidget(NativeId),

    /// The native resource does not exist.
    #[error("invalid or released native resource {0:?}")]
    InvalidResource(ResourceId),

    /// The parent native widget was destroyed before the child was created.
    #[error("parent native widget {0:?} has been destroyed")]
    ParentDestroyed(NativeId),
}
