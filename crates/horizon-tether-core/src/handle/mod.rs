//! Access handles.
//!
//! A [`Handle<W>`] is the cross-thread proxy for one native widget. Any thread
//! may hold it, read its cached values, and propose new values; only the owner
//! thread ever touches the native widget behind it.
//!
//! # Lifecycle
//!
//! ```text
//! NotCreated ──create()/first invocation──▶ Created ──dispose()──▶ Disposed
//!      │                                                              ▲
//!      └───────────────dispose() / ancestor disposed──────────────────┘
//! ```
//!
//! - Constructing a handle is cheap and touches no native resources.
//! - Field writes made while `NotCreated` are buffered and applied exactly
//!   once, in last-write order, when the native widget is created.
//! - `Disposed` is terminal. Invocations on a disposed handle are ignored.
//!
//! # Widgets
//!
//! The per-type behavior lives in a [`Widget`] implementation: its fields,
//! its closed set of operations, and how each one maps onto the native
//! display. Everything else (creation order, buffering, disposal,
//! marshaling) is shared.

mod disposal;
mod node;
mod pending;
mod resolver;
mod style;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub use disposal::Teardown;
pub use node::{Creatable, Disposable, Node, NodeRef, Parentable};
pub use pending::PendingFields;
pub use style::Style;

use node::HandleInner;

use crate::error::{NativeError, NotReadyReason, Result, TetherError};
use crate::logging::targets;
use crate::native::{Display, NativeId};
use crate::owner::OwnerThread;

/// Global handle counter. Identities are never reused.
static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// The identity of an access handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric identity.
    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Build a `HandleId` from a raw value.
    ///
    /// This does not check that a handle with this identity exists.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No native widget exists yet.
    NotCreated,
    /// The native widget exists.
    Created,
    /// Terminal; the native widget (if any) has been destroyed.
    Disposed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCreated => write!(f, "NotCreated"),
            Self::Created => write!(f, "Created"),
            Self::Disposed => write!(f, "Disposed"),
        }
    }
}

/// Lifecycle with the native id attached, so a native id exists exactly when
/// the handle is `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    NotCreated,
    Created(NativeId),
    Disposed,
}

impl Lifecycle {
    pub(crate) fn state(self) -> State {
        match self {
            Self::NotCreated => State::NotCreated,
            Self::Created(_) => State::Created,
            Self::Disposed => State::Disposed,
        }
    }

    pub(crate) fn native(self) -> Option<NativeId> {
        match self {
            Self::Created(native) => Some(native),
            Self::NotCreated | Self::Disposed => None,
        }
    }
}

/// Per-widget-type behavior behind a [`Handle`].
///
/// Implementations hold only the widget's own cached field values.
/// `Field` enumerates the buffered properties and `Op` every other
/// operation; both are closed enums dispatched with an exhaustive `match`.
pub trait Widget: Send + 'static {
    /// Native widget class.
    const CLASS: &'static str;

    /// Whether this widget is a top-level surface that needs no parent handle.
    const ROOT: bool = false;

    /// Buffered properties.
    type Field: Copy + Eq + fmt::Debug + Send + 'static;

    /// Other operations (read-backs, commands).
    type Op: fmt::Debug + Send + 'static;

    /// Push the cached value of `field` to the native widget.
    fn apply_field(&mut self, field: Self::Field, display: &mut Display, native: NativeId) -> std::result::Result<(), NativeError>;

    /// Execute `op` against the native widget.
    fn execute(&mut self, op: Self::Op, display: &mut Display, native: NativeId) -> std::result::Result<(), NativeError>;

    /// Allocate the native widget.
    fn create_native(display: &mut Display, parent: Option<NativeId>, style: Style) -> std::result::Result<NativeId, NativeError> {
        display.create(Self::CLASS, parent, style)
    }

    /// Release sub-resources (fonts, images, colors) before the native widget
    /// is destroyed.
    fn release(&mut self, _display: &mut Display, _native: NativeId) {}
}

/// Widgets that can parent other handles.
pub trait Container: Widget {}

/// Anything that can be passed as the parent of a new handle.
pub trait Parent {
    /// The type-erased parent handle.
    fn node(&self) -> NodeRef;
}

/// A field update carried to the owner thread.
type Mutation<W> = Box<dyn FnOnce(&mut W) + Send>;

/// What to do on the owner thread for one invocation.
enum Action<W: Widget> {
    /// Only make sure the native widget exists.
    Create,
    /// Update one field and push it to the native widget.
    Write(W::Field, Mutation<W>),
    /// Run a widget operation.
    Op(W::Op),
}

impl<W: Widget> Action<W> {
    fn label(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Write(..) => "write",
            Self::Op(_) => "op",
        }
    }
}

impl<W: Widget> HandleInner<W> {
    /// Execute an action on the owner thread, creating the native widget first
    /// if needed.
    fn perform(&self, display: &mut Display, action: Action<W>) -> Result<()> {
        let Some(native) = Creatable::realize(self, display)? else {
            tracing::trace!(target: targets::HANDLE, handle = %self.id, action = action.label(), "ignoring invocation on disposed handle");
            return Ok(());
        };

        let mut core = self.core.lock();
        if core.lifecycle.native() != Some(native) {
            return Ok(());
        }

        let widget = &mut core.widget;
        match action {
            Action::Create => {}
            Action::Write(field, mutate) => {
                mutate(&mut *widget);
                widget.apply_field(field, display, native)?;
            }
            Action::Op(op) => {
                tracing::trace!(target: targets::HANDLE, handle = %self.id, ?op, "executing operation");
                widget.execute(op, display, native)?;
            }
        }
        Ok(())
    }
}

/// A cross-thread access handle for one native widget.
///
/// Cloning a handle yields another reference to the same widget.
pub struct Handle<W: Widget> {
    inner: Arc<HandleInner<W>>,
}

impl<W: Widget> Handle<W> {
    /// Create a handle without a parent.
    ///
    /// Top-level widgets never need one; other widgets must be given a parent
    /// with [`Handle::set_parent`] before they can be created.
    pub fn new(owner: &OwnerThread, style: Style, widget: W) -> Self {
        let handle = Self {
            inner: Arc::new(HandleInner::new(owner.clone(), style, widget)),
        };
        handle.finish_construction();
        handle
    }

    /// Create a handle under `parent`, on the parent's owner thread.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::InvalidParent`] if the parent is disposed or this
    /// widget type is top-level.
    pub fn with_parent(parent: &dyn Parent, style: Style, widget: W) -> Result<Self> {
        let node = parent.node();
        let handle = Self {
            inner: Arc::new(HandleInner::new(node.owner().clone(), style, widget)),
        };
        handle.set_parent(parent)?;
        handle.finish_construction();
        Ok(handle)
    }

    fn finish_construction(&self) {
        self.inner.constructed.store(true, Ordering::Release);
        tracing::trace!(target: targets::HANDLE, handle = %self.inner.id, class = W::CLASS, "handle constructed");
    }

    /// The handle identity.
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// The widget class.
    pub fn class(&self) -> &'static str {
        W::CLASS
    }

    /// The creation style.
    pub fn style(&self) -> Style {
        self.inner.style
    }

    /// The owner thread this handle belongs to.
    pub fn owner(&self) -> &OwnerThread {
        &self.inner.owner
    }

    /// The lifecycle state.
    pub fn state(&self) -> State {
        self.inner.state()
    }

    /// Whether the handle has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state() == State::Disposed
    }

    /// The native widget. `Some` exactly while the handle is `Created`.
    pub fn native(&self) -> Option<NativeId> {
        self.inner.native()
    }

    /// The parent handle, if assigned.
    pub fn parent(&self) -> Option<NodeRef> {
        self.inner.parent_node()
    }

    /// The live child handles.
    pub fn children(&self) -> Vec<NodeRef> {
        self.inner.child_nodes()
    }

    /// This handle as a type-erased node.
    pub fn node(&self) -> NodeRef {
        self.inner.clone()
    }

    /// Fields written but not yet applied to the native widget, in the order
    /// they will be applied.
    pub fn pending_fields(&self) -> Vec<W::Field> {
        self.inner.core.lock().pending.as_slice().to_vec()
    }

    /// Assign or replace the parent while the handle is `NotCreated`.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::InvalidParent`] if this widget is top-level, the
    /// parent lives on another owner thread, the parent is disposed, the
    /// handle is already created or disposed, or the assignment would create
    /// a cycle.
    pub fn set_parent(&self, parent: &dyn Parent) -> Result<()> {
        let invalid = |reason| TetherError::InvalidParent {
            handle: self.inner.id,
            reason,
        };

        if W::ROOT {
            return Err(invalid("top-level widgets cannot have a parent"));
        }
        let new_parent = parent.node();
        if !new_parent.owner().same_as(&self.inner.owner) {
            return Err(invalid("parent belongs to a different owner thread"));
        }
        if new_parent.state() == State::Disposed {
            return Err(invalid("parent has been disposed"));
        }
        if self.state() != State::NotCreated {
            return Err(invalid("handle has already been created or disposed"));
        }

        let mut cursor = Some(new_parent.clone());
        while let Some(node) = cursor {
            if node.id() == self.inner.id {
                return Err(invalid("a handle cannot be its own ancestor"));
            }
            cursor = node.parent_node();
        }

        let old = self.inner.parent.write().replace(new_parent.clone());
        if let Some(old) = old {
            old.detach_child(self.inner.id);
        }
        let this: NodeRef = self.inner.clone();
        new_parent.attach_child(Arc::downgrade(&this));

        tracing::trace!(target: targets::HANDLE, handle = %self.inner.id, parent = %new_parent.id(), "parent assigned");
        Ok(())
    }

    /// Whether the handle is fully constructed and not disposed.
    pub fn is_ready(&self) -> bool {
        self.check_ready().is_ok()
    }

    /// Verify the handle may be used for an invocation.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::NotReady`] if construction has not finished or
    /// the handle is disposed.
    pub fn check_ready(&self) -> Result<()> {
        let reason = if !self.inner.is_constructed() {
            NotReadyReason::Constructing
        } else if self.is_disposed() {
            NotReadyReason::Disposed
        } else {
            return Ok(());
        };

        Err(TetherError::NotReady {
            handle: self.inner.id,
            class: W::CLASS,
            reason,
        })
    }

    /// Create the native widget (and any missing ancestors).
    ///
    /// Does nothing if the handle is already created or disposed.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::MissingParent`] if this handle, or an ancestor
    /// that still needs creating, has no parent.
    pub fn create(&self) -> Result<()> {
        if self.state() != State::NotCreated {
            return Ok(());
        }
        self.run(Action::Create, self.inner.owner.config().invoke_timeout)
    }

    /// Run a widget operation on the owner thread and wait for it.
    ///
    /// Creates the native widget first if needed. Ignored after disposal.
    pub fn invoke(&self, op: W::Op) -> Result<()> {
        self.run(Action::Op(op), self.inner.owner.config().invoke_timeout)
    }

    /// Like [`Handle::invoke`], waiting at most `timeout`.
    pub fn invoke_timeout(&self, op: W::Op, timeout: Duration) -> Result<()> {
        self.run(Action::Op(op), Some(timeout))
    }

    /// Run a widget operation from code already on the owner thread.
    pub fn invoke_in(&self, display: &mut Display, op: W::Op) -> Result<()> {
        self.check_constructed()?;
        self.inner.perform(display, Action::Op(op))
    }

    fn run(&self, action: Action<W>, timeout: Option<Duration>) -> Result<()> {
        if self.is_disposed() {
            tracing::trace!(target: targets::HANDLE, handle = %self.inner.id, action = action.label(), "ignoring invocation on disposed handle");
            return Ok(());
        }
        self.check_constructed()?;

        let inner = self.inner.clone();
        let label = action.label();
        self.inner
            .owner
            .submit(label, timeout, move |display| inner.perform(display, action))?
    }

    fn check_constructed(&self) -> Result<()> {
        if self.inner.is_constructed() {
            Ok(())
        } else {
            Err(TetherError::NotReady {
                handle: self.inner.id,
                class: W::CLASS,
                reason: NotReadyReason::Constructing,
            })
        }
    }

    /// Read cached values.
    pub fn read<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.inner.core.lock().widget)
    }

    /// Update a field and make sure it reaches the native widget.
    ///
    /// While `NotCreated` the value is only buffered. Once `Created`, `mutate`
    /// runs on the owner thread together with the native update, so the cache
    /// only changes when the invocation does. After disposal the write is
    /// dropped.
    pub fn write(&self, field: W::Field, mutate: impl FnOnce(&mut W) + Send + 'static) -> Result<()> {
        {
            let mut core = self.inner.core.lock();
            match core.lifecycle {
                Lifecycle::Disposed => {
                    tracing::trace!(target: targets::HANDLE, handle = %self.inner.id, ?field, "dropping write to disposed handle");
                    return Ok(());
                }
                Lifecycle::NotCreated => {
                    mutate(&mut core.widget);
                    core.pending.mark(field);
                    return Ok(());
                }
                Lifecycle::Created(_) => {}
            }
        }

        self.run(Action::Write(field, Box::new(mutate)), self.inner.owner.config().invoke_timeout)
    }

    /// Dispose the handle and all of its descendants.
    ///
    /// Idempotent and never fails. Blocks until the owner thread has destroyed
    /// the native widgets, unless the owner thread is gone (the display already
    /// released them).
    pub fn dispose(&self) {
        let Some(teardown) = self.begin_dispose() else {
            return;
        };
        disposal::finish(&self.inner.owner, teardown);
    }

    /// Dispose from code already running on the owner thread.
    pub fn dispose_in(&self, display: &mut Display) {
        let Some(teardown) = self.begin_dispose() else {
            return;
        };
        disposal::destroy_natives(display, &teardown);
    }

    fn begin_dispose(&self) -> Option<Vec<Teardown>> {
        let mut teardown = Vec::new();
        self.inner.clone().begin_dispose(&mut teardown);
        if teardown.is_empty() {
            return None;
        }

        if let Some(parent) = self.inner.parent_node() {
            parent.detach_child(self.inner.id);
        }
        tracing::debug!(target: targets::DISPOSAL, handle = %self.inner.id, class = W::CLASS, count = teardown.len(), "disposing handle tree");
        Some(teardown)
    }
}

impl<W: Container> Parent for Handle<W> {
    fn node(&self) -> NodeRef {
        self.inner.clone()
    }
}

impl<W: Widget> Clone for Handle<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<W: Widget> PartialEq for Handle<W> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<W: Widget> Eq for Handle<W> {}

impl<W: Widget> fmt::Debug for Handle<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.inner.id)
            .field("class", &W::CLASS)
            .field("state", &self.state())
            .finish()
    }
}
