//! Type-erased handle capabilities and the shared handle state.
//!
//! A handle tree mixes widget types, so parents and children are stored as
//! `Arc<dyn Node>`. `Node` is the sum of three small capabilities:
//!
//! - [`Creatable`] - realize the native widget on the owner thread
//! - [`Disposable`] - tear the handle down and release sub-resources
//! - [`Parentable`] - parent and child links
//!
//! Parents are held strongly by their children; children are held weakly by
//! their parents, so dropping the last user handle to a subtree frees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::disposal::Teardown;
use super::pending::PendingFields;
use super::{HandleId, Lifecycle, State, Style, Widget};
use crate::error::Result;
use crate::native::{Display, NativeId};
use crate::owner::OwnerThread;

/// A shared, type-erased handle.
pub type NodeRef = Arc<dyn Node>;

/// Realization of the native widget.
pub trait Creatable {
    /// Create the native widget if needed, creating ancestors first.
    ///
    /// Returns `Ok(None)` if the handle (or an ancestor) has been disposed.
    /// Only callable on the owner thread, which the `&mut Display` proves.
    fn realize(&self, display: &mut Display) -> Result<Option<NativeId>>;
}

/// Teardown of the handle.
pub trait Disposable {
    /// Mark this handle and its descendants disposed, collecting the native
    /// widgets that need to be destroyed. Does nothing if already disposed.
    fn begin_dispose(self: Arc<Self>, teardown: &mut Vec<Teardown>);

    /// Release widget-specific sub-resources before the native widget is
    /// destroyed. Runs on the owner thread.
    fn release(&self, display: &mut Display, native: NativeId);
}

/// Structural links between handles.
pub trait Parentable {
    /// The parent handle, if one has been assigned.
    fn parent_node(&self) -> Option<NodeRef>;

    /// The live child handles, in attachment order.
    fn child_nodes(&self) -> Vec<NodeRef>;

    /// Register a child.
    fn attach_child(&self, child: Weak<dyn Node>);

    /// Forget a child.
    fn detach_child(&self, id: HandleId);
}

/// A type-erased access handle.
pub trait Node: Creatable + Disposable + Parentable + Send + Sync + 'static {
    /// The handle identity.
    fn id(&self) -> HandleId;

    /// The widget class.
    fn class(&self) -> &'static str;

    /// The lifecycle state.
    fn state(&self) -> State;

    /// The native widget, present only while `Created`.
    fn native(&self) -> Option<NativeId>;

    /// The owner thread this handle belongs to.
    fn owner(&self) -> &OwnerThread;

    /// Whether the constructor has finished.
    fn is_constructed(&self) -> bool;
}

/// Cached and pending state guarded by one lock.
pub(crate) struct Core<W: Widget> {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) widget: W,
    pub(crate) pending: PendingFields<W::Field>,
}

/// The shared state behind a `Handle<W>`.
pub(crate) struct HandleInner<W: Widget> {
    pub(crate) id: HandleId,
    pub(crate) style: Style,
    pub(crate) owner: OwnerThread,
    pub(crate) constructed: AtomicBool,
    pub(crate) core: Mutex<Core<W>>,
    pub(crate) parent: RwLock<Option<NodeRef>>,
    pub(crate) children: Mutex<Vec<Weak<dyn Node>>>,
}

impl<W: Widget> HandleInner<W> {
    pub(crate) fn new(owner: OwnerThread, style: Style, widget: W) -> Self {
        Self {
            id: HandleId::next(),
            style,
            owner,
            constructed: AtomicBool::new(false),
            core: Mutex::new(Core {
                lifecycle: Lifecycle::NotCreated,
                widget,
                pending: PendingFields::new(),
            }),
            parent: RwLock::new(None),
            children: Mutex::new(Vec::new()),
        }
    }
}

impl<W: Widget> Parentable for HandleInner<W> {
    fn parent_node(&self) -> Option<NodeRef> {
        self.parent.read().clone()
    }

    fn child_nodes(&self) -> Vec<NodeRef> {
        let mut children = self.children.lock();
        children.retain(|child| child.strong_count() > 0);
        children.iter().filter_map(Weak::upgrade).collect()
    }

    fn attach_child(&self, child: Weak<dyn Node>) {
        self.children.lock().push(child);
    }

    fn detach_child(&self, id: HandleId) {
        self.children
            .lock()
            .retain(|child| child.upgrade().is_some_and(|c| c.id() != id));
    }
}

impl<W: Widget> Node for HandleInner<W> {
    fn id(&self) -> HandleId {
        self.id
    }

    fn class(&self) -> &'static str {
        W::CLASS
    }

    fn state(&self) -> State {
        self.core.lock().lifecycle.state()
    }

    fn native(&self) -> Option<NativeId> {
        self.core.lock().lifecycle.native()
    }

    fn owner(&self) -> &OwnerThread {
        &self.owner
    }

    fn is_constructed(&self) -> bool {
        self.constructed.load(Ordering::Acquire)
    }
}
