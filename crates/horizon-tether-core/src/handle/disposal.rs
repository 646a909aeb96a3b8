//! Disposal guard.
//!
//! Disposal happens in two halves:
//!
//! 1. On the calling thread, the handle and all of its descendants flip to
//!    `Disposed` and give up their native ids. From this point on, any
//!    invocation that reaches the owner thread for one of them is a no-op.
//! 2. On the owner thread, each realized handle releases its sub-resources
//!    (children first) and the native widget tree is destroyed.

use std::sync::Arc;

use super::node::{Disposable, HandleInner, Node, NodeRef, Parentable};
use super::{Lifecycle, Widget};
use crate::error::TetherError;
use crate::logging::targets;
use crate::native::{Display, NativeId};
use crate::owner::OwnerThread;

/// One handle collected by [`Disposable::begin_dispose`].
pub struct Teardown {
    node: NodeRef,
    native: Option<NativeId>,
}

impl Teardown {
    /// The disposed handle.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The native widget it owned, if it had been created.
    pub fn native(&self) -> Option<NativeId> {
        self.native
    }
}

impl<W: Widget> Disposable for HandleInner<W> {
    fn begin_dispose(self: Arc<Self>, teardown: &mut Vec<Teardown>) {
        let native = {
            let mut core = self.core.lock();
            let native = match std::mem::replace(&mut core.lifecycle, Lifecycle::Disposed) {
                Lifecycle::Disposed => return,
                Lifecycle::Created(native) => Some(native),
                Lifecycle::NotCreated => None,
            };
            core.pending.clear();
            native
        };

        tracing::trace!(target: targets::DISPOSAL, handle = %self.id, class = W::CLASS, ?native, "handle disposed");

        let children = self.child_nodes();
        self.children.lock().clear();

        let node: NodeRef = self;
        teardown.push(Teardown { node, native });
        for child in children {
            child.begin_dispose(teardown);
        }
    }

    fn release(&self, display: &mut Display, native: NativeId) {
        self.core.lock().widget.release(display, native);
    }
}

/// Destroy the native side of a disposed subtree. Runs on the owner thread.
pub(crate) fn destroy_natives(display: &mut Display, teardown: &[Teardown]) {
    // Reverse collection order puts every child before its parent.
    for entry in teardown.iter().rev() {
        if let Some(native) = entry.native {
            entry.node.release(display, native);
        }
    }

    for entry in teardown {
        let Some(native) = entry.native else {
            continue;
        };
        // Destroying an ancestor already took its descendants with it.
        if !display.contains(native) {
            continue;
        }
        match display.destroy(native) {
            Ok(count) => {
                tracing::debug!(target: targets::DISPOSAL, handle = %entry.node.id(), count, "destroyed native widgets");
            }
            Err(err) => {
                tracing::warn!(target: targets::DISPOSAL, handle = %entry.node.id(), %err, "failed to destroy native widget");
            }
        }
    }
}

/// Finish a disposal started on a caller thread.
pub(crate) fn finish(owner: &OwnerThread, teardown: Vec<Teardown>) {
    if teardown.iter().all(|entry| entry.native.is_none()) {
        return;
    }

    if !owner.is_running() {
        tracing::debug!(
            target: targets::DISPOSAL,
            "owner thread stopped; native widgets were released with the display"
        );
        return;
    }

    let timeout = owner.config().invoke_timeout;
    match owner.submit("dispose", timeout, move |display| destroy_natives(display, &teardown)) {
        Ok(()) => {}
        Err(TetherError::ReentrantInvocation) => {
            tracing::error!(
                target: targets::DISPOSAL,
                "dispose() called on the owner thread; use dispose_in() there. Native widgets stay alive until shutdown"
            );
        }
        Err(err) => {
            tracing::warn!(target: targets::DISPOSAL, %err, "native teardown did not complete");
        }
    }
}
