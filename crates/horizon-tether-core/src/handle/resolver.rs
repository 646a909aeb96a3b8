//! Ancestor-first creation of native widgets.
//!
//! Realization only ever runs on the owner thread, so the check-then-set of a
//! handle's lifecycle cannot race with another realization: two callers that
//! both trigger creation of the same handle are serialized by the owner
//! thread, and the second one finds it already `Created`.

use super::node::{Core, Creatable, HandleInner, Node, Parentable};
use super::{Lifecycle, Widget};
use crate::error::{Result, TetherError};
use crate::logging::targets;
use crate::native::{Display, NativeId};

impl<W: Widget> Creatable for HandleInner<W> {
    #[tracing::instrument(skip_all, target = "horizon_tether_core::resolver", level = "trace", fields(handle = %self.id, class = W::CLASS))]
    fn realize(&self, display: &mut Display) -> Result<Option<NativeId>> {
        match self.core.lock().lifecycle {
            Lifecycle::Created(native) => return Ok(Some(native)),
            Lifecycle::Disposed => return Ok(None),
            Lifecycle::NotCreated => {}
        }

        let parent_native = if W::ROOT {
            None
        } else {
            let Some(parent) = self.parent_node() else {
                tracing::warn!(
                    target: targets::RESOLVER,
                    handle = %self.id,
                    class = W::CLASS,
                    "creation requested for a handle without a parent"
                );
                return Err(TetherError::MissingParent {
                    handle: self.id,
                    class: W::CLASS,
                });
            };

            match parent.realize(display)? {
                Some(native) => Some(native),
                None => {
                    self.orphan(parent.as_ref());
                    return Ok(None);
                }
            }
        };

        let mut core = self.core.lock();
        if !matches!(core.lifecycle, Lifecycle::NotCreated) {
            // Disposed by a caller thread while the ancestors were realized.
            return Ok(core.lifecycle.native());
        }

        let native = W::create_native(display, parent_native, self.style)?;
        core.lifecycle = Lifecycle::Created(native);

        // Every buffered field gets its one attempt, even after a failure.
        let Core { widget, pending, .. } = &mut *core;
        let fields = pending.drain();
        let applied = fields.len();
        let mut first_error = None;
        for field in fields {
            if let Err(err) = widget.apply_field(field, display, native) {
                tracing::warn!(target: targets::RESOLVER, handle = %self.id, ?field, %err, "failed to apply buffered field");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        tracing::debug!(
            target: targets::RESOLVER,
            handle = %self.id,
            class = W::CLASS,
            ?native,
            applied,
            "realized native widget"
        );
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(Some(native)),
        }
    }
}

impl<W: Widget> HandleInner<W> {
    /// An ancestor was disposed before this handle was realized.
    fn orphan(&self, parent: &dyn Node) {
        let mut core = self.core.lock();
        if matches!(core.lifecycle, Lifecycle::NotCreated) {
            core.lifecycle = Lifecycle::Disposed;
            core.pending.clear();
            tracing::debug!(
                target: targets::RESOLVER,
                handle = %self.id,
                parent = %parent.id(),
                "ancestor disposed before creation; disposing handle"
            );
        }
    }
}
