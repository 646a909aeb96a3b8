//! Container handle for grouping child widgets.

use std::ops::Deref;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{Container, Display, Handle, NativeId, NodeRef, OwnerThread, Parent, Result, Style, Widget};

use super::{NativeResult, fetch};

/// Buffered composite properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeField {
    /// Visibility.
    Visible,
    /// Enabled state.
    Enabled,
}

/// Composite operations.
#[derive(Debug)]
pub enum CompositeOp {
    /// Refresh the cached visibility.
    FetchVisible,
}

/// Cached state of a [`Composite`].
#[derive(Debug)]
pub struct CompositePeer {
    visible: bool,
    enabled: bool,
}

impl Default for CompositePeer {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
        }
    }
}

impl Widget for CompositePeer {
    const CLASS: &'static str = "Composite";

    type Field = CompositeField;
    type Op = CompositeOp;

    fn apply_field(&mut self, field: CompositeField, display: &mut Display, native: NativeId) -> NativeResult {
        match field {
            CompositeField::Visible => display.set(native, attrs::VISIBLE, self.visible),
            CompositeField::Enabled => display.set(native, attrs::ENABLED, self.enabled),
        }
    }

    fn execute(&mut self, op: CompositeOp, display: &mut Display, native: NativeId) -> NativeResult {
        match op {
            CompositeOp::FetchVisible => {
                self.visible = display.get_or(native, attrs::VISIBLE, true)?;
            }
        }
        Ok(())
    }
}

impl Container for CompositePeer {}

/// A widget that contains other widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    handle: Handle<CompositePeer>,
}

impl Composite {
    /// Create a composite under `parent`.
    pub fn new(parent: &dyn Parent, style: Style) -> Result<Self> {
        Ok(Self {
            handle: Handle::with_parent(parent, style, CompositePeer::default())?,
        })
    }

    /// Create a composite with no parent yet.
    ///
    /// A parent must be assigned with `set_parent` before the composite, or
    /// any of its children, can be created.
    pub fn detached(owner: &OwnerThread, style: Style) -> Self {
        Self {
            handle: Handle::new(owner, style, CompositePeer::default()),
        }
    }

    /// Whether the composite is visible, as reported by the native toolkit.
    pub fn is_visible(&self) -> Result<bool> {
        fetch(&self.handle, CompositeOp::FetchVisible, |peer| peer.visible)
    }

    /// Show or hide the composite.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        self.handle.write(CompositeField::Visible, move |peer| peer.visible = visible)
    }

    /// Whether the composite accepts input.
    pub fn is_enabled(&self) -> bool {
        self.handle.read(|peer| peer.enabled)
    }

    /// Enable or disable the composite.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.handle.write(CompositeField::Enabled, move |peer| peer.enabled = enabled)
    }
}

impl Deref for Composite {
    type Target = Handle<CompositePeer>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Parent for Composite {
    fn node(&self) -> NodeRef {
        self.handle.node()
    }
}

static_assertions::assert_impl_all!(Composite: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Shell;
    use crate::widget::test_support::test_owner;
    use horizon_tether_core::{State, TetherError};

    #[test]
    fn test_nested_composites_create_in_order() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::NONE);
        let outer = Composite::new(&shell, Style::BORDER).unwrap();
        let inner = Composite::new(&outer, Style::NONE).unwrap();
        inner.set_enabled(false).unwrap();

        inner.create().unwrap();
        assert_eq!(shell.state(), State::Created);
        assert_eq!(outer.state(), State::Created);
        assert!(!inner.is_enabled());

        let (outer_native, inner_native) = (outer.native().unwrap(), inner.native().unwrap());
        let (parent, enabled) = owner
            .invoke(move |display| {
                (
                    display.parent(inner_native).unwrap(),
                    display.get(inner_native, attrs::ENABLED).unwrap(),
                )
            })
            .unwrap();
        assert_eq!(parent, Some(outer_native));
        assert_eq!(enabled, Some(false));
        shell.close();
        owner.shutdown_and_join();
    }

    #[test]
    fn test_detached_composite_needs_parent() {
        let owner = test_owner();
        let composite = Composite::detached(&owner, Style::NONE);
        assert!(matches!(composite.is_visible(), Err(TetherError::MissingParent { .. })));

        let shell = Shell::new(&owner, Style::NONE);
        composite.set_parent(&shell).unwrap();
        assert!(composite.is_visible().unwrap());
        assert_eq!(composite.state(), State::Created);
        shell.close();
        owner.shutdown_and_join();
    }
}
