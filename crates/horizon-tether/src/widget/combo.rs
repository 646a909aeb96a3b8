//! Drop-down list handle.
//!
//! The native combo only accepts a selection index that is valid for its
//! current items. Buffered fields are applied in last-write order, so the
//! items must be written before the selection for the selection to stick.

use std::ops::Deref;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{Display, Handle, NativeId, OwnerThread, Parent, Result, Style, Widget};

use super::{NativeResult, fetch};

/// Buffered combo properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboField {
    /// The list of items.
    Items,
    /// The selected index.
    Selection,
}

/// Combo operations.
#[derive(Debug)]
pub enum ComboOp {
    /// Refresh the cached selection.
    FetchSelection,
    /// Append an item to the native list.
    Add(String),
    /// Remove every item and clear the selection.
    RemoveAll,
}

/// Cached state of a [`Combo`].
#[derive(Debug, Default)]
pub struct ComboPeer {
    items: Vec<String>,
    selection: Option<usize>,
}

impl Widget for ComboPeer {
    const CLASS: &'static str = "Combo";

    type Field = ComboField;
    type Op = ComboOp;

    fn apply_field(&mut self, field: ComboField, display: &mut Display, native: NativeId) -> NativeResult {
        match field {
            ComboField::Items => {
                display.set(native, attrs::ITEMS, self.items.clone())?;
                let selection = display.get_or(native, attrs::SELECTION_INDEX, None)?;
                if selection.is_some_and(|index| index >= self.items.len()) {
                    display.set(native, attrs::SELECTION_INDEX, None)?;
                }
                Ok(())
            }
            ComboField::Selection => {
                let count = display.get_or(native, attrs::ITEMS, Vec::new())?.len();
                match self.selection {
                    Some(index) if index >= count => {
                        tracing::debug!(target: "horizon_tether::combo", index, count, "ignoring out of range selection");
                        Ok(())
                    }
                    selection => display.set(native, attrs::SELECTION_INDEX, selection),
                }
            }
        }
    }

    fn execute(&mut self, op: ComboOp, display: &mut Display, native: NativeId) -> NativeResult {
        match op {
            ComboOp::FetchSelection => {
                self.selection = display.get_or(native, attrs::SELECTION_INDEX, None)?;
            }
            ComboOp::Add(item) => {
                let mut items = display.get_or(native, attrs::ITEMS, Vec::new())?;
                items.push(item);
                display.set(native, attrs::ITEMS, items.clone())?;
                self.items = items;
            }
            ComboOp::RemoveAll => {
                display.set(native, attrs::ITEMS, Vec::new())?;
                display.set(native, attrs::SELECTION_INDEX, None)?;
                self.items.clear();
                self.selection = None;
            }
        }
        Ok(())
    }
}

/// A drop-down list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combo {
    handle: Handle<ComboPeer>,
}

impl Combo {
    /// Create a combo under `parent`.
    pub fn new(parent: &dyn Parent, style: Style) -> Result<Self> {
        Ok(Self {
            handle: Handle::with_parent(parent, style, ComboPeer::default())?,
        })
    }

    /// Create a combo with no parent yet.
    pub fn detached(owner: &OwnerThread, style: Style) -> Self {
        Self {
            handle: Handle::new(owner, style, ComboPeer::default()),
        }
    }

    /// The items.
    pub fn items(&self) -> Vec<String> {
        self.handle.read(|peer| peer.items.clone())
    }

    /// Replace the items.
    pub fn set_items<I, S>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        self.handle.write(ComboField::Items, move |peer| peer.items = items)
    }

    /// Append an item. Creates the native widget first if needed.
    pub fn add(&self, item: impl Into<String>) -> Result<()> {
        self.handle.invoke(ComboOp::Add(item.into()))
    }

    /// Remove every item. Creates the native widget first if needed.
    pub fn remove_all(&self) -> Result<()> {
        self.handle.invoke(ComboOp::RemoveAll)
    }

    /// The selected index, read back from the native widget.
    pub fn selection(&self) -> Result<Option<usize>> {
        fetch(&self.handle, ComboOp::FetchSelection, |peer| peer.selection)
    }

    /// Select the item at `index`, or clear the selection with `None`.
    ///
    /// An index that is out of range for the native items is ignored.
    pub fn select(&self, index: Option<usize>) -> Result<()> {
        self.handle.write(ComboField::Selection, move |peer| peer.selection = index)
    }
}

impl Deref for Combo {
    type Target = Handle<ComboPeer>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

static_assertions::assert_impl_all!(Combo: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Shell;
    use crate::widget::test_support::test_owner;

    #[test]
    fn test_items_then_selection() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::NONE);
        let combo = Combo::new(&shell, Style::DROP_DOWN).unwrap();
        combo.set_items(["red", "green", "blue"]).unwrap();
        combo.select(Some(2)).unwrap();

        assert_eq!(combo.selection().unwrap(), Some(2));
        assert_eq!(combo.items(), vec!["red", "green", "blue"]);
        shell.close();
        owner.shutdown_and_join();
    }

    #[test]
    fn test_selection_then_items_is_dropped() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::NONE);
        let combo = Combo::new(&shell, Style::DROP_DOWN).unwrap();
        combo.select(Some(1)).unwrap();
        combo.set_items(["a", "b"]).unwrap();

        assert_eq!(combo.selection().unwrap(), None);
        shell.close();
        owner.shutdown_and_join();
    }

    #[test]
    fn test_add_and_remove_all() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::NONE);
        let combo = Combo::new(&shell, Style::NONE).unwrap();
        combo.set_items(["one"]).unwrap();

        combo.add("two").unwrap();
        assert_eq!(combo.items(), vec!["one", "two"]);
        combo.select(Some(1)).unwrap();
        assert_eq!(combo.selection().unwrap(), Some(1));

        // Shrinking the items clears a selection that no longer fits.
        combo.set_items(["only"]).unwrap();
        assert_eq!(combo.selection().unwrap(), None);

        combo.remove_all().unwrap();
        assert!(combo.items().is_empty());
        shell.close();
        owner.shutdown_and_join();
    }
}
