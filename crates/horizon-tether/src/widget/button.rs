//! Button handle: push, check and radio buttons.

use std::ops::Deref;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{Display, Handle, NativeId, OwnerThread, Parent, Result, Style, Widget};

use super::{NativeResult, fetch};

/// Buffered button properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonField {
    /// Label.
    Text,
    /// Checked state of check and radio buttons.
    Selected,
    /// Enabled state.
    Enabled,
}

/// Button operations.
#[derive(Debug)]
pub enum ButtonOp {
    /// Refresh the cached checked state.
    FetchSelected,
}

/// Cached state of a [`Button`].
#[derive(Debug)]
pub struct ButtonPeer {
    text: String,
    selected: bool,
    enabled: bool,
    toggle: bool,
}

impl ButtonPeer {
    fn new(style: Style) -> Self {
        Self {
            text: String::new(),
            selected: false,
            enabled: true,
            toggle: style.contains(Style::CHECK) || style.contains(Style::RADIO),
        }
    }
}

impl Widget for ButtonPeer {
    const CLASS: &'static str = "Button";

    type Field = ButtonField;
    type Op = ButtonOp;

    fn apply_field(&mut self, field: ButtonField, display: &mut Display, native: NativeId) -> NativeResult {
        match field {
            ButtonField::Text => display.set(native, attrs::TEXT, self.text.clone()),
            // Push buttons have no checked state.
            ButtonField::Selected if !self.toggle => Ok(()),
            ButtonField::Selected => display.set(native, attrs::SELECTED, self.selected),
            ButtonField::Enabled => display.set(native, attrs::ENABLED, self.enabled),
        }
    }

    fn execute(&mut self, op: ButtonOp, display: &mut Display, native: NativeId) -> NativeResult {
        match op {
            ButtonOp::FetchSelected => {
                self.selected = display.get_or(native, attrs::SELECTED, false)?;
            }
        }
        Ok(())
    }
}

/// A push, check or radio button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    handle: Handle<ButtonPeer>,
}

impl Button {
    /// Create a button under `parent`.
    ///
    /// `Style::CHECK` or `Style::RADIO` make a toggle button; otherwise it is
    /// a push button.
    pub fn new(parent: &dyn Parent, style: Style) -> Result<Self> {
        Ok(Self {
            handle: Handle::with_parent(parent, style, ButtonPeer::new(style))?,
        })
    }

    /// Create a button with no parent yet.
    pub fn detached(owner: &OwnerThread, style: Style) -> Self {
        Self {
            handle: Handle::new(owner, style, ButtonPeer::new(style)),
        }
    }

    /// The label.
    pub fn text(&self) -> String {
        self.handle.read(|peer| peer.text.clone())
    }

    /// Set the label.
    pub fn set_text(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.handle.write(ButtonField::Text, move |peer| peer.text = text)
    }

    /// Whether a check or radio button is checked, as reported by the native
    /// toolkit. Always `false` for push buttons.
    pub fn is_selected(&self) -> Result<bool> {
        fetch(&self.handle, ButtonOp::FetchSelected, |peer| peer.selected)
    }

    /// Check or uncheck a toggle button. Ignored by push buttons.
    pub fn set_selected(&self, selected: bool) -> Result<()> {
        self.handle.write(ButtonField::Selected, move |peer| peer.selected = selected)
    }

    /// Whether the button accepts input.
    pub fn is_enabled(&self) -> bool {
        self.handle.read(|peer| peer.enabled)
    }

    /// Enable or disable the button.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.handle.write(ButtonField::Enabled, move |peer| peer.enabled = enabled)
    }
}

impl Deref for Button {
    type Target = Handle<ButtonPeer>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

static_assertions::assert_impl_all!(Button: Send, Sync);
