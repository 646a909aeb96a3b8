//! Text field handle.
//!
//! The native text can change without any call through the handle (the user
//! types), so [`Text::text`] and [`Text::selection`] always read back from the
//! native widget.

use std::ops::Deref;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{Display, Handle, NativeId, OwnerThread, Parent, Result, Style, Widget};

use super::{NativeResult, fetch};

/// Buffered text field properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// Content.
    Text,
    /// Whether the user may edit the content.
    Editable,
    /// Selected character range.
    Selection,
}

/// Text field operations.
#[derive(Debug)]
pub enum TextOp {
    /// Refresh the cached content.
    FetchText,
    /// Refresh the cached selection.
    FetchSelection,
    /// Append to the native content.
    Append(String),
}

/// Cached state of a [`Text`].
#[derive(Debug)]
pub struct TextPeer {
    text: String,
    editable: bool,
    selection: (usize, usize),
}

impl TextPeer {
    fn new(style: Style) -> Self {
        Self {
            text: String::new(),
            editable: !style.contains(Style::READ_ONLY),
            selection: (0, 0),
        }
    }
}

impl Widget for TextPeer {
    const CLASS: &'static str = "Text";

    type Field = TextField;
    type Op = TextOp;

    fn apply_field(&mut self, field: TextField, display: &mut Display, native: NativeId) -> NativeResult {
        match field {
            TextField::Text => display.set(native, attrs::TEXT, self.text.clone()),
            TextField::Editable => display.set(native, attrs::EDITABLE, self.editable),
            TextField::Selection => {
                // The native widget clamps the range to its current content.
                let len = display.get_or(native, attrs::TEXT, String::new())?.chars().count();
                let (start, end) = self.selection;
                let start = start.min(len);
                let end = end.clamp(start, len);
                display.set(native, attrs::SELECTION_RANGE, (start, end))
            }
        }
    }

    fn execute(&mut self, op: TextOp, display: &mut Display, native: NativeId) -> NativeResult {
        match op {
            TextOp::FetchText => {
                self.text = display.get_or(native, attrs::TEXT, String::new())?;
            }
            TextOp::FetchSelection => {
                self.selection = display.get_or(native, attrs::SELECTION_RANGE, (0, 0))?;
            }
            TextOp::Append(suffix) => {
                let mut text = display.get_or(native, attrs::TEXT, String::new())?;
                text.push_str(&suffix);
                display.set(native, attrs::TEXT, text.clone())?;
                self.text = text;
            }
        }
        Ok(())
    }
}

/// A single or multi-line text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    handle: Handle<TextPeer>,
}

impl Text {
    /// Create a text field under `parent`.
    ///
    /// `Style::READ_ONLY` makes the field initially not editable.
    pub fn new(parent: &dyn Parent, style: Style) -> Result<Self> {
        Ok(Self {
            handle: Handle::with_parent(parent, style, TextPeer::new(style))?,
        })
    }

    /// Create a text field with no parent yet.
    pub fn detached(owner: &OwnerThread, style: Style) -> Self {
        Self {
            handle: Handle::new(owner, style, TextPeer::new(style)),
        }
    }

    /// The current content, read back from the native widget.
    pub fn text(&self) -> Result<String> {
        fetch(&self.handle, TextOp::FetchText, |peer| peer.text.clone())
    }

    /// Replace the content.
    pub fn set_text(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.handle.write(TextField::Text, move |peer| peer.text = text)
    }

    /// Append to the content.
    ///
    /// Creates the native widget first if needed.
    pub fn append(&self, text: impl Into<String>) -> Result<()> {
        self.handle.invoke(TextOp::Append(text.into()))
    }

    /// Whether the user may edit the content.
    pub fn is_editable(&self) -> bool {
        self.handle.read(|peer| peer.editable)
    }

    /// Allow or forbid editing.
    pub fn set_editable(&self, editable: bool) -> Result<()> {
        self.handle.write(TextField::Editable, move |peer| peer.editable = editable)
    }

    /// The selected character range, read back from the native widget.
    pub fn selection(&self) -> Result<(usize, usize)> {
        fetch(&self.handle, TextOp::FetchSelection, |peer| peer.selection)
    }

    /// Select the characters in `start..end`.
    pub fn set_selection(&self, start: usize, end: usize) -> Result<()> {
        self.handle.write(TextField::Selection, move |peer| peer.selection = (start, end))
    }
}

impl Deref for Text {
    type Target = Handle<TextPeer>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

static_assertions::assert_impl_all!(Text: Send, Sync);
