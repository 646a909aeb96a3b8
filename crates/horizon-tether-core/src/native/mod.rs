//! The native toolkit living on the owner thread.
//!
//! [`Display`] is the single-threaded native context: an arena of native
//! widgets with typed attributes, sub-resources such as fonts and colors, and
//! a queue of pending native events. It is deliberately `!Send`; it is created
//! on the owner thread and never leaves it, so any code that holds a
//! `&mut Display` is running on the owner thread.
//!
//! # Related Types
//!
//! - [`crate::OwnerThread`] - Owns the display and pumps its event queue
//! - [`crate::Handle`] - Cross-thread proxy for one native widget

mod display;

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use slotmap::new_key_type;

pub use display::Display;

new_key_type! {
    /// Identifies a native widget inside one [`Display`].
    ///
    /// Only meaningful on the owner thread; handles expose it so owner-thread
    /// code (invocations, native events) can address the widget.
    pub struct NativeId;

    /// Identifies a native sub-resource (font, color, image).
    pub struct ResourceId;
}

/// A typed attribute key for native widget state.
///
/// Attributes are stored type-erased on the native widget; the key carries
/// the value type so reads and writes stay typed.
pub struct Attr<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Attr<T> {
    /// Create an attribute key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The attribute name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Attr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Attr<T> {}

impl<T> fmt::Debug for Attr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attr").field(&self.name).finish()
    }
}

/// A width/height pair in native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Standard native attributes.
pub mod attrs {
    use super::{Attr, ResourceId, Size};

    /// Text content.
    pub const TEXT: Attr<String> = Attr::new("text");
    /// Window title.
    pub const TITLE: Attr<String> = Attr::new("title");
    /// Visibility.
    pub const VISIBLE: Attr<bool> = Attr::new("visible");
    /// Enabled state.
    pub const ENABLED: Attr<bool> = Attr::new("enabled");
    /// Whether text can be edited.
    pub const EDITABLE: Attr<bool> = Attr::new("editable");
    /// Checked/pressed state of toggle buttons.
    pub const SELECTED: Attr<bool> = Attr::new("selected");
    /// Widget size.
    pub const SIZE: Attr<Size> = Attr::new("size");
    /// List items.
    pub const ITEMS: Attr<Vec<String>> = Attr::new("items");
    /// Selected list index.
    pub const SELECTION_INDEX: Attr<Option<usize>> = Attr::new("selection_index");
    /// Selected text range, as `(start, end)` character offsets.
    pub const SELECTION_RANGE: Attr<(usize, usize)> = Attr::new("selection_range");
    /// Range minimum.
    pub const MINIMUM: Attr<i32> = Attr::new("minimum");
    /// Range maximum.
    pub const MAXIMUM: Attr<i32> = Attr::new("maximum");
    /// Range value.
    pub const VALUE: Attr<i32> = Attr::new("value");
    /// Font resource in use.
    pub const FONT: Attr<Option<ResourceId>> = Attr::new("font");
}

/// A native event waiting to be dispatched on the owner thread.
pub enum NativeEvent {
    /// Native state changed independently of any caller thread, for example
    /// because the user typed into a field or closed a window.
    Changed {
        /// The widget whose state changed.
        widget: NativeId,
        /// Attribute name.
        attr: &'static str,
        /// New value, type-erased.
        value: Box<dyn Any + Send>,
    },
    /// Work to run on the owner thread during event dispatch.
    Run(Box<dyn FnOnce(&mut Display) + Send>),
}

impl NativeEvent {
    /// Build a typed [`NativeEvent::Changed`].
    pub fn changed<T: Any + Send>(widget: NativeId, attr: Attr<T>, value: T) -> Self {
        Self::Changed {
            widget,
            attr: attr.name(),
            value: Box::new(value),
        }
    }

    /// Build a [`NativeEvent::Run`].
    pub fn run<F>(f: F) -> Self
    where
        F: FnOnce(&mut Display) + Send + 'static,
    {
        Self::Run(Box::new(f))
    }
}

impl fmt::Debug for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed { widget, attr, .. } => f
                .debug_struct("Changed")
                .field("widget", widget)
                .field("attr", attr)
                .finish_non_exhaustive(),
            Self::Run(_) => f.write_str("Run(..)"),
        }
    }
}
