//! Top-level window handle.
//!
//! A [`Shell`] is the root of a handle tree: it needs no parent and every
//! other widget is created, directly or indirectly, under one.

use std::fmt;
use std::ops::Deref;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{
    Container, Display, Handle, NativeId, NodeRef, OwnerThread, Parent, ResourceId, Result, Size, Style, Widget,
};

use super::{NativeResult, fetch};

/// A font description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    /// Font family name.
    pub family: String,
    /// Size in points.
    pub points: u32,
}

impl Font {
    /// Create a font description.
    pub fn new(family: impl Into<String>, points: u32) -> Self {
        Self {
            family: family.into(),
            points,
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}pt", self.family, self.points)
    }
}

/// Buffered shell properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellField {
    /// Window title.
    Title,
    /// Visibility.
    Visible,
    /// Window size.
    Size,
    /// Font used for the window's contents.
    Font,
}

/// Shell operations.
#[derive(Debug)]
pub enum ShellOp {
    /// Refresh the cached visibility.
    FetchVisible,
    /// Refresh the cached size.
    FetchSize,
}

/// Cached state of a [`Shell`].
#[derive(Debug, Default)]
pub struct ShellPeer {
    title: String,
    visible: bool,
    size: Size,
    font: Option<Font>,
    font_resource: Option<ResourceId>,
}

impl ShellPeer {
    fn free_font(&mut self, display: &mut Display) {
        if let Some(resource) = self.font_resource.take() {
            if let Err(err) = display.free_resource(resource) {
                tracing::warn!(target: "horizon_tether::shell", %err, "failed to free font");
            }
        }
    }
}

impl Widget for ShellPeer {
    const CLASS: &'static str = "Shell";
    const ROOT: bool = true;

    type Field = ShellField;
    type Op = ShellOp;

    fn apply_field(&mut self, field: ShellField, display: &mut Display, native: NativeId) -> NativeResult {
        match field {
            ShellField::Title => display.set(native, attrs::TITLE, self.title.clone()),
            ShellField::Visible => display.set(native, attrs::VISIBLE, self.visible),
            ShellField::Size => display.set(native, attrs::SIZE, self.size),
            ShellField::Font => {
                self.free_font(display);
                self.font_resource = self
                    .font
                    .as_ref()
                    .map(|font| display.alloc_resource("font", font.to_string()));
                display.set(native, attrs::FONT, self.font_resource)
            }
        }
    }

    fn execute(&mut self, op: ShellOp, display: &mut Display, native: NativeId) -> NativeResult {
        match op {
            ShellOp::FetchVisible => self.visible = display.get_or(native, attrs::VISIBLE, false)?,
            ShellOp::FetchSize => self.size = display.get_or(native, attrs::SIZE, Size::default())?,
        }
        Ok(())
    }

    fn release(&mut self, display: &mut Display, native: NativeId) {
        tracing::debug!(target: "horizon_tether::shell", ?native, title = %self.title, "releasing shell resources");
        self.free_font(display);
    }
}

impl Container for ShellPeer {}

/// A top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    handle: Handle<ShellPeer>,
}

impl Shell {
    /// Create a shell handle. No native window exists until it is created or
    /// opened.
    pub fn new(owner: &OwnerThread, style: Style) -> Self {
        Self {
            handle: Handle::new(owner, style, ShellPeer::default()),
        }
    }

    /// Create the native window if needed and make it visible.
    pub fn open(&self) -> Result<()> {
        self.handle.create()?;
        self.set_visible(true)
    }

    /// Dispose the shell and every widget inside it.
    pub fn close(&self) {
        self.handle.dispose();
    }

    /// The window title.
    pub fn title(&self) -> String {
        self.handle.read(|peer| peer.title.clone())
    }

    /// Set the window title.
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        self.handle.write(ShellField::Title, move |peer| peer.title = title)
    }

    /// Whether the window is visible, as reported by the native toolkit.
    pub fn is_visible(&self) -> Result<bool> {
        fetch(&self.handle, ShellOp::FetchVisible, |peer| peer.visible)
    }

    /// Show or hide the window.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        self.handle.write(ShellField::Visible, move |peer| peer.visible = visible)
    }

    /// The window size, as reported by the native toolkit.
    pub fn size(&self) -> Result<Size> {
        fetch(&self.handle, ShellOp::FetchSize, |peer| peer.size)
    }

    /// Resize the window.
    pub fn set_size(&self, size: Size) -> Result<()> {
        self.handle.write(ShellField::Size, move |peer| peer.size = size)
    }

    /// The font in use.
    pub fn font(&self) -> Option<Font> {
        self.handle.read(|peer| peer.font.clone())
    }

    /// Set the font, or reset to the default with `None`.
    ///
    /// The native font resource is owned by the shell and released when the
    /// font is replaced or the shell is disposed.
    pub fn set_font(&self, font: Option<Font>) -> Result<()> {
        self.handle.write(ShellField::Font, move |peer| peer.font = font)
    }
}

impl Deref for Shell {
    type Target = Handle<ShellPeer>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Parent for Shell {
    fn node(&self) -> NodeRef {
        self.handle.node()
    }
}

// Ensure Shell is Send + Sync
static_assertions::assert_impl_all!(Shell: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::test_support::test_owner;
    use horizon_tether_core::{NativeEvent, State};

    #[test]
    fn test_shell_buffers_until_open() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::SHELL_TRIM);
        shell.set_title("Main").unwrap();
        shell.set_size(Size::new(640, 480)).unwrap();

        assert_eq!(shell.state(), State::NotCreated);
        assert_eq!(shell.title(), "Main");

        shell.open().unwrap();
        assert!(shell.is_visible().unwrap());
        assert_eq!(shell.size().unwrap(), Size::new(640, 480));

        let native = shell.native().unwrap();
        let title = owner
            .invoke(move |display| display.get(native, attrs::TITLE).unwrap())
            .unwrap();
        assert_eq!(title.as_deref(), Some("Main"));
        shell.close();
        owner.shutdown_and_join();
    }

    #[test]
    fn test_size_refreshes_after_native_resize() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::NONE);
        shell.set_size(Size::new(100, 100)).unwrap();
        shell.open().unwrap();

        let native = shell.native().unwrap();
        owner
            .simulate(NativeEvent::changed(native, attrs::SIZE, Size::new(300, 200)))
            .unwrap();
        // Let the owner thread dispatch the event.
        owner.invoke(|_| ()).unwrap();

        assert_eq!(shell.size().unwrap(), Size::new(300, 200));
        shell.close();
        owner.shutdown_and_join();
    }

    #[test]
    fn test_font_resources_are_released() {
        let owner = test_owner();
        let shell = Shell::new(&owner, Style::NONE);
        shell.set_font(Some(Font::new("Sans", 10))).unwrap();
        shell.open().unwrap();
        assert_eq!(owner.invoke(|display| display.resource_count()).unwrap(), 1);

        // Replacing the font frees the previous resource.
        shell.set_font(Some(Font::new("Serif", 12))).unwrap();
        assert_eq!(owner.invoke(|display| display.resource_count()).unwrap(), 1);
        assert_eq!(shell.font(), Some(Font::new("Serif", 12)));

        shell.close();
        assert_eq!(owner.invoke(|display| display.resource_count()).unwrap(), 0);
        owner.shutdown_and_join();
    }

    #[test]
    fn test_shell_cannot_take_parent() {
        let owner = test_owner();
        let a = Shell::new(&owner, Style::NONE);
        let b = Shell::new(&owner, Style::NONE);
        assert!(b.set_parent(&a).is_err());
        owner.shutdown_and_join();
    }
}
