//! Toolkit creation style bits.

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Creation flags passed to a handle constructor and stored until the native
/// widget is created.
///
/// ```
/// use horizon_tether_core::Style;
///
/// let style = Style::BORDER | Style::READ_ONLY;
/// assert!(style.contains(Style::BORDER));
/// assert!(!style.contains(Style::MULTI));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style(u32);

impl Style {
    /// No flags.
    pub const NONE: Style = Style(0);
    /// Draw a border.
    pub const BORDER: Style = Style(1 << 0);
    /// Single-line or single-selection.
    pub const SINGLE: Style = Style(1 << 1);
    /// Multi-line or multi-selection.
    pub const MULTI: Style = Style(1 << 2);
    /// Not editable by the user.
    pub const READ_ONLY: Style = Style(1 << 3);
    /// Push button.
    pub const PUSH: Style = Style(1 << 4);
    /// Check box.
    pub const CHECK: Style = Style(1 << 5);
    /// Radio button.
    pub const RADIO: Style = Style(1 << 6);
    /// Drop-down list.
    pub const DROP_DOWN: Style = Style(1 << 7);
    /// Smooth progress indicator.
    pub const SMOOTH: Style = Style(1 << 8);
    /// Horizontal orientation.
    pub const HORIZONTAL: Style = Style(1 << 9);
    /// Vertical orientation.
    pub const VERTICAL: Style = Style(1 << 10);
    /// Window title bar.
    pub const TITLE: Style = Style(1 << 11);
    /// Window close box.
    pub const CLOSE: Style = Style(1 << 12);
    /// Resizable window border.
    pub const RESIZE: Style = Style(1 << 13);
    /// Standard top-level window trim.
    pub const SHELL_TRIM: Style = Style(Self::TITLE.0 | Self::CLOSE.0 | Self::RESIZE.0);

    /// Create from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if all flags in `other` are set.
    pub const fn contains(self, other: Style) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if no flags are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Style {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Style(self.0 | rhs.0)
    }
}

impl BitOrAssign for Style {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Style {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Style(self.0 & rhs.0)
    }
}
