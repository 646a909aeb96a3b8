//! Progress bar handle.
//!
//! The native progress bar clamps its value to `[minimum, maximum]`, so
//! [`ProgressBar::value`] may differ from the last value written.

use std::ops::Deref;

use horizon_tether_core::native::attrs;
use horizon_tether_core::{Display, Handle, NativeId, OwnerThread, Parent, Result, Style, Widget};

use super::{NativeResult, fetch};

const DEFAULT_MINIMUM: i32 = 0;
const DEFAULT_MAXIMUM: i32 = 100;

/// Buffered progress bar properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBarField {
    /// Range minimum.
    Minimum,
    /// Range maximum.
    Maximum,
    /// Current value.
    Value,
}

/// Progress bar operations.
#[derive(Debug)]
pub enum ProgressBarOp {
    /// Refresh the cached value.
    FetchValue,
}

/// Cached state of a [`ProgressBar`].
#[derive(Debug)]
pub struct ProgressBarPeer {
    minimum: i32,
    maximum: i32,
    value: i32,
}

impl Default for ProgressBarPeer {
    fn default() -> Self {
        Self {
            minimum: DEFAULT_MINIMUM,
            maximum: DEFAULT_MAXIMUM,
            value: DEFAULT_MINIMUM,
        }
    }
}

/// Clamp the native value into the native range.
fn clamp_native(display: &mut Display, native: NativeId, value: i32) -> NativeResult {
    let minimum = display.get_or(native, attrs::MINIMUM, DEFAULT_MINIMUM)?;
    let maximum = display.get_or(native, attrs::MAXIMUM, DEFAULT_MAXIMUM)?.max(minimum);
    display.set(native, attrs::VALUE, value.clamp(minimum, maximum))
}

impl Widget for ProgressBarPeer {
    const CLASS: &'static str = "ProgressBar";

    type Field = ProgressBarField;
    type Op = ProgressBarOp;

    fn apply_field(&mut self, field: ProgressBarField, display: &mut Display, native: NativeId) -> NativeResult {
        match field {
            ProgressBarField::Minimum => display.set(native, attrs::MINIMUM, self.minimum)?,
            ProgressBarField::Maximum => display.set(native, attrs::MAXIMUM, self.maximum)?,
            ProgressBarField::Value => return clamp_native(display, native, self.value),
        }
        // A new range re-clamps the current native value.
        let current = display.get_or(native, attrs::VALUE, DEFAULT_MINIMUM)?;
        clamp_native(display, native, current)
    }

    fn execute(&mut self, op: ProgressBarOp, display: &mut Display, native: NativeId) -> NativeResult {
        match op {
            ProgressBarOp::FetchValue => {
                self.value = display.get_or(native, attrs::VALUE, DEFAULT_MINIMUM)?;
            }
        }
        Ok(())
    }
}

/// A determinate progress indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBar {
    handle: Handle<ProgressBarPeer>,
}

impl ProgressBar {
    /// Create a progress bar under `parent`, ranging from 0 to 100.
    pub fn new(parent: &dyn Parent, style: Style) -> Result<Self> {
        Ok(Self {
            handle: Handle::with_parent(parent, style, ProgressBarPeer::default())?,
        })
    }

    /// Create a progress bar with no parent yet.
    pub fn detached(owner: &OwnerThread, style: Style) -> Self {
        Self {
            handle: Handle::new(owner, style, ProgressBarPeer::default()),
        }
    }

    /// The range minimum.
    pub fn minimum(&self) -> i32 {
        self.handle.read(|peer| peer.minimum)
    }

    /// Set the range minimum.
    pub fn set_minimum(&self, minimum: i32) -> Result<()> {
        self.handle.write(ProgressBarField::Minimum, move |peer| peer.minimum = minimum)
    }

    /// The range maximum.
    pub fn maximum(&self) -> i32 {
        self.handle.read(|peer| peer.maximum)
    }

    /// Set the range maximum.
    pub fn set_maximum(&self, maximum: i32) -> Result<()> {
        self.handle.write(ProgressBarField::Maximum, move |peer| peer.maximum = maximum)
    }

    /// The current value, read back from the native widget.
    pub fn value(&self) -> Result<i32> {
        fetch(&self.handle, ProgressBarOp::FetchValue, |peer| peer.value)
    }

    /// Set the current value. The native widget clamps it to the range.
    pub fn set_value(&self, value: i32) -> Result<()> {
        self.handle.write(ProgressBarField::Value, move |peer| peer.value = value)
    }
}

impl Deref for ProgressBar {
    type Target = Handle<ProgressBarPeer>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

static_assertions::assert_impl_all!(ProgressBar: Send, Sync);
