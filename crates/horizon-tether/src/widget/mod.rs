//! Widget handles for Horizon Tether.
//!
//! Each widget type is a thin newtype over [`Handle`] that supplies the
//! widget's operation vocabulary:
//!
//! - A *peer* type implementing [`horizon_tether_core::Widget`] that holds the
//!   widget's cached field values and maps each field and operation onto the
//!   native display
//! - A closed `Field` enum of buffered properties
//! - A closed `Op` enum of read-backs and commands
//!
//! Lifecycle methods (`create`, `dispose`, `state`, `check_ready`, ...) come
//! from the wrapped [`Handle`] through `Deref`.
//!
//! # Setters and getters
//!
//! Setters update the cached value and return immediately while the widget
//! is not created; the value reaches the native widget once, at creation.
//! After creation they block until the owner thread has applied the value.
//!
//! Getters for state the native toolkit can change by itself (text typed by
//! the user, a resized window) refresh the cache on the owner thread before
//! returning, creating the widget first if needed. Other getters return the
//! cached value.
//!
//! # Example
//!
//! ```
//! use horizon_tether::prelude::*;
//!
//! let owner = OwnerThread::start(OwnerThreadConfig::with_name("ui"))?;
//! let shell = Shell::new(&owner, Style::SHELL_TRIM);
//! let name = Text::new(&shell, Style::BORDER | Style::SINGLE)?;
//! name.set_text("hello")?;
//!
//! // Nothing native exists yet; opening the shell creates it.
//! assert_eq!(name.state(), State::NotCreated);
//! shell.open()?;
//! assert_eq!(name.text()?, "hello");
//!
//! shell.close();
//! assert!(name.is_disposed());
//! owner.shutdown_and_join();
//! # Ok::<(), TetherError>(())
//! ```

mod button;
mod combo;
mod composite;
mod progress_bar;
mod shell;
mod text;

pub use button::{Button, ButtonField, ButtonOp, ButtonPeer};
pub use combo::{Combo, ComboField, ComboOp, ComboPeer};
pub use composite::{Composite, CompositeField, CompositeOp, CompositePeer};
pub use progress_bar::{ProgressBar, ProgressBarField, ProgressBarOp, ProgressBarPeer};
pub use shell::{Font, Shell, ShellField, ShellOp, ShellPeer};
pub use text::{Text, TextField, TextOp, TextPeer};

use horizon_tether_core::{Handle, NativeError, Result, Widget};

/// Outcome of a native field or operation.
pub(crate) type NativeResult = std::result::Result<(), NativeError>;

/// Refresh cached state on the owner thread, then read it.
///
/// On a disposed handle the refresh is skipped and the last cached value is
/// returned.
pub(crate) fn fetch<W: Widget, R>(handle: &Handle<W>, op: W::Op, read: impl FnOnce(&W) -> R) -> Result<R> {
    handle.invoke(op)?;
    Ok(handle.read(read))
}
