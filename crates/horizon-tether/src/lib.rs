//! Horizon Tether - thread-safe handles for a single-threaded native toolkit.
//!
//! This is the main umbrella crate. It re-exports the core (owner thread,
//! invocation channel, handle lifecycle) and adds the widget handles.
//!
//! # Example
//!
//! ```
//! use horizon_tether::prelude::*;
//! use std::thread;
//!
//! let owner = OwnerThread::start(OwnerThreadConfig::with_name("ui"))?;
//! let shell = Shell::new(&owner, Style::SHELL_TRIM);
//! let progress = ProgressBar::new(&shell, Style::SMOOTH)?;
//! shell.open()?;
//!
//! // Handles can be used from any thread.
//! let worker = {
//!     let progress = progress.clone();
//!     thread::spawn(move || progress.set_value(250))
//! };
//! worker.join().unwrap()?;
//! assert_eq!(progress.value()?, 100);
//!
//! shell.close();
//! owner.shutdown_and_join();
//! # Ok::<(), TetherError>(())
//! ```

pub use horizon_tether_core::*;

pub mod prelude;
pub mod widget;

pub use widget::{Button, Combo, Composite, Font, ProgressBar, Shell, Text};
