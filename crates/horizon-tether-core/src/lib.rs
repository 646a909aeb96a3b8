//! Core systems for Horizon Tether.
//!
//! This crate provides the cross-thread invocation layer between application
//! threads and a single-threaded native widget toolkit:
//!
//! - **Owner Thread**: The one thread that runs the native event loop and owns
//!   every native widget
//! - **Invocation Channel**: Synchronous, FIFO hand-off of work to the owner
//!   thread with an optional bounded wait
//! - **Access Handles**: Thread-safe proxies for native widgets with deferred
//!   creation and buffered field writes
//! - **Creation Resolver**: Ancestor-first creation of native widgets
//! - **Disposal Guard**: Cascading, idempotent teardown with release hooks
//!
//! # Example
//!
//! ```
//! use horizon_tether_core::{OwnerThread, OwnerThreadConfig, Style};
//!
//! let owner = OwnerThread::start(OwnerThreadConfig::with_name("ui"))?;
//!
//! // Raw invocations run on the owner thread and hand back their result.
//! let created = owner.invoke(|display| display.create("Shell", None, Style::NONE))??;
//! let class = owner.invoke(move |display| display.class(created))??;
//! assert_eq!(class, "Shell");
//!
//! owner.shutdown_and_join();
//! # Ok::<(), horizon_tether_core::TetherError>(())
//! ```
//!
//! Widget handles built on [`Handle`] live in the `horizon-tether` crate.

mod config;
mod error;
pub mod handle;
pub mod invocation;
pub mod logging;
pub mod native;
mod owner;
pub mod thread_check;

pub use config::{OwnerThreadBuilder, OwnerThreadConfig};
pub use error::{NativeError, NotReadyReason, Result, TetherError};
pub use handle::{Container, Handle, HandleId, Node, NodeRef, Parent, State, Style, Widget};
pub use logging::{HandleTreeDebug, TreeFormatOptions, TreeStyle};
pub use native::{Attr, Display, NativeEvent, NativeId, ResourceId, Size};
pub use owner::{ContextInfo, OwnerThread};
pub use thread_check::ThreadAffinity;

static_assertions::assert_impl_all!(OwnerThread: Send, Sync, Clone);
static_assertions::assert_impl_all!(TetherError: Send, Sync);
static_assertions::assert_not_impl_any!(Display: Send, Sync);
