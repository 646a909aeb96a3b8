//! Prelude module for Horizon Tether.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_tether::prelude::*;
//! ```

// ============================================================================
// Owner Thread
// ============================================================================

pub use crate::{ContextInfo, OwnerThread, OwnerThreadBuilder, OwnerThreadConfig};

// ============================================================================
// Handles
// ============================================================================

pub use crate::{Handle, HandleId, Parent, State, Style};

// ============================================================================
// Widgets
// ============================================================================

pub use crate::widget::{Button, Combo, Composite, Font, ProgressBar, Shell, Text};

// ============================================================================
// Native Types
// ============================================================================

pub use crate::Size;

// ============================================================================
// Errors
// ============================================================================

pub use crate::{NativeError, Result, TetherError};
