//! Logging and debugging facilities for Horizon Tether.
//!
//! This module provides:
//! - Target names for filtering the crate's `tracing` output by subsystem
//! - Debug visualization for handle trees
//!
//! # Tracing Integration
//!
//! Horizon Tether uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_tether_core::disposal=debug")
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`HandleTreeDebug`] to get a view of a handle hierarchy:
//!
//! ```ignore
//! use horizon_tether_core::logging::HandleTreeDebug;
//!
//! println!("{}", HandleTreeDebug::new().format(&shell.node()));
//! ```

use std::fmt::Write as FmtWrite;

use crate::handle::NodeRef;

/// Target names for log filtering.
///
/// Every event in this crate is emitted under one of these targets. Use them
/// with `tracing` directives to filter logs by subsystem. `#[instrument]`
/// spans spell the same names as literals, since the attribute only takes a
/// string literal.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_tether_core";
    /// Owner thread loop and native event dispatch.
    pub const OWNER: &str = "horizon_tether_core::owner";
    /// Invocation completion and cancellation.
    pub const INVOCATION: &str = "horizon_tether_core::invocation";
    /// Handle construction, parenting and field writes.
    pub const HANDLE: &str = "horizon_tether_core::handle";
    /// Ancestor-first native creation.
    pub const RESOLVER: &str = "horizon_tether_core::resolver";
    /// Disposal and sub-resource release.
    pub const DISPOSAL: &str = "horizon_tether_core::disposal";
    /// The native display.
    pub const NATIVE: &str = "horizon_tether_core::native";
}

/// Style options for handle tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for handle tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show handle IDs.
    pub show_ids: bool,
    /// Whether to show lifecycle states.
    pub show_states: bool,
    /// Whether to show native widget ids.
    pub show_natives: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_states: true,
            show_natives: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_natives: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output (classes only).
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_states: false,
            show_natives: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing handle trees.
#[derive(Debug, Clone, Default)]
pub struct HandleTreeDebug {
    options: TreeFormatOptions,
}

impl HandleTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the subtree rooted at `root`.
    pub fn format(&self, root: &NodeRef) -> String {
        let mut output = String::new();
        self.format_into(root, 0, true, &mut output);
        output
    }

    fn format_into(&self, node: &NodeRef, depth: usize, is_last: bool, output: &mut String) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(node.class());

        // Writing to a String cannot fail.
        if self.options.show_ids {
            let _ = write!(output, " [{}]", node.id());
        }
        if self.options.show_states {
            let _ = write!(output, " ({})", node.state());
        }
        if self.options.show_natives {
            if let Some(native) = node.native() {
                let _ = write!(output, " <{native:?}>");
            }
        }
        output.push('\n');

        let children = node.child_nodes();
        let child_count = children.len();
        for (i, child) in children.iter().enumerate() {
            self.format_into(child, depth + 1, i + 1 == child_count, output);
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}
