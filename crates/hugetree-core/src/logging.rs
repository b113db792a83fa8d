//! Logging and debugging facilities for hugetree.
//!
//! This module provides:
//! - Target and span names for filtering `tracing` output by subsystem
//! - Formatting options shared by the model tree dump helpers
//! - Performance tracing hooks for long scans
//!
//! # Tracing Integration
//!
//! hugetree uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("hugetree::cache=trace,hugetree::proxy=debug")
//!     .init();
//! ```

/// Span names used throughout hugetree for tracing.
pub mod span_names {
    /// Long-running scans (rank lookups, value collection, range selection).
    pub const PERF: &str = "hugetree::perf";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Generic model navigation and search.
    pub const MODEL: &str = "hugetree::model";
    /// Proxy chains: attach, detach, sort and filter changes.
    pub const PROXY: &str = "hugetree::proxy";
    /// Child-array cache activity.
    pub const CACHE: &str = "hugetree::cache";
    /// Item state tracking.
    pub const STATE: &str = "hugetree::state";
    /// Tree path building and resolution.
    pub const PATH: &str = "hugetree::path";
    /// Signal emission.
    pub const SIGNAL: &str = "hugetree_core::signal";
}

/// Style options for tree dumps.
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

/// Configuration for tree dump output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show the raw handle fields next to each item.
    pub show_handles: bool,
    /// Whether to show the depth-first rank of each item.
    pub show_ranks: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Maximum number of children printed per item (None for unlimited).
    pub max_children: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_handles: false,
            show_ranks: false,
            max_depth: None,
            max_children: Some(64),
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_handles: true,
            show_ranks: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            style: TreeStyle::Compact,
            ..Default::default()
        }
    }

    /// Sets the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limits the dump depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Limits how many children are printed per item.
    pub fn with_max_children(mut self, max_children: Option<usize>) -> Self {
        self.max_children = max_children;
        self
    }

    /// Build the prefix string for one dump line.
    ///
    /// `lineage` holds, for every level from the first below the dumped
    /// item down to this line's item, whether that item is the last child
    /// of its parent. An empty lineage is the dumped item itself and gets
    /// no prefix.
    pub fn prefix(&self, lineage: &[bool]) -> String {
        let Some((&is_last, ancestors)) = lineage.split_last() else {
            return String::new();
        };

        let (branch, tee, corner) = match self.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };
        let gap = branch.chars().count() + self.indent_size;

        let mut prefix = String::new();
        for &ancestor_last in ancestors {
            if ancestor_last {
                prefix.extend(std::iter::repeat_n(' ', gap));
            } else {
                prefix.push_str(branch);
                prefix.extend(std::iter::repeat_n(' ', self.indent_size));
            }
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span open until dropped.
///
/// This is useful for tracking the duration of long scans.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: span_names::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_root_is_empty() {
        let options = TreeFormatOptions::default();
        assert_eq!(options.prefix(&[]), "");
    }

    #[test]
    fn test_prefix_ascii() {
        let options = TreeFormatOptions::default().with_style(TreeStyle::Ascii);
        assert_eq!(options.prefix(&[false]), "+-- ");
        assert_eq!(options.prefix(&[true]), "`-- ");
        assert_eq!(options.prefix(&[false, true]), "|  `-- ");
    }

    #[test]
    fn test_prefix_skips_guides_under_last_children() {
        let options = TreeFormatOptions::default().with_style(TreeStyle::Ascii);
        assert_eq!(options.prefix(&[true, true]), "   `-- ");
        assert_eq!(options.prefix(&[false, true, false]), "|     +-- ");

        let unicode = TreeFormatOptions::default();
        assert_eq!(unicode.prefix(&[true, false]), "   \u{251c}\u{2500}\u{2500} ");
        assert_eq!(TreeFormatOptions::minimal().prefix(&[true, false]), "  - ");
    }

    #[test]
    fn test_detailed_options() {
        let options = TreeFormatOptions::detailed();
        assert!(options.show_handles);
        assert!(options.show_ranks);
        assert_eq!(TreeFormatOptions::minimal().style, TreeStyle::Compact);
    }

    #[test]
    fn test_perf_span_without_subscriber() {
        let _span = PerfSpan::new("find_item");
        tracing::trace!(target: targets::MODEL, "inside perf span");
    }
}
