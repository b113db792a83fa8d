//! Prelude module for hugetree.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use hugetree::prelude::*;
//! ```

// ============================================================================
// Ambient
// ============================================================================

pub use crate::{Error, Result, Signal};

// ============================================================================
// Handles and values
// ============================================================================

pub use crate::model::{CheckState, ItemHandle, ItemValue, ModelId, SortKey, SortSpec};

// ============================================================================
// Model traits
// ============================================================================

pub use crate::model::{ItemModel, ItemModelExt, LeveledItem, StateFilter};

// ============================================================================
// Models and proxies
// ============================================================================

pub use crate::model::{
    FilterProxyModel, ListModel, ProxyModel, SortProxyModel, TreeModel, VecSource, VirtualSource,
};

// ============================================================================
// State, search and paths
// ============================================================================

pub use crate::model::{
    ListStates, SearchOptions, StateTracker, TraversalStrategy, TreePath, TreeStates,
};
