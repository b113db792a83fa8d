//! Virtualized item models.
//!
//! This module provides the navigation engine: small copyable handles that
//! address items of arbitrarily large hierarchies, a model trait with
//! correct-but-generic default algorithms, fast concrete models, proxies
//! that sort and filter without touching the data, and sparse per-item
//! view state.
//!
//! # Core Types
//!
//! - [`ItemHandle`]: identifies an item; compares equal across proxy layers
//! - [`ItemModel`]: the trait every model implements
//! - [`ItemValue`]: the value of one field of an item
//! - [`StateFilter`]: reports expansion state to traversal queries
//!
//! # Model Implementations
//!
//! - [`ListModel`]: a flat model with closed-form rank arithmetic
//! - [`TreeModel`]: an editable arena-backed tree
//! - [`ProxyModel`]: forwards everything to the model it owns
//! - [`SortProxyModel`] / [`FilterProxyModel`]: re-ordered or filtered
//!   views over cached child arrays
//!
//! # Example
//!
//! ```
//! use hugetree::model::{FilterProxyModel, ItemModel, ItemValue, ListModel, VirtualSource};
//!
//! // A billion rows, none of them stored.
//! let list = ListModel::new(VirtualSource::new(1_000_000_000, 1, |row, _| ItemValue::from(row)));
//! assert_eq!(list.subtree_size(list.root(), None), 1_000_000_001);
//!
//! let row = list.find_item(123_456_789, None, list.root(), 0);
//! assert_eq!(list.item_rank(row, None), Some(123_456_789));
//!
//! // Proxies wrap by ownership and keep handles comparable.
//! let proxy = FilterProxyModel::with_master(Box::new(ListModel::new(VirtualSource::new(
//!     10,
//!     1,
//!     |row, _| ItemValue::from(row),
//! ))));
//! assert_eq!(proxy.child_count(proxy.root()), 10);
//! ```
//!
//! # Architecture Overview
//!
//! ```text
//! ┌────────────────┐ owns ┌────────────────┐ owns ┌─────────────┐
//! │ FilterProxy    │─────>│ SortProxy      │─────>│ ListModel / │
//! │ (top model)    │      │                │      │ TreeModel   │
//! └────────────────┘      └────────────────┘      └─────────────┘
//!         │                        ▲ parent_model          ▲
//!         │ ItemHandle             └───────────────────────┘
//!         ▼
//! ┌────────────────┐  StateFilter  ┌────────────────┐
//! │ caller / view  │<──────────────│ TreeStates     │
//! └────────────────┘               └────────────────┘
//! ```

pub mod algorithms;
mod array_proxy;
mod cache;
mod debug;
mod filter_proxy;
mod handle;
mod list_model;
mod proxy_model;
mod search;
mod sort_proxy;
pub mod state;
mod traits;
mod traverse;
mod tree_model;
mod tree_path;
mod value;

#[cfg(test)]
pub(crate) mod test_support;

pub use array_proxy::{ArrayProxyModel, ChildrenHook, PassThrough};
pub use cache::{CacheConfig, CacheStats, ChildrenCache, DEFAULT_MAX_CHILDREN, DEFAULT_MAX_ENTRIES, DEFAULT_MIN_CHILDREN};
pub use debug::ModelTreeDebug;
pub use filter_proxy::{FilterChildren, FilterProxyModel, Recursive, ValueFilter, recursive};
pub use handle::{ItemHandle, ModelId};
pub use list_model::{ListAccess, ListModel, ListSource, ValueExtractor, ValueSetter, VecSource, VirtualSource};
pub use proxy_model::{ProxyAccess, ProxyModel, bottom_model, find_layer, to_bottom};
pub use search::{Matcher, SearchOptions};
pub use sort_proxy::{SortChildren, SortProxyModel};
pub use state::{ListStates, SelectionScope, StateCore, StateMap, StateSignals, StateTracker, TreeStates};
pub use traits::{ItemModel, ItemModelExt, LeveledItem, ModelBase, ModelSignals, StateFilter};
pub use traverse::{
    TraversalStrategy, TraverseControl, traverse, traverse_iterative, traverse_recursive,
};
pub use tree_model::{NodeData, NodeKey, TreeModel};
pub use tree_path::{INLINE_DEPTH, TreePath};
pub use value::{CheckState, FieldCount, ItemValue, ScalarValue, SortKey, SortSpec};
