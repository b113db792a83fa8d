//! hugetree - navigation and indexing for very large virtual trees and lists.
//!
//! The engine lets a caller address billions of conceptual items through
//! small, stable [`ItemHandle`](model::ItemHandle)s and answer positional
//! ("rank") queries, sibling/parent/child traversal and sorted or filtered
//! projections without materializing the item set. Rendering, layout and
//! input handling are left to the host GUI; it consumes handles and calls
//! the operations defined here.
//!
//! # Example
//!
//! ```
//! use hugetree::prelude::*;
//!
//! let tree: TreeModel<String> = TreeModel::new();
//! let docs = tree.append(None, "docs".to_string()).unwrap();
//! tree.append(Some(docs), "guide.md".to_string());
//! tree.append(None, "src".to_string());
//!
//! let mut states = TreeStates::new();
//! states.expand(tree.item(docs), true);
//!
//! // Ranks count visible items in depth-first order; the root is rank 0.
//! let second = tree.find_item(2, Some(&states), tree.root(), 0);
//! assert_eq!(tree.value(second, 0), ItemValue::from("guide.md"));
//! ```

pub use hugetree_core::*;

pub mod model;
pub mod prelude;
