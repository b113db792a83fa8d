//! Positional item paths.
//!
//! A [`TreePath`] records an item's position as the child index taken at
//! every level from the root down. Unlike an [`ItemHandle`] it can be
//! replayed against any model, for example after the model was rebuilt or
//! to remember a scroll position across sessions. Replaying is best effort:
//! if the model no longer has a child at some step the path resolves to the
//! invalid handle.
//!
//! ```
//! use hugetree::model::{ItemModel, TreeModel, TreePath};
//!
//! let tree: TreeModel<String> = TreeModel::new();
//! let a = tree.append(None, "a".to_string()).unwrap();
//! let b = tree.append(None, "b".to_string()).unwrap();
//! let b1 = tree.append(Some(b), "b1".to_string()).unwrap();
//!
//! let path = TreePath::build(&tree, tree.item(b1)).unwrap();
//! assert_eq!(path.to_string(), "1/0");
//!
//! tree.remove(a);
//! assert!(path.resolve(&tree).is_invalid());
//! ```

use std::fmt;
use std::str::FromStr;

use hugetree_core::logging::targets;
use hugetree_core::{Error, Result};
use smallvec::SmallVec;

use super::handle::ItemHandle;
use super::traits::ItemModel;

/// Paths up to this depth are stored without a heap allocation.
pub const INLINE_DEPTH: usize = 8;

/// Root-to-leaf child indices of an item. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TreePath(SmallVec<[u32; INLINE_DEPTH]>);

impl TreePath {
    /// The path of the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Records the position of `item` in `model`.
    ///
    /// Returns `None` for the invalid handle and for items whose ancestry
    /// does not lead back to the root.
    pub fn build<M: ItemModel + ?Sized>(model: &M, item: ItemHandle) -> Option<Self> {
        if item.is_invalid() {
            return None;
        }
        let mut indices = SmallVec::with_capacity(model.depth(item));
        let mut current = item;
        while current.is_ok() {
            let parent = model.parent(current);
            let Some(index) = model.child_index(parent, current) else {
                tracing::trace!(target: targets::PATH, ?current, "item not found under its parent");
                return None;
            };
            indices.push(index);
            current = parent;
        }
        if !current.is_root() {
            tracing::trace!(target: targets::PATH, ?item, "ancestry does not reach the root");
            return None;
        }
        indices.reverse();
        Some(Self(indices))
    }

    /// Replays this path from the root of `model`.
    pub fn resolve<M: ItemModel + ?Sized>(&self, model: &M) -> ItemHandle {
        let mut current = model.root();
        for (level, &index) in self.0.iter().enumerate() {
            if index >= model.child_count(current) {
                tracing::trace!(target: targets::PATH, path = %self, level, "path no longer resolves");
                return ItemHandle::invalid();
            }
            current = model.child(current, index);
        }
        current
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the indices live on the heap.
    pub fn spilled(&self) -> bool {
        self.0.spilled()
    }

    /// The path of the parent; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.iter().copied().collect()))
    }

    /// The path of the child at `index`.
    pub fn child(&self, index: u32) -> Self {
        let mut path = self.clone();
        path.0.push(index);
        path
    }
}

impl From<Vec<u32>> for TreePath {
    fn from(indices: Vec<u32>) -> Self {
        Self(SmallVec::from_vec(indices))
    }
}

impl FromIterator<u32> for TreePath {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = Error;

    /// Parses the `"0/3/17"` form; the empty string is the root.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split('/')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|err| Error::invalid_tree_path(s, format!("segment '{part}': {err}")))
            })
            .collect()
    }
}
