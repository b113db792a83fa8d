//! Editable in-memory tree model.
//!
//! `TreeModel` stores nodes in a slotmap arena. Each node remembers its
//! parent and its position among its siblings, so `parent`, `child` and
//! `child_index` are all O(1); the remaining derived operations use the
//! generic defaults.
//!
//! Handles carry the arena key as their id and leave `row` at zero, so a
//! handle keeps comparing equal to itself when earlier siblings are
//! inserted or removed. The sibling position travels in the child index
//! hint instead.

use std::cmp::Ordering;

use parking_lot::RwLock;
use slotmap::{Key, KeyData, SlotMap, new_key_type};

use super::handle::ItemHandle;
use super::traits::{ItemModel, ModelBase};
use super::value::{FieldCount, ItemValue, SortSpec};

new_key_type! {
    /// Identifies a node of a [`TreeModel`].
    pub struct NodeKey;
}

/// Trait for tree node data that provides its own field values.
pub trait NodeData: Send + Sync {
    fn field_count(&self) -> u32 {
        1
    }

    fn value(&self, field: u32) -> ItemValue;

    /// Stores a value. The default is read-only.
    fn set_value(&mut self, _field: u32, _value: ItemValue) -> bool {
        false
    }

    /// Whether this node is a group row spanning every column.
    fn spans_all(&self) -> bool {
        false
    }
}

/// Implement NodeData for String for convenience.
impl NodeData for String {
    fn value(&self, field: u32) -> ItemValue {
        match field {
            0 => ItemValue::from(self.as_str()),
            _ => ItemValue::None,
        }
    }

    fn set_value(&mut self, field: u32, value: ItemValue) -> bool {
        match (field, value) {
            (0, ItemValue::String(s)) => {
                *self = s;
                true
            }
            _ => false,
        }
    }
}

struct TreeNode<T> {
    data: T,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    index: u32,
    /// Insertion sequence, restores the intrinsic order after sorting.
    seq: u64,
}

struct TreeStorage<T> {
    nodes: SlotMap<NodeKey, TreeNode<T>>,
    roots: Vec<NodeKey>,
    next_seq: u64,
}

impl<T> TreeStorage<T> {
    fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            next_seq: 0,
        }
    }

    fn children_of(&self, parent: Option<NodeKey>) -> Option<&Vec<NodeKey>> {
        match parent {
            None => Some(&self.roots),
            Some(key) => self.nodes.get(key).map(|n| &n.children),
        }
    }

    fn children_of_mut(&mut self, parent: Option<NodeKey>) -> Option<&mut Vec<NodeKey>> {
        match parent {
            None => Some(&mut self.roots),
            Some(key) => self.nodes.get_mut(key).map(|n| &mut n.children),
        }
    }

    fn insert(&mut self, parent: Option<NodeKey>, index: usize, data: T) -> Option<NodeKey> {
        let len = self.children_of(parent)?.len();
        let index = index.min(len);
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = self.nodes.insert(TreeNode {
            data,
            parent,
            children: Vec::new(),
            index: 0,
            seq,
        });
        self.children_of_mut(parent)?.insert(index, key);
        self.reindex(parent, index);
        Some(key)
    }

    fn remove(&mut self, key: NodeKey) -> Option<T> {
        let node = self.nodes.get(key)?;
        let parent = node.parent;
        let index = node.index as usize;
        if let Some(siblings) = self.children_of_mut(parent) {
            siblings.remove(index);
        }
        self.reindex(parent, index);

        let node = self.nodes.remove(key)?;
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                stack.extend(removed.children);
            }
        }
        Some(node.data)
    }

    /// Refreshes the stored sibling positions from `from` onwards.
    fn reindex(&mut self, parent: Option<NodeKey>, from: usize) {
        let Some(children) = self.children_of(parent) else {
            return;
        };
        let tail: Vec<NodeKey> = children.iter().skip(from).copied().collect();
        for (offset, key) in tail.into_iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(key) {
                node.index = u32::try_from(from + offset).unwrap_or(u32::MAX);
            }
        }
    }

    fn reorder_all<F>(&mut self, mut compare: F)
    where
        F: FnMut(&TreeNode<T>, &TreeNode<T>) -> Ordering,
    {
        let mut parents: Vec<Option<NodeKey>> = vec![None];
        parents.extend(self.nodes.keys().map(Some));
        for parent in parents {
            let Some(children) = self.children_of(parent) else {
                continue;
            };
            let mut sorted = children.clone();
            sorted.sort_by(|&a, &b| match (self.nodes.get(a), self.nodes.get(b)) {
                (Some(a), Some(b)) => compare(a, b),
                _ => Ordering::Equal,
            });
            if let Some(children) = self.children_of_mut(parent) {
                *children = sorted;
            }
            self.reindex(parent, 0);
        }
    }
}

/// A hierarchical model for editable parent-child data.
///
/// # Example
///
/// ```
/// use hugetree::model::{ItemModel, ItemValue, TreeModel};
///
/// let model = TreeModel::<String>::new();
/// let docs = model.append(None, "Documents".to_string()).unwrap();
/// model.append(Some(docs), "file.txt".to_string());
///
/// let docs_item = model.item(docs);
/// assert_eq!(model.child_count(docs_item), 1);
/// assert_eq!(
///     model.value(model.first_child(docs_item), 0),
///     ItemValue::from("file.txt")
/// );
/// ```
pub struct TreeModel<T> {
    base: ModelBase,
    storage: RwLock<TreeStorage<T>>,
}

impl<T: NodeData + 'static> Default for TreeModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeData + 'static> TreeModel<T> {
    /// Creates a new empty tree model.
    pub fn new() -> Self {
        Self {
            base: ModelBase::new(),
            storage: RwLock::new(TreeStorage::new()),
        }
    }

    /// Appends a node under `parent` (`None` for a top-level node).
    ///
    /// Returns `None` if the parent doesn't exist.
    pub fn append(&self, parent: Option<NodeKey>, data: T) -> Option<NodeKey> {
        self.insert(parent, usize::MAX, data)
    }

    /// Inserts a node under `parent` at `index` (clamped to the end).
    pub fn insert(&self, parent: Option<NodeKey>, index: usize, data: T) -> Option<NodeKey> {
        let key = self.storage.write().insert(parent, index, data)?;
        self.base.signals().layout_changed.emit(());
        Some(key)
    }

    /// Removes a node and all its descendants.
    ///
    /// Returns the removed node's data, or `None` if the node doesn't exist.
    pub fn remove(&self, key: NodeKey) -> Option<T> {
        let data = self.storage.write().remove(key)?;
        self.base.signals().layout_changed.emit(());
        Some(data)
    }

    /// Clears all nodes from the tree.
    pub fn clear(&self) {
        self.base
            .signals()
            .emit_reset(|| *self.storage.write() = TreeStorage::new());
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.storage.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().nodes.is_empty()
    }

    /// Provides read access to a node's data.
    pub fn with_node<F, R>(&self, key: NodeKey, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.storage.read().nodes.get(key).map(|node| f(&node.data))
    }

    /// Provides mutable access to a node's data.
    ///
    /// Emits `data_changed` for field 0 after modification.
    pub fn modify_node<F, R>(&self, key: NodeKey, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let result = {
            let mut storage = self.storage.write();
            f(&mut storage.nodes.get_mut(key)?.data)
        };
        self.base.signals().data_changed.emit((self.item(key), 0));
        Some(result)
    }

    /// The handle for `key`, or invalid if the node doesn't exist.
    pub fn item(&self, key: NodeKey) -> ItemHandle {
        let storage = self.storage.read();
        match storage.nodes.get(key) {
            Some(node) => self.handle_for(key, node.index),
            None => ItemHandle::invalid(),
        }
    }

    /// The arena key addressed by `item`.
    pub fn key(&self, item: ItemHandle) -> Option<NodeKey> {
        if !item.is_ok() {
            return None;
        }
        let key = NodeKey::from(KeyData::from_ffi(item.id()));
        self.storage.read().nodes.contains_key(key).then_some(key)
    }

    fn handle_for(&self, key: NodeKey, index: u32) -> ItemHandle {
        ItemHandle::new(key.data().as_ffi(), 0, 0, self.id()).with_child_index(index)
    }

    /// Resolves `item` to an arena parent: `Some(None)` for the root.
    fn parent_key(&self, item: ItemHandle) -> Option<Option<NodeKey>> {
        if item.is_root() {
            Some(None)
        } else {
            self.key(item).map(Some)
        }
    }
}

impl<T: NodeData + 'static> ItemModel for TreeModel<T> {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn parent(&self, item: ItemHandle) -> ItemHandle {
        let Some(key) = self.key(item) else {
            return ItemHandle::invalid();
        };
        let storage = self.storage.read();
        match storage.nodes.get(key).and_then(|node| node.parent) {
            None => self.root(),
            Some(parent) => match storage.nodes.get(parent) {
                Some(node) => self.handle_for(parent, node.index),
                None => ItemHandle::invalid(),
            },
        }
    }

    fn child_count(&self, item: ItemHandle) -> u32 {
        let Some(parent) = self.parent_key(item) else {
            return 0;
        };
        let storage = self.storage.read();
        storage
            .children_of(parent)
            .map_or(0, |children| u32::try_from(children.len()).unwrap_or(u32::MAX))
    }

    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle {
        let Some(parent) = self.parent_key(parent) else {
            return ItemHandle::invalid();
        };
        let storage = self.storage.read();
        match storage
            .children_of(parent)
            .and_then(|children| children.get(index as usize))
        {
            Some(&key) => self.handle_for(key, index),
            None => ItemHandle::invalid(),
        }
    }

    fn child_index(&self, parent: ItemHandle, child: ItemHandle) -> Option<u32> {
        let parent = self.parent_key(parent)?;
        let key = self.key(child)?;
        let storage = self.storage.read();
        let node = storage.nodes.get(key)?;
        (node.parent == parent).then_some(node.index)
    }

    fn field_count(&self, item: ItemHandle) -> FieldCount {
        let Some(key) = self.key(item) else {
            return FieldCount::Fields(0);
        };
        let storage = self.storage.read();
        match storage.nodes.get(key) {
            Some(node) if node.data.spans_all() => FieldCount::SpanAll,
            Some(node) => FieldCount::Fields(node.data.field_count()),
            None => FieldCount::Fields(0),
        }
    }

    fn value(&self, item: ItemHandle, field: u32) -> ItemValue {
        self.key(item)
            .and_then(|key| self.with_node(key, |data| data.value(field)))
            .unwrap_or_default()
    }

    fn set_value(&self, item: ItemHandle, field: u32, value: ItemValue) -> bool {
        let Some(key) = self.key(item) else {
            return false;
        };
        let stored = {
            let mut storage = self.storage.write();
            storage
                .nodes
                .get_mut(key)
                .is_some_and(|node| node.data.set_value(field, value))
        };
        if stored {
            self.base.signals().data_changed.emit((item, field));
        }
        stored
    }

    fn can_sort(&self, _spec: &SortSpec) -> bool {
        true
    }

    fn sort(&self, spec: &SortSpec) -> bool {
        self.storage.write().reorder_all(|a, b| {
            for key in &spec.keys {
                let ordering = a.data.value(key.field).compare(&b.data.value(key.field));
                let ordering = if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        self.base.signals().layout_changed.emit(());
        true
    }

    fn reset_sorting(&self) {
        self.storage.write().reorder_all(|a, b| a.seq.cmp(&b.seq));
        self.base.signals().layout_changed.emit(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn build() -> (TreeModel<String>, NodeKey, NodeKey) {
        let model = TreeModel::new();
        let fruits = model.append(None, "Fruits".to_string()).unwrap();
        model.append(Some(fruits), "Cherry".to_string());
        model.append(Some(fruits), "Apple".to_string());
        let veg = model.append(None, "Vegetables".to_string()).unwrap();
        model.append(Some(veg), "Leek".to_string());
        (model, fruits, veg)
    }

    #[test]
    fn test_tree_model_basic() {
        let (model, fruits, _) = build();
        assert_eq!(model.len(), 5);
        assert_eq!(model.child_count(model.root()), 2);
        let item = model.item(fruits);
        assert!(item.is_ok());
        assert_eq!(model.value(item, 0), ItemValue::from("Fruits"));
        assert_eq!(model.value(item, 1), ItemValue::None);
        assert_eq!(model.key(item), Some(fruits));
    }

    #[test]
    fn test_tree_model_hierarchy() {
        let (model, fruits, veg) = build();
        let fruits_item = model.item(fruits);
        let apple = model.child(fruits_item, 1);
        assert_eq!(model.value(apple, 0), ItemValue::from("Apple"));
        assert_eq!(model.parent(apple), fruits_item);
        assert!(model.parent(fruits_item).is_root());
        assert_eq!(model.child_index(fruits_item, apple), Some(1));
        assert_eq!(model.child_index(model.item(veg), apple), None);
        assert_eq!(model.depth(apple), 2);
        assert_eq!(model.subtree_size(model.root(), None), 6);
    }

    #[test]
    fn test_tree_model_remove() {
        let (model, fruits, veg) = build();
        let veg_item = model.item(veg);
        assert_eq!(model.remove(fruits), Some("Fruits".to_string()));
        assert_eq!(model.len(), 2);
        assert_eq!(model.child_index(model.root(), veg_item), Some(0));
        // The handle survives the removal of an earlier sibling.
        assert_eq!(model.child(model.root(), 0), veg_item);
        assert!(model.item(fruits).is_invalid());
        assert!(model.remove(fruits).is_none());
    }

    #[test]
    fn test_tree_model_insert_at() {
        let (model, fruits, _) = build();
        let banana = model.insert(Some(fruits), 1, "Banana".to_string()).unwrap();
        let fruits_item = model.item(fruits);
        assert_eq!(model.child(fruits_item, 1), model.item(banana));
        assert_eq!(model.value(model.child(fruits_item, 2), 0), ItemValue::from("Apple"));
        assert!(model.insert(Some(NodeKey::null()), 0, "x".to_string()).is_none());
    }

    #[test]
    fn test_tree_model_clear() {
        let (model, _, _) = build();
        let reset = Arc::new(Mutex::new(false));
        let recv = reset.clone();
        model.signals().model_reset.connect(move |_| *recv.lock() = true);
        model.clear();
        assert!(model.is_empty());
        assert_eq!(model.child_count(model.root()), 0);
        assert!(*reset.lock());
    }

    #[test]
    fn test_tree_model_sort_and_reset() {
        let (model, fruits, _) = build();
        let fruits_item = model.item(fruits);
        assert!(model.can_sort(&SortSpec::by(0, false)));
        model.sort(&SortSpec::by(0, true));
        assert_eq!(
            model.value(model.first_child(model.root()), 0),
            ItemValue::from("Vegetables")
        );
        model.sort(&SortSpec::by(0, false));
        assert_eq!(model.value(model.child(fruits_item, 0), 0), ItemValue::from("Apple"));
        assert_eq!(model.child_index(fruits_item, model.child(fruits_item, 1)), Some(1));

        model.reset_sorting();
        assert_eq!(model.value(model.child(fruits_item, 0), 0), ItemValue::from("Cherry"));
    }

    #[test]
    fn test_tree_model_set_value() {
        let (model, fruits, _) = build();
        let item = model.item(fruits);
        let changed = Arc::new(Mutex::new(0));
        let recv = changed.clone();
        model.signals().data_changed.connect(move |_| *recv.lock() += 1);

        assert!(model.set_value(item, 0, ItemValue::from("Fruit")));
        assert!(!model.set_value(item, 0, ItemValue::Int(1)));
        model.modify_node(fruits, |s| s.push('s'));
        assert_eq!(model.value(item, 0), ItemValue::from("Fruits"));
        assert_eq!(*changed.lock(), 2);
    }
}
