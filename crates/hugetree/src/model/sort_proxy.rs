//! Sorting proxy.
//!
//! Presents the master's children re-ordered by a [`SortSpec`] without
//! touching the master. Sorting is stable, so items that compare equal keep
//! the master's order, and an empty spec shows the master order unchanged.

use parking_lot::RwLock;

use super::array_proxy::{ArrayProxyModel, ChildrenHook};
use super::handle::ItemHandle;
use super::traits::ItemModel;
use super::value::SortSpec;

/// Orders children by the master's [`compare`](ItemModel::compare).
#[derive(Debug, Default)]
pub struct SortChildren {
    spec: RwLock<Option<SortSpec>>,
}

impl SortChildren {
    pub fn new(spec: SortSpec) -> Self {
        Self {
            spec: RwLock::new(Some(spec)),
        }
    }
}

impl ChildrenHook for SortChildren {
    fn collect_children(&self, master: &dyn ItemModel, parent: ItemHandle, out: &mut Vec<ItemHandle>) {
        let count = master.child_count(parent);
        out.reserve(count as usize);
        out.extend((0..count).map(|i| master.child(parent, i)));

        if let Some(spec) = self.spec.read().as_ref().filter(|s| !s.is_empty()) {
            out.sort_by(|&a, &b| master.compare(a, b, spec));
        }
    }

    fn can_sort(&self, _spec: &SortSpec) -> bool {
        true
    }

    fn set_sort(&self, spec: &SortSpec) -> bool {
        *self.spec.write() = Some(spec.clone());
        true
    }

    fn reset_sort(&self) -> bool {
        *self.spec.write() = None;
        true
    }

    fn sort_spec(&self) -> Option<SortSpec> {
        self.spec.read().clone()
    }
}

/// A proxy that sorts its master's children.
///
/// # Example
///
/// ```
/// use hugetree::model::{ItemModel, ItemValue, ListModel, SortProxyModel, SortSpec, VecSource};
///
/// let list = ListModel::new(VecSource::with_extractor(vec![3u64, 1, 2], 1, |n: &u64, _| {
///     ItemValue::UInt(*n)
/// }));
/// let proxy = SortProxyModel::with_master(Box::new(list));
/// proxy.sort(&SortSpec::by(0, true));
///
/// let first = proxy.child(proxy.root(), 0);
/// assert_eq!(proxy.value(first, 0), ItemValue::UInt(3));
/// ```
pub type SortProxyModel = ArrayProxyModel<SortChildren>;

impl ArrayProxyModel<SortChildren> {
    /// The order currently applied, if any.
    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.hook().sort_spec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemValue, ListModel, TreeModel, VecSource};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone)]
    struct Person {
        name: &'static str,
        age: u64,
    }

    fn people() -> ListModel<VecSource<Person>> {
        let items = vec![
            Person { name: "Carol", age: 30 },
            Person { name: "alice", age: 25 },
            Person { name: "Bob", age: 30 },
        ];
        ListModel::new(VecSource::with_extractor(items, 2, |p: &Person, field| match field {
            0 => ItemValue::from(p.name),
            _ => ItemValue::UInt(p.age),
        }))
    }

    fn names(proxy: &SortProxyModel) -> Vec<String> {
        let root = proxy.root();
        (0..proxy.child_count(root))
            .map(|i| proxy.value(proxy.child(root, i), 0).to_string())
            .collect()
    }

    #[test]
    fn test_unsorted_keeps_master_order() {
        let proxy = SortProxyModel::with_master(Box::new(people()));
        assert_eq!(names(&proxy), ["Carol", "alice", "Bob"]);
        assert_eq!(proxy.sort_spec(), None);
    }

    #[test]
    fn test_sort_and_reset() {
        let proxy = SortProxyModel::with_master(Box::new(people()));
        let layouts = Arc::new(Mutex::new(0));
        let recv = layouts.clone();
        proxy.signals().layout_changed.connect(move |_| *recv.lock() += 1);

        names(&proxy);
        assert!(proxy.can_sort(&SortSpec::by(0, false)));
        assert!(proxy.sort(&SortSpec::by(1, false).then_by(0, true)));
        assert_eq!(names(&proxy), ["alice", "Carol", "Bob"]);

        proxy.reset_sorting();
        assert_eq!(names(&proxy), ["Carol", "alice", "Bob"]);
        assert_eq!(*layouts.lock(), 2);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let proxy = SortProxyModel::with_master(Box::new(people()));
        proxy.sort(&SortSpec::by(1, true));
        assert_eq!(names(&proxy), ["Carol", "Bob", "alice"]);
    }

    #[test]
    fn test_sort_invalidates_cached_children() {
        let proxy = SortProxyModel::with_master(Box::new(people()));
        names(&proxy);
        let misses = proxy.cache_stats().misses;
        proxy.sort(&SortSpec::by(1, false));
        names(&proxy);
        assert_eq!(proxy.cache_stats().misses, misses + 1);
    }

    #[test]
    fn test_sorted_tree_ranks() {
        let tree: TreeModel<String> = TreeModel::new();
        let b = tree.append(None, "b".to_string()).unwrap();
        tree.append(Some(b), "b2".to_string());
        tree.append(Some(b), "b1".to_string());
        tree.append(None, "a".to_string());

        let proxy = SortProxyModel::with_master(Box::new(tree));
        proxy.sort(&SortSpec::by(0, false));

        let order: Vec<String> = (1..=4)
            .map(|rank| {
                let item = proxy.find_item(rank, None, ItemHandle::invalid(), 0);
                proxy.value(item, 0).to_string()
            })
            .collect();
        assert_eq!(order, ["a", "b", "b1", "b2"]);

        let b1 = proxy.find_item(3, None, ItemHandle::invalid(), 0);
        assert_eq!(proxy.item_rank(b1, None), Some(3));
        assert_eq!(proxy.prev_item(b1, None), proxy.find_item(2, None, ItemHandle::invalid(), 0));
    }
}
