//! Property-based laws for navigation over arbitrary tree shapes.
//!
//! 1. `parent(child(p, i)) == p` for every child.
//! 2. `next_item` and `prev_item` are inverse away from the ends.
//! 3. `find_item(item_rank(h)) == h` for every visible item.
//! 4. `subtree_size(root) == item count + 1`.
//! 5. Handles compare and hash equal across proxy layers.
//! 6. Tree paths round-trip through models and through text.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use hugetree::model::{
    ItemHandle, ItemModel, ItemValue, ListModel, NodeKey, ProxyModel, SortProxyModel, SortSpec,
    StateFilter, StateTracker, TreeModel, TreePath, TreeStates, VirtualSource,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Parent indices for nodes 1..=n; node 0 is the model root. Each node's
/// parent precedes it, so any vector describes a valid tree.
fn shape() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<prop::sample::Index>(), 1..60).prop_map(|picks| {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| pick.index(i + 1))
            .collect()
    })
}

fn shape_with_expansion() -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
    shape().prop_flat_map(|parents| {
        let n = parents.len();
        (Just(parents), prop::collection::vec(any::<bool>(), n))
    })
}

fn build(parents: &[usize]) -> (TreeModel<String>, Vec<NodeKey>) {
    let tree = TreeModel::new();
    let mut keys: Vec<NodeKey> = Vec::with_capacity(parents.len());
    for (i, &parent) in parents.iter().enumerate() {
        let parent_key = parent.checked_sub(1).map(|p| keys[p]);
        let key = tree
            .append(parent_key, format!("n{}", (i * 7919) % 97))
            .expect("parent exists");
        keys.push(key);
    }
    (tree, keys)
}

fn visible<M: ItemModel + ?Sized>(model: &M, filter: Option<&dyn StateFilter>) -> Vec<ItemHandle> {
    let mut items = Vec::new();
    let mut item = model.next_item(model.root(), filter);
    while !item.is_invalid() {
        items.push(item);
        item = model.next_item(item, filter);
    }
    items
}

fn states_for(tree: &TreeModel<String>, keys: &[NodeKey], expanded: &[bool]) -> TreeStates {
    let mut states = TreeStates::new();
    for (key, &on) in keys.iter().zip(expanded) {
        states.expand(tree.item(*key), on);
    }
    states
}

// ── Laws ────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn parent_of_child_is_parent(parents in shape()) {
        let (tree, keys) = build(&parents);
        let mut parents_to_check = vec![tree.root()];
        parents_to_check.extend(keys.iter().map(|&k| tree.item(k)));
        for parent in parents_to_check {
            for i in 0..tree.child_count(parent) {
                let child = tree.child(parent, i);
                prop_assert_eq!(tree.parent(child), parent);
                prop_assert_eq!(tree.child_index(parent, child), Some(i));
            }
        }
    }

    #[test]
    fn next_and_prev_are_inverse((parents, expanded) in shape_with_expansion()) {
        let (tree, keys) = build(&parents);
        let states = states_for(&tree, &keys, &expanded);
        let filter: Option<&dyn StateFilter> = Some(&states);

        let items = visible(&tree, filter);
        for pair in items.windows(2) {
            prop_assert_eq!(tree.next_item(pair[0], filter), pair[1]);
            prop_assert_eq!(tree.prev_item(pair[1], filter), pair[0]);
        }
        if let Some(&first) = items.first() {
            prop_assert!(tree.prev_item(first, filter).is_root());
        }
        if let Some(&last) = items.last() {
            prop_assert!(tree.next_item(last, filter).is_invalid());
        }
    }

    #[test]
    fn rank_round_trip((parents, expanded) in shape_with_expansion()) {
        let (tree, keys) = build(&parents);
        let states = states_for(&tree, &keys, &expanded);
        let filter: Option<&dyn StateFilter> = Some(&states);

        let items = visible(&tree, filter);
        for (i, &item) in items.iter().enumerate() {
            let rank = tree.item_rank(item, filter);
            prop_assert_eq!(rank, Some(i as u64 + 1));
            prop_assert_eq!(tree.find_item(i as u64 + 1, filter, ItemHandle::invalid(), 0), item);
        }
        prop_assert_eq!(tree.subtree_size(tree.root(), filter), items.len() as u64 + 1);
    }

    #[test]
    fn subtree_size_counts_everything(parents in shape()) {
        let (tree, _) = build(&parents);
        prop_assert_eq!(tree.subtree_size(tree.root(), None), parents.len() as u64 + 1);
        prop_assert_eq!(visible(&tree, None).len(), parents.len());
    }

    #[test]
    fn handles_equal_across_proxies(parents in shape()) {
        let (tree, _) = build(&parents);
        let expected = visible(&tree, None);
        let proxy = ProxyModel::with_master(Box::new(tree));
        let hasher = RandomState::new();

        let seen = visible(&proxy, None);
        prop_assert_eq!(seen.len(), expected.len());
        for (a, b) in expected.iter().zip(&seen) {
            prop_assert_ne!(a.model(), b.model());
            prop_assert_eq!(a, b);
            prop_assert_eq!(hasher.hash_one(a), hasher.hash_one(b));
        }
    }

    #[test]
    fn sorting_keeps_the_item_set(parents in shape(), descending in any::<bool>()) {
        let (tree, _) = build(&parents);
        let mut expected = visible(&tree, None);
        let proxy = SortProxyModel::with_master(Box::new(tree));
        proxy.sort(&SortSpec::by(0, descending));

        let mut seen = visible(&proxy, None);
        prop_assert_eq!(proxy.subtree_size(proxy.root(), None), expected.len() as u64 + 1);
        for item in &seen {
            let parent = proxy.parent(*item);
            let index = proxy.child_index(parent, *item);
            prop_assert!(index.is_some());
            if let Some(prev) = index.and_then(|i| i.checked_sub(1)) {
                let ordering = proxy
                    .value(proxy.child(parent, prev), 0)
                    .compare(&proxy.value(*item, 0));
                let ordering = if descending { ordering.reverse() } else { ordering };
                prop_assert!(ordering.is_le());
            }
        }
        expected.sort();
        seen.sort();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn tree_paths_round_trip(parents in shape()) {
        let (tree, keys) = build(&parents);
        for key in keys {
            let item = tree.item(key);
            let path = TreePath::build(&tree, item).expect("reachable item");
            prop_assert_eq!(path.depth(), tree.depth(item));
            prop_assert_eq!(path.resolve(&tree), item);

            let reparsed: TreePath = path.to_string().parse().expect("own text form");
            prop_assert_eq!(reparsed, path);
        }
    }

    #[test]
    fn list_arithmetic_matches_ranks(len in 1u32..5_000, row in any::<prop::sample::Index>()) {
        let list = ListModel::new(VirtualSource::new(len, 1, |row, _| ItemValue::from(row)));
        let row = row.index(len as usize) as u32;
        let item = list.item(row);

        prop_assert_eq!(list.item_rank(item, None), Some(u64::from(row) + 1));
        prop_assert_eq!(list.find_item(u64::from(row) + 1, None, ItemHandle::invalid(), 0), item);
        let next = list.next_item(item, None);
        if row + 1 < len {
            prop_assert_eq!(next, list.item(row + 1));
            prop_assert_eq!(list.prev_item(next, None), item);
        } else {
            prop_assert!(next.is_invalid());
        }
    }
}
