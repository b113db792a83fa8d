//! End-to-end navigation over a synthetic three-level tree with a
//! 10 / 10 000 / 10 fan-out (1 100 010 items), none of which are stored.

use std::sync::atomic::{AtomicU64, Ordering};

use hugetree::model::{
    ItemHandle, ItemModel, ItemValue, ModelBase, SearchOptions, StateFilter, StateTracker,
    TreePath, TreeStates,
};

const L1: u64 = 10;
const L2: u64 = 10_000;
const L3: u64 = 10;

const BASE1: u64 = 1;
const BASE2: u64 = BASE1 + L1;
const BASE3: u64 = BASE2 + L1 * L2;

const SIZE2: u64 = 1 + L3;
const SIZE1: u64 = 1 + L2 * SIZE2;
const TOTAL: u64 = 1 + L1 * SIZE1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Root,
    Level1(u64),
    Level2(u64, u64),
    Level3(u64, u64, u64),
}

/// Items are decoded from their id; the tree answers subtree sizes in closed
/// form and counts the mandatory calls made below a watched level-1 node.
struct Synthetic {
    base: ModelBase,
    watched: u64,
    watched_calls: AtomicU64,
}

impl Synthetic {
    fn new(watched: u64) -> Self {
        Self {
            base: ModelBase::new(),
            watched,
            watched_calls: AtomicU64::new(0),
        }
    }

    fn handle(&self, node: Node) -> ItemHandle {
        let (id, index) = match node {
            Node::Root => return self.root(),
            Node::Level1(a) => (BASE1 + a, a),
            Node::Level2(a, b) => (BASE2 + a * L2 + b, b),
            Node::Level3(a, b, c) => (BASE3 + (a * L2 + b) * L3 + c, c),
        };
        ItemHandle::new(id, 0, 0, self.id()).with_child_index(index as u32)
    }

    fn node(&self, item: ItemHandle) -> Option<Node> {
        if item.is_root() {
            return Some(Node::Root);
        }
        if !item.is_ok() {
            return None;
        }
        let id = item.id();
        if id < BASE2 {
            Some(Node::Level1(id - BASE1))
        } else if id < BASE3 {
            let n = id - BASE2;
            Some(Node::Level2(n / L2, n % L2))
        } else if id < BASE3 + L1 * L2 * L3 {
            let n = id - BASE3;
            Some(Node::Level3(n / (L2 * L3), (n / L3) % L2, n % L3))
        } else {
            None
        }
    }

    fn watch(&self, node: Node) {
        let a = match node {
            Node::Level1(a) | Node::Level2(a, _) | Node::Level3(a, _, _) => a,
            Node::Root => return,
        };
        if a == self.watched {
            self.watched_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn watched_calls(&self) -> u64 {
        self.watched_calls.load(Ordering::Relaxed)
    }

    fn expanded(&self, filter: Option<&dyn StateFilter>, item: ItemHandle) -> bool {
        item.is_root() || filter.is_none_or(|f| f.is_expanded(item))
    }
}

impl ItemModel for Synthetic {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn parent(&self, item: ItemHandle) -> ItemHandle {
        match self.node(item) {
            None | Some(Node::Root) => ItemHandle::invalid(),
            Some(Node::Level1(_)) => self.root(),
            Some(Node::Level2(a, _)) => self.handle(Node::Level1(a)),
            Some(Node::Level3(a, b, _)) => self.handle(Node::Level2(a, b)),
        }
    }

    fn child_count(&self, item: ItemHandle) -> u32 {
        let Some(node) = self.node(item) else {
            return 0;
        };
        self.watch(node);
        match node {
            Node::Root => L1 as u32,
            Node::Level1(_) => L2 as u32,
            Node::Level2(..) => L3 as u32,
            Node::Level3(..) => 0,
        }
    }

    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle {
        let i = u64::from(index);
        let Some(node) = self.node(parent) else {
            return ItemHandle::invalid();
        };
        self.watch(node);
        match node {
            Node::Root if i < L1 => self.handle(Node::Level1(i)),
            Node::Level1(a) if i < L2 => self.handle(Node::Level2(a, i)),
            Node::Level2(a, b) if i < L3 => self.handle(Node::Level3(a, b, i)),
            _ => ItemHandle::invalid(),
        }
    }

    fn value(&self, item: ItemHandle, _field: u32) -> ItemValue {
        match self.node(item) {
            Some(Node::Level1(a)) => ItemValue::from(format!("{a}")),
            Some(Node::Level2(a, b)) => ItemValue::from(format!("{a}.{b}")),
            Some(Node::Level3(a, b, c)) => ItemValue::from(format!("{a}.{b}.{c}")),
            _ => ItemValue::None,
        }
    }

    fn child_index(&self, parent: ItemHandle, child: ItemHandle) -> Option<u32> {
        let index = match self.node(child)? {
            Node::Root => return None,
            Node::Level1(a) => a,
            Node::Level2(_, b) => b,
            Node::Level3(_, _, c) => c,
        };
        (self.parent(child) == parent).then_some(index as u32)
    }

    fn subtree_size(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> u64 {
        let Some(node) = self.node(item) else {
            return 0;
        };
        if !self.expanded(filter, item) {
            return 1;
        }
        match (node, filter) {
            (Node::Level3(..), _) => 1,
            (Node::Level2(..), _) => SIZE2,
            (Node::Level1(_), None) => SIZE1,
            (Node::Root, None) => TOTAL,
            (Node::Level1(a), Some(_)) => {
                1 + (0..L2)
                    .map(|b| self.subtree_size(self.handle(Node::Level2(a, b)), filter))
                    .sum::<u64>()
            }
            (Node::Root, Some(_)) => {
                1 + (0..L1)
                    .map(|a| self.subtree_size(self.handle(Node::Level1(a)), filter))
                    .sum::<u64>()
            }
        }
    }
}

fn rank_of(node: Node) -> u64 {
    match node {
        Node::Root => 0,
        Node::Level1(a) => 1 + a * SIZE1,
        Node::Level2(a, b) => rank_of(Node::Level1(a)) + 1 + b * SIZE2,
        Node::Level3(a, b, c) => rank_of(Node::Level2(a, b)) + 1 + c,
    }
}

#[test]
fn test_total_size() {
    let tree = Synthetic::new(u64::MAX);
    assert_eq!(tree.subtree_size(tree.root(), None), 1 + 10 * (1 + 10_000 * (1 + 10)));
    assert_eq!(TOTAL, 1_100_011);
}

#[test]
fn test_find_item_at_level_boundaries() {
    let tree = Synthetic::new(u64::MAX);
    let boundaries = [
        Node::Level1(0),
        Node::Level3(0, 0, 0),
        Node::Level3(0, 0, 9),
        Node::Level2(0, 1),
        Node::Level3(0, 9_999, 9),
        Node::Level1(1),
        Node::Level2(4, 9_999),
        Node::Level1(9),
        Node::Level3(9, 9_999, 9),
    ];
    for node in boundaries {
        let rank = rank_of(node);
        let item = tree.find_item(rank, None, ItemHandle::invalid(), 0);
        assert_eq!(item, tree.handle(node), "rank {rank}");
        assert_eq!(tree.item_rank(item, None), Some(rank), "{node:?}");
    }
    assert!(tree.find_item(TOTAL, None, ItemHandle::invalid(), 0).is_invalid());
    assert_eq!(
        tree.find_item(TOTAL - 1, None, ItemHandle::invalid(), 0),
        tree.handle(Node::Level3(9, 9_999, 9))
    );
}

#[test]
fn test_find_item_from_hint() {
    let tree = Synthetic::new(u64::MAX);
    let start = tree.handle(Node::Level2(2, 500));
    let target = Node::Level3(2, 700, 3);
    let item = tree.find_item(rank_of(target), None, start, rank_of(Node::Level2(2, 500)));
    assert_eq!(item, tree.handle(target));
}

#[test]
fn test_collapsed_level1_is_skipped() {
    let tree = Synthetic::new(3);
    let collapsed = tree.handle(Node::Level1(3));
    let filter = move |item: ItemHandle| item != collapsed;

    assert_eq!(tree.subtree_size(collapsed, Some(&filter)), 1);
    assert_eq!(tree.subtree_size(tree.root(), Some(&filter)), TOTAL - (SIZE1 - 1));

    // Ranks after the collapsed node shift by its hidden 110 000 descendants.
    let hidden = SIZE1 - 1;
    let after = Node::Level3(5, 42, 7);
    let item = tree.find_item(rank_of(after) - hidden, Some(&filter), ItemHandle::invalid(), 0);
    assert_eq!(item, tree.handle(after));

    let next = tree.find_item(rank_of(Node::Level1(3)) + 1, Some(&filter), ItemHandle::invalid(), 0);
    assert_eq!(next, tree.handle(Node::Level1(4)));
    assert_eq!(tree.next_item(collapsed, Some(&filter)), next);
    assert_eq!(tree.prev_item(next, Some(&filter)), collapsed);

    // Nothing below the collapsed node was ever asked for.
    assert_eq!(tree.watched_calls(), 0);
}

#[test]
fn test_traversal_across_boundaries() {
    let tree = Synthetic::new(u64::MAX);
    let last_of_first = tree.handle(Node::Level3(0, 9_999, 9));
    let next = tree.next_item(last_of_first, None);
    assert_eq!(next, tree.handle(Node::Level1(1)));
    assert_eq!(tree.prev_item(next, None), last_of_first);
    assert_eq!(tree.depth(last_of_first), 3);
    assert!(tree.next_item(tree.handle(Node::Level3(9, 9_999, 9)), None).is_invalid());
    assert!(tree.prev_item(tree.handle(Node::Level1(0)), None).is_root());
}

#[test]
fn test_tree_states_drive_visibility() {
    let tree = Synthetic::new(u64::MAX);
    let mut states = TreeStates::new();
    assert_eq!(tree.subtree_size(tree.root(), Some(&states)), 1 + L1);

    states.expand(tree.handle(Node::Level1(2)), true);
    assert_eq!(tree.subtree_size(tree.root(), Some(&states)), 1 + L1 + L2);
    let item = tree.find_item(4, Some(&states), ItemHandle::invalid(), 0);
    assert_eq!(item, tree.handle(Node::Level2(2, 0)));
}

#[test]
fn test_search_and_paths() {
    let tree = Synthetic::new(u64::MAX);
    let matcher = SearchOptions::new("0.3.4").exact(true).compile().unwrap();
    let found = tree.find_first(&matcher, None);
    assert_eq!(found, tree.handle(Node::Level3(0, 3, 4)));

    let path = TreePath::build(&tree, found).unwrap();
    assert_eq!(path.to_string(), "0/3/4");
    assert_eq!(path.resolve(&tree), found);
}
