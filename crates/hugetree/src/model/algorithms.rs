//! Default implementations of the derived [`ItemModel`] operations.
//!
//! Everything here is expressed purely in terms of the mandatory tier
//! (`parent`, `child_count`, `child`) plus whatever the model overrides,
//! since every call goes back through the trait. A model that overrides
//! `subtree_size` with a closed form therefore speeds up `find_item` and
//! `item_rank` without touching them.

use std::cmp::Ordering;

use hugetree_core::PerfSpan;
use hugetree_core::logging::targets;

use super::handle::ItemHandle;
use super::search::Matcher;
use super::traits::{ItemModel, LeveledItem, StateFilter};
use super::value::{ItemValue, SortSpec};

/// Whether the children of `item` are visible. The root always is.
#[inline]
pub(crate) fn is_expanded(filter: Option<&dyn StateFilter>, item: ItemHandle) -> bool {
    item.is_root_or_invalid() || filter.is_none_or(|f| f.is_expanded(item))
}

pub fn child_index<M: ItemModel + ?Sized>(
    model: &M,
    parent: ItemHandle,
    child: ItemHandle,
) -> Option<u32> {
    if !child.is_ok() {
        return None;
    }
    let count = model.child_count(parent);
    if let Some(hint) = child.child_index_hint()
        && hint < count
        && model.child(parent, hint) == child
    {
        return Some(hint);
    }
    (0..count).find(|&i| model.child(parent, i) == child)
}

pub fn depth<M: ItemModel + ?Sized>(model: &M, item: ItemHandle) -> usize {
    let mut depth = 0;
    let mut current = item;
    while current.is_ok() {
        current = model.parent(current);
        depth += 1;
    }
    if current.is_root() { depth } else { 0 }
}

pub fn next_sibling<M: ItemModel + ?Sized>(model: &M, item: ItemHandle) -> ItemHandle {
    let parent = model.parent(item);
    if parent.is_invalid() {
        return ItemHandle::invalid();
    }
    match model.child_index(parent, item) {
        Some(index) if index + 1 < model.child_count(parent) => model.child(parent, index + 1),
        _ => ItemHandle::invalid(),
    }
}

pub fn prev_sibling<M: ItemModel + ?Sized>(model: &M, item: ItemHandle) -> ItemHandle {
    let parent = model.parent(item);
    if parent.is_invalid() {
        return ItemHandle::invalid();
    }
    match model.child_index(parent, item) {
        Some(index) if index > 0 => model.child(parent, index - 1),
        _ => ItemHandle::invalid(),
    }
}

pub fn first_descendant<M: ItemModel + ?Sized>(
    model: &M,
    item: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> ItemHandle {
    if item.is_invalid() || !is_expanded(filter, item) {
        return ItemHandle::invalid();
    }
    model.first_child(item)
}

pub fn last_descendant<M: ItemModel + ?Sized>(
    model: &M,
    item: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> ItemHandle {
    let (last, extra) = deepest_last(model, item, filter);
    if extra == 0 { ItemHandle::invalid() } else { last }
}

/// Follows last visible children down from `item`; returns the final item
/// and how many levels were descended.
fn deepest_last<M: ItemModel + ?Sized>(
    model: &M,
    item: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> (ItemHandle, usize) {
    let mut current = item;
    let mut levels = 0;
    if current.is_invalid() {
        return (current, 0);
    }
    while is_expanded(filter, current) {
        let last = model.last_child(current);
        if last.is_invalid() {
            break;
        }
        current = last;
        levels += 1;
    }
    (current, levels)
}

pub fn is_ancestor_of<M: ItemModel + ?Sized>(
    model: &M,
    ancestor: ItemHandle,
    item: ItemHandle,
) -> bool {
    if ancestor.is_invalid() || !item.is_ok() {
        return false;
    }
    let mut current = model.parent(item);
    while !current.is_invalid() {
        if current == ancestor {
            return true;
        }
        if current.is_root() {
            break;
        }
        current = model.parent(current);
    }
    false
}

pub fn next_item_at<M: ItemModel + ?Sized>(
    model: &M,
    start: LeveledItem,
    filter: Option<&dyn StateFilter>,
    count: u64,
) -> LeveledItem {
    let mut current = start;
    for _ in 0..count {
        if current.item.is_invalid() {
            return LeveledItem::invalid();
        }

        if is_expanded(filter, current.item) {
            let first = model.first_child(current.item);
            if !first.is_invalid() {
                current = LeveledItem::new(first, current.level + 1);
                continue;
            }
        }

        // Climb until some ancestor-or-self has a next sibling.
        let mut node = current.item;
        let mut level = current.level;
        loop {
            if node.is_root_or_invalid() {
                return LeveledItem::invalid();
            }
            let sibling = model.next_sibling(node);
            if !sibling.is_invalid() {
                current = LeveledItem::new(sibling, level);
                break;
            }
            node = model.parent(node);
            level = level.saturating_sub(1);
        }
    }
    current
}

pub fn prev_item_at<M: ItemModel + ?Sized>(
    model: &M,
    start: LeveledItem,
    filter: Option<&dyn StateFilter>,
    count: u64,
) -> LeveledItem {
    let mut current = start;
    for _ in 0..count {
        if current.item.is_root_or_invalid() {
            return LeveledItem::invalid();
        }

        let sibling = model.prev_sibling(current.item);
        if sibling.is_invalid() {
            let parent = model.parent(current.item);
            if parent.is_invalid() {
                return LeveledItem::invalid();
            }
            current = LeveledItem::new(parent, current.level.saturating_sub(1));
        } else {
            let (last, extra) = deepest_last(model, sibling, filter);
            current = LeveledItem::new(last, current.level + extra);
        }
    }
    current
}

pub fn subtree_size<M: ItemModel + ?Sized>(
    model: &M,
    item: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> u64 {
    if item.is_invalid() {
        return 0;
    }
    let mut size = 0u64;
    let mut stack = vec![item];
    while let Some(node) = stack.pop() {
        size += 1;
        if is_expanded(filter, node) {
            let count = model.child_count(node);
            stack.extend((0..count).rev().map(|i| model.child(node, i)));
        }
    }
    size
}

/// The first item in pre-order that is not inside the subtree of `item`.
fn after_subtree<M: ItemModel + ?Sized>(model: &M, item: ItemHandle) -> ItemHandle {
    let mut node = item;
    while !node.is_root_or_invalid() {
        let sibling = model.next_sibling(node);
        if !sibling.is_invalid() {
            return sibling;
        }
        node = model.parent(node);
    }
    ItemHandle::invalid()
}

pub fn find_item<M: ItemModel + ?Sized>(
    model: &M,
    rank: u64,
    filter: Option<&dyn StateFilter>,
    start: ItemHandle,
    start_rank: u64,
) -> ItemHandle {
    let _perf = PerfSpan::new("find_item");

    let (mut current, mut offset) = if !start.is_invalid() && start_rank <= rank {
        (start, rank - start_rank)
    } else {
        (model.root(), rank)
    };

    loop {
        if current.is_invalid() {
            tracing::trace!(target: targets::MODEL, rank, "rank past the last visible item");
            return ItemHandle::invalid();
        }
        if offset == 0 {
            return current;
        }

        let size = model.subtree_size(current, filter);
        if offset >= size {
            offset -= size;
            current = after_subtree(model, current);
            continue;
        }

        // The target lies strictly inside this subtree.
        offset -= 1;
        let count = model.child_count(current);
        let mut descended = false;
        for i in 0..count {
            let child = model.child(current, i);
            let child_size = model.subtree_size(child, filter);
            if offset < child_size {
                current = child;
                descended = true;
                break;
            }
            offset -= child_size;
        }
        if !descended {
            // Subtree size disagrees with the children; treat as a contract violation.
            tracing::trace!(target: targets::MODEL, ?current, "inconsistent subtree size");
            return ItemHandle::invalid();
        }
    }
}

pub fn item_rank<M: ItemModel + ?Sized>(
    model: &M,
    item: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> Option<u64> {
    if item.is_invalid() {
        return None;
    }
    if item.is_root() {
        return Some(0);
    }

    let mut rank = 0u64;
    let mut node = item;
    loop {
        let parent = model.parent(node);
        if parent.is_invalid() || !is_expanded(filter, parent) {
            return None;
        }
        let index = model.child_index(parent, node)?;
        for i in 0..index {
            rank += model.subtree_size(model.child(parent, i), filter);
        }
        rank += 1;
        if parent.is_root() {
            return Some(rank);
        }
        node = parent;
    }
}

pub fn find_next<M: ItemModel + ?Sized>(
    model: &M,
    matcher: &Matcher,
    from: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> ItemHandle {
    let mut current = model.next_item(from, filter);
    while !current.is_invalid() {
        if matcher.matches(model, current) {
            return current;
        }
        current = model.next_item(current, filter);
    }
    ItemHandle::invalid()
}

pub fn find_prev<M: ItemModel + ?Sized>(
    model: &M,
    matcher: &Matcher,
    from: ItemHandle,
    filter: Option<&dyn StateFilter>,
) -> ItemHandle {
    let mut current = model.prev_item(from, filter);
    while current.is_ok() {
        if matcher.matches(model, current) {
            return current;
        }
        current = model.prev_item(current, filter);
    }
    ItemHandle::invalid()
}

pub fn compare<M: ItemModel + ?Sized>(
    model: &M,
    a: ItemHandle,
    b: ItemHandle,
    spec: &SortSpec,
) -> Ordering {
    for key in &spec.keys {
        let ordering = model.value(a, key.field).compare(&model.value(b, key.field));
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
}

pub fn for_each_value<M: ItemModel + ?Sized>(
    model: &M,
    field: u32,
    filter: Option<&dyn StateFilter>,
    f: &mut dyn FnMut(&ItemValue),
) {
    let _perf = PerfSpan::new("for_each_value");
    let mut current = model.next_item(model.root(), filter);
    while !current.is_invalid() {
        if field < model.field_count(current).scan_count() {
            let value = model.value(current, field);
            if value.is_some() {
                f(&value);
            }
        }
        current = model.next_item(current, filter);
    }
}
