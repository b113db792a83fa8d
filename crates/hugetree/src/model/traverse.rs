//! Subtree walks used by bulk state operations.
//!
//! Both walks visit `item` first and then its whole subtree in depth-first
//! pre-order, regardless of expansion state. [`traverse_recursive`] uses the
//! call stack and can overflow on pathologically deep hierarchies;
//! [`traverse_iterative`] keeps an explicit stack on the heap.

use super::handle::ItemHandle;
use super::traits::ItemModel;

/// How subtree walks are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraversalStrategy {
    Recursive,
    #[default]
    Iterative,
}

/// What a walk does after visiting an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraverseControl {
    Continue,
    /// Do not descend into the children of the visited item.
    SkipChildren,
    /// End the walk.
    Stop,
}

/// Walks the subtree of `item` with the given strategy.
///
/// Returns `false` if the visitor stopped the walk early.
pub fn traverse<M, F>(strategy: TraversalStrategy, model: &M, item: ItemHandle, visit: F) -> bool
where
    M: ItemModel + ?Sized,
    F: FnMut(ItemHandle) -> TraverseControl,
{
    match strategy {
        TraversalStrategy::Recursive => traverse_recursive(model, item, visit),
        TraversalStrategy::Iterative => traverse_iterative(model, item, visit),
    }
}

pub fn traverse_recursive<M, F>(model: &M, item: ItemHandle, mut visit: F) -> bool
where
    M: ItemModel + ?Sized,
    F: FnMut(ItemHandle) -> TraverseControl,
{
    fn walk<M: ItemModel + ?Sized>(
        model: &M,
        item: ItemHandle,
        visit: &mut dyn FnMut(ItemHandle) -> TraverseControl,
    ) -> bool {
        match visit(item) {
            TraverseControl::Stop => false,
            TraverseControl::SkipChildren => true,
            TraverseControl::Continue => {
                (0..model.child_count(item)).all(|i| walk(model, model.child(item, i), &mut *visit))
            }
        }
    }

    if item.is_invalid() {
        return true;
    }
    walk(model, item, &mut visit)
}

pub fn traverse_iterative<M, F>(model: &M, item: ItemHandle, mut visit: F) -> bool
where
    M: ItemModel + ?Sized,
    F: FnMut(ItemHandle) -> TraverseControl,
{
    if item.is_invalid() {
        return true;
    }
    let mut stack = vec![item];
    while let Some(node) = stack.pop() {
        match visit(node) {
            TraverseControl::Stop => return false,
            TraverseControl::SkipChildren => {}
            TraverseControl::Continue => {
                let count = model.child_count(node);
                stack.extend((0..count).rev().map(|i| model.child(node, i)));
            }
        }
    }
    true
}
