//! Per-item view state: enablement, selection, expansion and check marks.
//!
//! State is kept sparsely. Every item packs its state into a few bits of a
//! `u32` and items whose state is all zeros are not stored at all, so a
//! freshly created tracker costs nothing regardless of model size:
//!
//! | bits | meaning |
//! |------|---------|
//! | 0    | disabled |
//! | 1    | selected |
//! | 2    | expansion (see below) |
//! | 3-4  | [`CheckState`] |
//!
//! The meaning of the expansion bit depends on the tracker. Trees start
//! collapsed, so in [`TreeStates`] the bit marks an *expanded* item. Lists
//! start expanded, so in [`ListStates`] it marks a *collapsed* one. Either
//! way an untouched item costs no entry.
//!
//! Both trackers implement [`StateFilter`] and can be handed directly to
//! traversal and rank queries.
//!
//! # Example
//!
//! ```
//! use hugetree::model::{ItemModel, StateTracker, TreeModel, TreeStates};
//!
//! let tree: TreeModel<String> = TreeModel::new();
//! let a = tree.append(None, "a".to_string()).unwrap();
//! tree.append(Some(a), "a1".to_string());
//! tree.append(None, "b".to_string());
//!
//! let mut states = TreeStates::new();
//! assert_eq!(tree.subtree_size(tree.root(), Some(&states)), 3);
//!
//! states.expand(tree.item(a), true);
//! assert_eq!(tree.subtree_size(tree.root(), Some(&states)), 4);
//! ```

use std::collections::HashMap;

use hugetree_core::logging::targets;
use hugetree_core::{PerfSpan, Signal};

use super::handle::ItemHandle;
use super::traits::{ItemModel, StateFilter};
use super::traverse::{TraversalStrategy, TraverseControl, traverse};
use super::value::CheckState;

/// Bit layout of a packed item state.
pub mod bits {
    pub const DISABLED: u32 = 1 << 0;
    pub const SELECTED: u32 = 1 << 1;
    pub const EXPANSION: u32 = 1 << 2;
    pub const CHECK_SHIFT: u32 = 3;
    pub const CHECK_MASK: u32 = 0b11 << CHECK_SHIFT;
}

/// Sparse map from item to packed state bits.
///
/// Zero states are never stored.
#[derive(Debug, Clone, Default)]
pub struct StateMap {
    states: HashMap<ItemHandle, u32>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The packed state of `item`; zero if it has no entry.
    pub fn get(&self, item: ItemHandle) -> u32 {
        self.states.get(&item).copied().unwrap_or(0)
    }

    /// Stores `state` for `item`, removing the entry if it is zero.
    ///
    /// Returns the previous state.
    pub fn set(&mut self, item: ItemHandle, state: u32) -> u32 {
        if state == 0 {
            self.states.remove(&item).unwrap_or(0)
        } else {
            self.states.insert(item, state).unwrap_or(0)
        }
    }

    /// Sets or clears `mask` for `item`. Returns `true` if the state changed.
    pub fn set_bits(&mut self, item: ItemHandle, mask: u32, on: bool) -> bool {
        let old = self.get(item);
        let new = if on { old | mask } else { old & !mask };
        new != old && {
            self.set(item, new);
            true
        }
    }

    pub fn contains(&self, item: ItemHandle) -> bool {
        self.states.contains_key(&item)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Clears `mask` on every stored item, pruning entries that become zero.
    pub fn clear_bits(&mut self, mask: u32) {
        self.states.retain(|_, state| {
            *state &= !mask;
            *state != 0
        });
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Stored items whose state has any bit of `mask` set.
    pub fn items_with(&self, mask: u32) -> impl Iterator<Item = ItemHandle> + '_ {
        self.states
            .iter()
            .filter(move |(_, state)| *state & mask != 0)
            .map(|(item, _)| *item)
    }
}

/// Coarse selection state, checked before the per-item bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionScope {
    /// Nothing is selected.
    #[default]
    None,
    /// Everything is selected.
    All,
    /// Per-item bits decide.
    Mixed,
}

/// Signals emitted by state trackers.
pub struct StateSignals {
    /// Emitted after any selection change.
    pub selection_changed: Signal<()>,

    /// Emitted when an item is expanded or collapsed.
    /// Args: (item, expanded)
    pub expansion_changed: Signal<(ItemHandle, bool)>,

    /// Emitted when the check state of an item changes.
    /// Args: (item, new state)
    pub check_changed: Signal<(ItemHandle, CheckState)>,

    /// Emitted when the focused item changes.
    /// Args: (new, old)
    pub focus_changed: Signal<(ItemHandle, ItemHandle)>,
}

impl Default for StateSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSignals").finish_non_exhaustive()
    }
}

impl StateSignals {
    pub fn new() -> Self {
        Self {
            selection_changed: Signal::new(),
            expansion_changed: Signal::new(),
            check_changed: Signal::new(),
            focus_changed: Signal::new(),
        }
    }
}

/// Storage shared by every state tracker.
#[derive(Debug, Default)]
pub struct StateCore {
    map: StateMap,
    scope: SelectionScope,
    /// In [`SelectionScope::Mixed`], whether an item without the selected
    /// bit counts as selected.
    inverted: bool,
    focus: ItemHandle,
    traversal: TraversalStrategy,
    signals: StateSignals,
}

impl StateCore {
    pub fn map(&self) -> &StateMap {
        &self.map
    }

    pub fn signals(&self) -> &StateSignals {
        &self.signals
    }

    pub fn traversal(&self) -> TraversalStrategy {
        self.traversal
    }

    pub fn set_traversal(&mut self, traversal: TraversalStrategy) {
        self.traversal = traversal;
    }

    fn is_selected(&self, item: ItemHandle) -> bool {
        match self.scope {
            SelectionScope::None => false,
            SelectionScope::All => true,
            SelectionScope::Mixed => (self.map.get(item) & bits::SELECTED != 0) != self.inverted,
        }
    }

    /// Sets a uniform selection. Per-item selected bits are dropped so the
    /// map holds only entries that still carry other state.
    fn set_scope(&mut self, scope: SelectionScope) {
        self.map.clear_bits(bits::SELECTED);
        self.inverted = false;
        self.scope = scope;
    }

    /// Switches to per-item selection, keeping the current answer for every
    /// item.
    fn enter_mixed(&mut self) {
        if self.scope == SelectionScope::Mixed {
            return;
        }
        self.inverted = self.scope == SelectionScope::All;
        self.scope = SelectionScope::Mixed;
        tracing::trace!(target: targets::STATE, inverted = self.inverted, "selection scope mixed");
    }

    /// Returns `true` if the answer for `item` changed.
    fn select(&mut self, item: ItemHandle, on: bool) -> bool {
        if self.is_selected(item) == on {
            return false;
        }
        self.enter_mixed();
        self.map.set_bits(item, bits::SELECTED, on != self.inverted)
    }

    fn set_check(&mut self, item: ItemHandle, state: CheckState) -> bool {
        let old = self.map.get(item);
        let new = (old & !bits::CHECK_MASK) | (state.to_bits() << bits::CHECK_SHIFT);
        if new == old {
            return false;
        }
        self.map.set(item, new);
        self.signals.check_changed.emit((item, state));
        true
    }
}

/// Operations shared by [`TreeStates`] and [`ListStates`].
///
/// Implementors provide access to their [`StateCore`] and the meaning of
/// the expansion bit; every operation has a default implementation. Bulk
/// operations on a subtree walk it with the tracker's
/// [`TraversalStrategy`].
pub trait StateTracker: StateFilter {
    /// Whether a set expansion bit means "expanded".
    const EXPANDED_WHEN_SET: bool;

    fn core(&self) -> &StateCore;

    fn core_mut(&mut self) -> &mut StateCore;

    fn signals(&self) -> &StateSignals {
        self.core().signals()
    }

    /// The packed state bits of `item`.
    fn raw_state(&self, item: ItemHandle) -> u32 {
        self.core().map().get(item)
    }

    /// Forgets every stored state.
    fn clear(&mut self) {
        let core = self.core_mut();
        core.map.clear();
        core.scope = SelectionScope::None;
        core.inverted = false;
        core.focus = ItemHandle::invalid();
        core.signals.selection_changed.emit(());
    }

    // -------------------------------------------------------------------------
    // Enablement
    // -------------------------------------------------------------------------

    /// Whether `item` itself is enabled.
    fn is_enabled(&self, item: ItemHandle) -> bool {
        self.raw_state(item) & bits::DISABLED == 0
    }

    /// Whether `item` and all of its ancestors in `model` are enabled.
    fn is_enabled_in(&self, model: &dyn ItemModel, item: ItemHandle) -> bool {
        let mut current = item;
        while current.is_ok() {
            if !self.is_enabled(current) {
                return false;
            }
            current = model.parent(current);
        }
        true
    }

    fn enable(&mut self, item: ItemHandle, on: bool) -> bool {
        item.is_ok() && self.core_mut().map.set_bits(item, bits::DISABLED, !on)
    }

    /// Enables or disables `item` and its whole subtree.
    fn enable_subtree(&mut self, model: &dyn ItemModel, item: ItemHandle, on: bool) {
        let core = self.core_mut();
        let mut touched = 0u64;
        traverse(core.traversal, model, item, |node| {
            if node.is_ok() && core.map.set_bits(node, bits::DISABLED, !on) {
                touched += 1;
            }
            TraverseControl::Continue
        });
        tracing::trace!(target: targets::STATE, ?item, on, touched, "enable subtree");
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    fn selection_scope(&self) -> SelectionScope {
        self.core().scope
    }

    fn is_selected(&self, item: ItemHandle) -> bool {
        item.is_ok() && self.core().is_selected(item)
    }

    /// Selects or deselects `item`. Returns `true` if its state changed.
    fn select(&mut self, item: ItemHandle, on: bool) -> bool {
        if !item.is_ok() {
            return false;
        }
        let core = self.core_mut();
        let changed = core.select(item, on);
        if changed {
            core.signals.selection_changed.emit(());
        }
        changed
    }

    fn toggle_selected(&mut self, item: ItemHandle) -> bool {
        let on = !self.is_selected(item);
        self.select(item, on)
    }

    /// Selects or deselects `item` and its whole subtree.
    fn select_subtree(&mut self, model: &dyn ItemModel, item: ItemHandle, on: bool) {
        let core = self.core_mut();
        let mut touched = 0u64;
        traverse(core.traversal, model, item, |node| {
            if node.is_ok() && core.select(node, on) {
                touched += 1;
            }
            TraverseControl::Continue
        });
        tracing::trace!(target: targets::STATE, ?item, on, touched, "select subtree");
        if touched > 0 {
            core.signals.selection_changed.emit(());
        }
    }

    /// Selects every item. Only stored entries are touched, never the
    /// items of the model.
    fn select_all(&mut self) {
        let core = self.core_mut();
        core.set_scope(SelectionScope::All);
        tracing::trace!(target: targets::STATE, "select all");
        core.signals.selection_changed.emit(());
    }

    /// Deselects every item. Only stored entries are touched, never the
    /// items of the model.
    fn deselect_all(&mut self) {
        let core = self.core_mut();
        core.set_scope(SelectionScope::None);
        tracing::trace!(target: targets::STATE, "deselect all");
        core.signals.selection_changed.emit(());
    }

    /// Selects every visible item between `from` and `to`, both included.
    ///
    /// The two ends may be given in either order. Returns `false` and does
    /// nothing if either end is invalid or hidden under `filter`.
    fn select_range(
        &mut self,
        model: &dyn ItemModel,
        from: ItemHandle,
        to: ItemHandle,
        filter: Option<&dyn StateFilter>,
    ) -> bool {
        let _perf = PerfSpan::new("select_range");
        let (Some(from_rank), Some(to_rank)) =
            (model.item_rank(from, filter), model.item_rank(to, filter))
        else {
            tracing::trace!(target: targets::STATE, ?from, ?to, "range end has no rank");
            return false;
        };
        let (mut current, steps) = if from_rank <= to_rank {
            (from, to_rank - from_rank)
        } else {
            (to, from_rank - to_rank)
        };

        let core = self.core_mut();
        for step in 0..=steps {
            if current.is_invalid() {
                break;
            }
            if current.is_ok() {
                core.select(current, true);
            }
            if step < steps {
                current = model.next_item(current, filter);
            }
        }
        core.signals.selection_changed.emit(());
        true
    }

    /// Explicitly selected items in mixed scope.
    ///
    /// Empty in the other scopes and when the mixed selection is inverted.
    fn selected_items(&self) -> Vec<ItemHandle> {
        let core = self.core();
        if core.scope != SelectionScope::Mixed || core.inverted {
            return Vec::new();
        }
        core.map.items_with(bits::SELECTED).collect()
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    /// Expands or collapses `item`. Returns `true` if its state changed.
    fn expand(&mut self, item: ItemHandle, on: bool) -> bool {
        if !item.is_ok() {
            return false;
        }
        let core = self.core_mut();
        let changed = core
            .map
            .set_bits(item, bits::EXPANSION, on == Self::EXPANDED_WHEN_SET);
        if changed {
            core.signals.expansion_changed.emit((item, on));
        }
        changed
    }

    fn toggle_expanded(&mut self, item: ItemHandle) -> bool {
        let on = !self.is_expanded(item);
        self.expand(item, on)
    }

    /// Expands or collapses `item` and every descendant.
    fn expand_subtree(&mut self, model: &dyn ItemModel, item: ItemHandle, on: bool) {
        let core = self.core_mut();
        let mut changed = Vec::new();
        traverse(core.traversal, model, item, |node| {
            if node.is_ok()
                && core
                    .map
                    .set_bits(node, bits::EXPANSION, on == Self::EXPANDED_WHEN_SET)
            {
                changed.push(node);
            }
            TraverseControl::Continue
        });
        tracing::trace!(target: targets::STATE, ?item, on, touched = changed.len(), "expand subtree");
        for node in changed {
            core.signals.expansion_changed.emit((node, on));
        }
    }

    // -------------------------------------------------------------------------
    // Check marks
    // -------------------------------------------------------------------------

    fn check_state(&self, item: ItemHandle) -> CheckState {
        CheckState::from_bits(self.raw_state(item) >> bits::CHECK_SHIFT)
    }

    fn set_check(&mut self, item: ItemHandle, state: CheckState) -> bool {
        item.is_ok() && self.core_mut().set_check(item, state)
    }

    /// Sets the check state of `item` and its whole subtree.
    fn set_check_subtree(&mut self, model: &dyn ItemModel, item: ItemHandle, state: CheckState) {
        let core = self.core_mut();
        traverse(core.traversal, model, item, |node| {
            if node.is_ok() {
                core.set_check(node, state);
            }
            TraverseControl::Continue
        });
        tracing::trace!(target: targets::STATE, ?item, ?state, "check subtree");
    }

    /// Recomputes the check state of every ancestor of `item` from its
    /// children: all checked gives checked, none checked gives unchecked,
    /// anything else gives partially checked.
    fn update_parent_checks(&mut self, model: &dyn ItemModel, item: ItemHandle) {
        let mut parent = model.parent(item);
        while parent.is_ok() {
            let count = model.child_count(parent);
            let (mut checked, mut unchecked) = (0u32, 0u32);
            for i in 0..count {
                match self.check_state(model.child(parent, i)) {
                    CheckState::Checked => checked += 1,
                    CheckState::Unchecked => unchecked += 1,
                    CheckState::PartiallyChecked => {}
                }
            }
            let state = if checked == count {
                CheckState::Checked
            } else if unchecked == count {
                CheckState::Unchecked
            } else {
                CheckState::PartiallyChecked
            };
            if !self.core_mut().set_check(parent, state) {
                break;
            }
            parent = model.parent(parent);
        }
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    fn focus(&self) -> ItemHandle {
        self.core().focus
    }

    /// Moves the focus to `item` and returns the previously focused item.
    fn set_focus(&mut self, item: ItemHandle) -> ItemHandle {
        let core = self.core_mut();
        let old = std::mem::replace(&mut core.focus, item);
        if !old.is_same(&item) {
            core.signals.focus_changed.emit((item, old));
        }
        old
    }
}

/// State tracker for trees; items start collapsed.
#[derive(Debug, Default)]
pub struct TreeStates {
    core: StateCore,
}

impl TreeStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_traversal(mut self, traversal: TraversalStrategy) -> Self {
        self.core.set_traversal(traversal);
        self
    }
}

impl StateFilter for TreeStates {
    fn is_expanded(&self, item: ItemHandle) -> bool {
        self.core.map.get(item) & bits::EXPANSION != 0
    }
}

impl StateTracker for TreeStates {
    const EXPANDED_WHEN_SET: bool = true;

    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }
}

/// State tracker for flat and mostly-expanded models; items start expanded.
#[derive(Debug, Default)]
pub struct ListStates {
    core: StateCore,
}

impl ListStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_traversal(mut self, traversal: TraversalStrategy) -> Self {
        self.core.set_traversal(traversal);
        self
    }
}

impl StateFilter for ListStates {
    fn is_expanded(&self, item: ItemHandle) -> bool {
        self.core.map.get(item) & bits::EXPANSION == 0
    }
}

impl StateTracker for ListStates {
    const EXPANDED_WHEN_SET: bool = false;

    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }
}
