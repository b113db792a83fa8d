//! Core traits for hugetree models.
//!
//! Every backing data source implements [`ItemModel`]. The trait has a small
//! mandatory tier (`parent`, `child_count`, `child`) and a large optional
//! tier of derived operations whose defaults live in
//! [`algorithms`](super::algorithms). The defaults are correct against any
//! consistent implementation of the mandatory tier but may be slow; models
//! that can answer faster (flat lists, arena trees, models with analytic
//! subtree sizes) override them.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use hugetree_core::Signal;
use parking_lot::RwLock;

use super::algorithms;
use super::handle::{ItemHandle, ModelId};
use super::list_model::ListAccess;
use super::proxy_model::ProxyAccess;
use super::search::Matcher;
use super::value::{FieldCount, ItemValue, ScalarValue, SortSpec};

/// Reports per-item expand/collapse state to traversal operations.
///
/// A collapsed item still counts as visible, but its children are skipped.
/// The root is always treated as expanded regardless of what the filter says.
///
/// Any `Fn(ItemHandle) -> bool` closure is a state filter:
///
/// ```
/// use hugetree::model::{ItemHandle, StateFilter};
///
/// let all_collapsed = |_: ItemHandle| false;
/// assert!(!all_collapsed.is_expanded(ItemHandle::invalid()));
/// ```
pub trait StateFilter {
    /// Returns `true` if the children of `item` are visible.
    fn is_expanded(&self, item: ItemHandle) -> bool;
}

impl<F> StateFilter for F
where
    F: Fn(ItemHandle) -> bool,
{
    fn is_expanded(&self, item: ItemHandle) -> bool {
        self(item)
    }
}

/// An item together with its depth below the root.
///
/// Traversal operations keep track of the level as they descend and ascend
/// so callers can indent rows without calling [`ItemModel::depth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LeveledItem {
    pub item: ItemHandle,
    pub level: usize,
}

impl LeveledItem {
    pub const fn new(item: ItemHandle, level: usize) -> Self {
        Self { item, level }
    }

    pub const fn invalid() -> Self {
        Self {
            item: ItemHandle::invalid(),
            level: 0,
        }
    }
}

/// Signals emitted by item models.
///
/// Views connect to these signals to stay synchronized with the model.
pub struct ModelSignals {
    /// Emitted after children were re-ordered or re-filtered.
    pub layout_changed: Signal<()>,

    /// Emitted after the model's contents were replaced wholesale, for
    /// example when a proxy attaches or detaches its master.
    pub model_reset: Signal<()>,

    /// Emitted after a successful `set_value`.
    /// Args: (item, field)
    pub data_changed: Signal<(ItemHandle, u32)>,
}

impl Default for ModelSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSignals").finish_non_exhaustive()
    }
}

impl ModelSignals {
    /// Creates a new set of model signals.
    pub fn new() -> Self {
        Self {
            layout_changed: Signal::new(),
            model_reset: Signal::new(),
            data_changed: Signal::new(),
        }
    }

    /// Emits signals for a layout change after running `change_fn`.
    pub fn emit_layout_changed<F>(&self, change_fn: F)
    where
        F: FnOnce(),
    {
        change_fn();
        self.layout_changed.emit(());
    }

    /// Emits signals for a model reset after running `reset_fn`.
    pub fn emit_reset<F>(&self, reset_fn: F)
    where
        F: FnOnce(),
    {
        reset_fn();
        self.model_reset.emit(());
    }
}

/// Link from a model to the proxy that owns it.
///
/// Every base holds its own link; an attached master holds a clone of its
/// owner's link, so re-wrapping an outer proxy is visible from every layer
/// below it.
#[derive(Debug)]
struct OwnerLink {
    id: ModelId,
    owner: RwLock<Option<Arc<OwnerLink>>>,
}

/// Identity and notification state shared by every model.
#[derive(Debug)]
pub struct ModelBase {
    link: Arc<OwnerLink>,
    signals: ModelSignals,
}

impl Default for ModelBase {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBase {
    /// Creates a base with a freshly minted [`ModelId`].
    pub fn new() -> Self {
        Self {
            link: Arc::new(OwnerLink {
                id: ModelId::next(),
                owner: RwLock::new(None),
            }),
            signals: ModelSignals::new(),
        }
    }

    pub fn id(&self) -> ModelId {
        self.link.id
    }

    /// The proxy wrapping this model, if any.
    pub fn parent(&self) -> Option<ModelId> {
        self.link.owner.read().as_ref().map(|owner| owner.id)
    }

    /// The outermost proxy above this model, or this model itself when it
    /// is not wrapped.
    pub fn top(&self) -> ModelId {
        let mut top = self.link.id;
        let mut owner = self.link.owner.read().clone();
        while let Some(link) = owner {
            top = link.id;
            owner = link.owner.read().clone();
        }
        top
    }

    /// Records `owner` as the proxy wrapping this model, or clears it.
    pub fn set_owner(&mut self, owner: Option<&ModelBase>) {
        *self.link.owner.write() = owner.map(|base| Arc::clone(&base.link));
    }

    pub fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}

/// The core trait for hierarchical models.
///
/// A model describes a single-rooted, ordered, acyclic hierarchy. The root
/// is addressed by [`ItemHandle::root`] and is never itself a data row.
///
/// # Implementation Requirements
///
/// At minimum, you must implement:
/// - [`base`](ItemModel::base) / [`base_mut`](ItemModel::base_mut)
/// - [`parent`](ItemModel::parent) - the parent of an item (root for top-level items)
/// - [`child_count`](ItemModel::child_count) - the number of children
/// - [`child`](ItemModel::child) - the child at an index
///
/// These three must agree with each other: `parent(child(p, i)) == p` for
/// every `i` in range. The engine cannot cheaply verify this; an
/// inconsistent model makes traversal results meaningless.
///
/// # Invalid input
///
/// No operation panics or returns an error for bad input. An invalid
/// handle or out-of-range index yields [`ItemHandle::invalid()`], `0`,
/// `None` or `false`.
pub trait ItemModel: Send + Sync {
    fn base(&self) -> &ModelBase;

    fn base_mut(&mut self) -> &mut ModelBase;

    /// Returns the parent of `item`.
    ///
    /// Top-level items return [`root`](ItemModel::root). The root and
    /// invalid handles return [`ItemHandle::invalid()`].
    fn parent(&self, item: ItemHandle) -> ItemHandle;

    /// Returns the number of children of `item` (the root included).
    fn child_count(&self, item: ItemHandle) -> u32;

    /// Returns the child of `parent` at `index`.
    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle;

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    fn id(&self) -> ModelId {
        self.base().id()
    }

    /// The root handle of this model.
    fn root(&self) -> ItemHandle {
        ItemHandle::root(self.id())
    }

    fn signals(&self) -> &ModelSignals {
        self.base().signals()
    }

    /// The proxy that owns this model, if it is wrapped.
    fn parent_model(&self) -> Option<ModelId> {
        self.base().parent()
    }

    /// The outermost proxy of the chain this model belongs to.
    ///
    /// Resolve the returned id from the top with
    /// [`find_layer`](super::find_layer).
    fn top_model(&self) -> ModelId {
        self.base().top()
    }

    /// Ids of this model and every master below it, outermost first.
    fn chain(&self) -> Vec<ModelId> {
        let mut ids = vec![self.id()];
        let mut current = self.as_proxy().and_then(|proxy| proxy.master());
        while let Some(model) = current {
            ids.push(model.id());
            current = model.as_proxy().and_then(|proxy| proxy.master());
        }
        ids
    }

    /// Capability query for flat models.
    fn as_list(&self) -> Option<&dyn ListAccess> {
        None
    }

    /// Capability query for proxies.
    fn as_proxy(&self) -> Option<&dyn ProxyAccess> {
        None
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    /// Returns the number of fields `item` provides.
    fn field_count(&self, _item: ItemHandle) -> FieldCount {
        FieldCount::Fields(1)
    }

    /// Returns the value of `field` for `item`.
    fn value(&self, _item: ItemHandle, _field: u32) -> ItemValue {
        ItemValue::None
    }

    /// Sets the value of `field` for `item`.
    ///
    /// Returns `true` if the value was stored. The default is read-only.
    /// Implementations should emit `data_changed` after a successful write.
    fn set_value(&self, _item: ItemHandle, _field: u32, _value: ItemValue) -> bool {
        false
    }

    /// Calls `f` with the value of `field` for every visible item.
    fn for_each_value(
        &self,
        field: u32,
        filter: Option<&dyn StateFilter>,
        f: &mut dyn FnMut(&ItemValue),
    ) {
        algorithms::for_each_value(self, field, filter, f)
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    fn has_children(&self, item: ItemHandle) -> bool {
        self.child_count(item) > 0
    }

    /// Returns the position of `child` among the children of `parent`.
    ///
    /// The default trusts the handle's child index hint when it checks out
    /// and otherwise scans every child. Override this when the index can be
    /// derived directly; it is the inner loop of sibling navigation.
    fn child_index(&self, parent: ItemHandle, child: ItemHandle) -> Option<u32> {
        algorithms::child_index(self, parent, child)
    }

    /// Number of steps from the root; the root has depth 0.
    fn depth(&self, item: ItemHandle) -> usize {
        algorithms::depth(self, item)
    }

    fn first_child(&self, item: ItemHandle) -> ItemHandle {
        self.child(item, 0)
    }

    fn last_child(&self, item: ItemHandle) -> ItemHandle {
        match self.child_count(item) {
            0 => ItemHandle::invalid(),
            n => self.child(item, n - 1),
        }
    }

    fn next_sibling(&self, item: ItemHandle) -> ItemHandle {
        algorithms::next_sibling(self, item)
    }

    fn prev_sibling(&self, item: ItemHandle) -> ItemHandle {
        algorithms::prev_sibling(self, item)
    }

    /// The first visible child of `item`, or invalid when it has none.
    fn first_descendant(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> ItemHandle {
        algorithms::first_descendant(self, item, filter)
    }

    /// The last item of the visible subtree below `item`, or invalid when
    /// `item` has no visible children.
    fn last_descendant(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> ItemHandle {
        algorithms::last_descendant(self, item, filter)
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `item`.
    fn is_ancestor_of(&self, ancestor: ItemHandle, item: ItemHandle) -> bool {
        algorithms::is_ancestor_of(self, ancestor, item)
    }

    // -------------------------------------------------------------------------
    // Depth-first traversal
    // -------------------------------------------------------------------------

    /// Advances `count` steps in depth-first pre-order.
    ///
    /// Collapsed items (per `filter`) are visited but their children are
    /// skipped. Returns [`LeveledItem::invalid()`] when stepping past the
    /// last item.
    fn next_item_at(
        &self,
        start: LeveledItem,
        filter: Option<&dyn StateFilter>,
        count: u64,
    ) -> LeveledItem {
        algorithms::next_item_at(self, start, filter, count)
    }

    /// Steps back `count` items in depth-first pre-order.
    ///
    /// Stepping back from a top-level item's first position reaches the
    /// root; stepping back from the root yields [`LeveledItem::invalid()`].
    fn prev_item_at(
        &self,
        start: LeveledItem,
        filter: Option<&dyn StateFilter>,
        count: u64,
    ) -> LeveledItem {
        algorithms::prev_item_at(self, start, filter, count)
    }

    /// The depth-first successor of `item`.
    fn next_item(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.next_item_at(LeveledItem::new(item, 0), filter, 1).item
    }

    /// The depth-first predecessor of `item`.
    fn prev_item(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.prev_item_at(LeveledItem::new(item, 0), filter, 1).item
    }

    // -------------------------------------------------------------------------
    // Ranks
    // -------------------------------------------------------------------------

    /// Number of visible items in the subtree rooted at `item`, itself
    /// included. A collapsed item counts as 1; an invalid handle as 0.
    fn subtree_size(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> u64 {
        algorithms::subtree_size(self, item, filter)
    }

    /// Converts a depth-first rank into an item.
    ///
    /// `start` and `start_rank` are a known nearby position; pass
    /// [`ItemHandle::invalid()`] and 0 to search from the root. Returns
    /// invalid when `rank` is past the last visible item.
    fn find_item(
        &self,
        rank: u64,
        filter: Option<&dyn StateFilter>,
        start: ItemHandle,
        start_rank: u64,
    ) -> ItemHandle {
        algorithms::find_item(self, rank, filter, start, start_rank)
    }

    /// The depth-first rank of `item`, or `None` if it is invalid or hidden
    /// below a collapsed ancestor.
    fn item_rank(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> Option<u64> {
        algorithms::item_rank(self, item, filter)
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// The first visible item matching `matcher`.
    fn find_first(&self, matcher: &Matcher, filter: Option<&dyn StateFilter>) -> ItemHandle {
        algorithms::find_next(self, matcher, self.root(), filter)
    }

    /// The next visible item after `from` matching `matcher`.
    fn find_next(
        &self,
        matcher: &Matcher,
        from: ItemHandle,
        filter: Option<&dyn StateFilter>,
    ) -> ItemHandle {
        algorithms::find_next(self, matcher, from, filter)
    }

    /// The closest visible item before `from` matching `matcher`.
    fn find_prev(
        &self,
        matcher: &Matcher,
        from: ItemHandle,
        filter: Option<&dyn StateFilter>,
    ) -> ItemHandle {
        algorithms::find_prev(self, matcher, from, filter)
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Returns `true` if this model can re-order its children by `spec`
    /// itself. When `false`, wrap it in a sorting proxy.
    fn can_sort(&self, _spec: &SortSpec) -> bool {
        false
    }

    /// Re-orders children by `spec`. Returns `true` if the order changed.
    fn sort(&self, _spec: &SortSpec) -> bool {
        false
    }

    /// Restores the intrinsic child order.
    fn reset_sorting(&self) {}

    /// Compares two siblings by the keys of `spec`.
    fn compare(&self, a: ItemHandle, b: ItemHandle, spec: &SortSpec) -> Ordering {
        algorithms::compare(self, a, b, spec)
    }
}

/// Convenience methods available on every [`ItemModel`].
pub trait ItemModelExt: ItemModel {
    /// The distinct values of `field` over every visible item.
    ///
    /// Values that do not convert to `T` are skipped.
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use hugetree::model::{ItemModelExt, ItemValue, ListModel, VecSource};
    ///
    /// let list = ListModel::new(VecSource::with_extractor(vec!["b", "a", "b"], 1, |s: &&str, _| {
    ///     ItemValue::from(*s)
    /// }));
    /// let values: BTreeSet<String> = list.all_values(0, None);
    /// assert_eq!(values.len(), 2);
    /// ```
    fn all_values<T: ScalarValue>(&self, field: u32, filter: Option<&dyn StateFilter>) -> BTreeSet<T> {
        let mut values = BTreeSet::new();
        self.for_each_value(field, filter, &mut |value| {
            if let Some(v) = T::from_item_value(value) {
                values.insert(v);
            }
        });
        values
    }
}

impl<M: ItemModel + ?Sized> ItemModelExt for M {}
