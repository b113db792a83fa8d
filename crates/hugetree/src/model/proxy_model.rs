//! Proxy models and proxy chains.
//!
//! A proxy owns exactly one master model and presents it under its own
//! [`ModelId`]. [`ProxyModel`] forwards every operation unchanged, including
//! the master's fast overrides of derived operations. Proxies that change
//! child order or membership build on it (see
//! [`ArrayProxyModel`](super::ArrayProxyModel)).
//!
//! Chains compose by ownership: the outermost proxy owns the next layer,
//! which owns the next, down to the bottom model. Each layer links to its
//! owner, so any layer can name the outermost proxy with
//! [`ItemModel::top_model`], while [`bottom_model`] and [`find_layer`] walk
//! down from the top.

use std::cmp::Ordering;

use hugetree_core::logging::targets;
use hugetree_core::{Error, Result};

use super::handle::{ItemHandle, ModelId};
use super::search::Matcher;
use super::traits::{ItemModel, LeveledItem, ModelBase, StateFilter};
use super::value::{FieldCount, ItemValue, SortSpec};

/// Capability interface of proxy models.
///
/// Returned by [`ItemModel::as_proxy`].
pub trait ProxyAccess {
    /// The wrapped model, if one is attached.
    fn master(&self) -> Option<&dyn ItemModel>;

    /// Converts a handle of this proxy into a handle of the master.
    fn to_master(&self, item: ItemHandle) -> ItemHandle;

    /// Converts a handle of the master into a handle of this proxy.
    fn from_master(&self, item: ItemHandle) -> ItemHandle;
}

/// Finds the layer with `id` in the chain starting at `top`.
pub fn find_layer(top: &dyn ItemModel, id: ModelId) -> Option<&dyn ItemModel> {
    let mut current = Some(top);
    while let Some(model) = current {
        if model.id() == id {
            return Some(model);
        }
        current = model.as_proxy().and_then(|proxy| proxy.master());
    }
    None
}

/// The innermost model of the chain starting at `top`.
///
/// A proxy with nothing attached is its own bottom.
pub fn bottom_model(top: &dyn ItemModel) -> &dyn ItemModel {
    let mut current = top;
    while let Some(master) = current.as_proxy().and_then(|proxy| proxy.master()) {
        current = master;
    }
    current
}

/// Converts a handle of the top of a chain into a handle of the bottom model.
pub fn to_bottom(top: &dyn ItemModel, item: ItemHandle) -> ItemHandle {
    let mut current = top;
    let mut item = item;
    while let Some(proxy) = current.as_proxy() {
        let Some(master) = proxy.master() else {
            break;
        };
        item = proxy.to_master(item);
        current = master;
    }
    item
}

/// A proxy that forwards everything to its master.
///
/// # Example
///
/// ```
/// use hugetree::model::{ItemModel, ItemValue, ListModel, ProxyModel, VecSource};
///
/// let list = ListModel::new(VecSource::with_extractor(vec!["a", "b"], 1, |s: &&str, _| {
///     ItemValue::from(*s)
/// }));
/// let proxy = ProxyModel::with_master(Box::new(list));
///
/// let item = proxy.child(proxy.root(), 1);
/// assert_eq!(item.model(), Some(proxy.id()));
/// assert_eq!(proxy.value(item, 0), ItemValue::from("b"));
/// ```
pub struct ProxyModel {
    base: ModelBase,
    master: Option<Box<dyn ItemModel>>,
}

impl Default for ProxyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProxyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyModel")
            .field("id", &self.base.id())
            .field("master", &self.master.as_ref().map(|m| m.id()))
            .finish()
    }
}

impl ProxyModel {
    /// Creates a proxy with no master attached.
    pub fn new() -> Self {
        Self {
            base: ModelBase::new(),
            master: None,
        }
    }

    /// Creates a proxy owning `master`.
    pub fn with_master(master: Box<dyn ItemModel>) -> Self {
        let mut proxy = Self::new();
        proxy.attach(master);
        proxy
    }

    /// Takes ownership of `master`, returning the previously attached one.
    ///
    /// Emits `model_reset`.
    pub fn attach(&mut self, mut master: Box<dyn ItemModel>) -> Option<Box<dyn ItemModel>> {
        master.base_mut().set_owner(Some(&self.base));
        tracing::debug!(
            target: targets::PROXY,
            proxy = %self.base.id(),
            master = %master.id(),
            "attaching master model"
        );
        let previous = self.master.replace(master).map(Self::release);
        self.base.signals().model_reset.emit(());
        previous
    }

    /// Releases the master without destroying it.
    ///
    /// Emits `model_reset` if a master was attached.
    pub fn detach(&mut self) -> Option<Box<dyn ItemModel>> {
        let master = self.master.take().map(Self::release)?;
        tracing::debug!(
            target: targets::PROXY,
            proxy = %self.base.id(),
            master = %master.id(),
            "detached master model"
        );
        self.base.signals().model_reset.emit(());
        Some(master)
    }

    fn release(mut master: Box<dyn ItemModel>) -> Box<dyn ItemModel> {
        master.base_mut().set_owner(None);
        master
    }

    pub fn master(&self) -> Option<&dyn ItemModel> {
        self.master.as_deref()
    }

    /// The master, or [`Error::NoMasterModel`] when detached.
    pub fn try_master(&self) -> Result<&dyn ItemModel> {
        self.master().ok_or(Error::NoMasterModel)
    }

    pub fn has_master(&self) -> bool {
        self.master.is_some()
    }

    /// Converts a proxy handle into a master handle.
    ///
    /// Identity fields and the child index hint are kept.
    pub fn to_master(&self, item: ItemHandle) -> ItemHandle {
        let Some(master) = self.master() else {
            return ItemHandle::invalid();
        };
        if item.is_invalid() {
            ItemHandle::invalid()
        } else if item.is_root() {
            master.root()
        } else {
            item.reowned(master.id())
        }
    }

    /// Converts a master handle into a proxy handle.
    pub fn from_master(&self, item: ItemHandle) -> ItemHandle {
        if item.is_invalid() {
            ItemHandle::invalid()
        } else if item.is_root() {
            ItemHandle::root(self.base.id())
        } else {
            item.reowned(self.base.id())
        }
    }

    fn forward<R>(&self, default: R, f: impl FnOnce(&dyn ItemModel) -> R) -> R {
        match self.master() {
            Some(master) => f(master),
            None => default,
        }
    }

    fn forward_item(&self, f: impl FnOnce(&dyn ItemModel) -> ItemHandle) -> ItemHandle {
        self.forward(ItemHandle::invalid(), |master| self.from_master(f(master)))
    }

    fn forward_leveled(&self, f: impl FnOnce(&dyn ItemModel) -> LeveledItem) -> LeveledItem {
        self.forward(LeveledItem::invalid(), |master| {
            let step = f(master);
            LeveledItem::new(self.from_master(step.item), step.level)
        })
    }
}

impl ProxyAccess for ProxyModel {
    fn master(&self) -> Option<&dyn ItemModel> {
        self.master()
    }

    fn to_master(&self, item: ItemHandle) -> ItemHandle {
        self.to_master(item)
    }

    fn from_master(&self, item: ItemHandle) -> ItemHandle {
        self.from_master(item)
    }
}

impl ItemModel for ProxyModel {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn as_proxy(&self) -> Option<&dyn ProxyAccess> {
        Some(self)
    }

    fn parent(&self, item: ItemHandle) -> ItemHandle {
        self.forward_item(|m| m.parent(self.to_master(item)))
    }

    fn child_count(&self, item: ItemHandle) -> u32 {
        self.forward(0, |m| m.child_count(self.to_master(item)))
    }

    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle {
        self.forward_item(|m| m.child(self.to_master(parent), index))
    }

    fn field_count(&self, item: ItemHandle) -> FieldCount {
        self.forward(FieldCount::Fields(0), |m| m.field_count(self.to_master(item)))
    }

    fn value(&self, item: ItemHandle, field: u32) -> ItemValue {
        self.forward(ItemValue::None, |m| m.value(self.to_master(item), field))
    }

    fn set_value(&self, item: ItemHandle, field: u32, value: ItemValue) -> bool {
        let stored = self.forward(false, |m| m.set_value(self.to_master(item), field, value));
        if stored {
            self.base.signals().data_changed.emit((item, field));
        }
        stored
    }

    fn for_each_value(
        &self,
        field: u32,
        filter: Option<&dyn StateFilter>,
        f: &mut dyn FnMut(&ItemValue),
    ) {
        self.forward((), |m| m.for_each_value(field, filter, f))
    }

    fn has_children(&self, item: ItemHandle) -> bool {
        self.forward(false, |m| m.has_children(self.to_master(item)))
    }

    fn child_index(&self, parent: ItemHandle, child: ItemHandle) -> Option<u32> {
        self.forward(None, |m| {
            m.child_index(self.to_master(parent), self.to_master(child))
        })
    }

    fn depth(&self, item: ItemHandle) -> usize {
        self.forward(0, |m| m.depth(self.to_master(item)))
    }

    fn first_child(&self, item: ItemHandle) -> ItemHandle {
        self.forward_item(|m| m.first_child(self.to_master(item)))
    }

    fn last_child(&self, item: ItemHandle) -> ItemHandle {
        self.forward_item(|m| m.last_child(self.to_master(item)))
    }

    fn next_sibling(&self, item: ItemHandle) -> ItemHandle {
        self.forward_item(|m| m.next_sibling(self.to_master(item)))
    }

    fn prev_sibling(&self, item: ItemHandle) -> ItemHandle {
        self.forward_item(|m| m.prev_sibling(self.to_master(item)))
    }

    fn first_descendant(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.forward_item(|m| m.first_descendant(self.to_master(item), filter))
    }

    fn last_descendant(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.forward_item(|m| m.last_descendant(self.to_master(item), filter))
    }

    fn is_ancestor_of(&self, ancestor: ItemHandle, item: ItemHandle) -> bool {
        self.forward(false, |m| {
            m.is_ancestor_of(self.to_master(ancestor), self.to_master(item))
        })
    }

    fn next_item_at(
        &self,
        start: LeveledItem,
        filter: Option<&dyn StateFilter>,
        count: u64,
    ) -> LeveledItem {
        self.forward_leveled(|m| {
            let start = LeveledItem::new(self.to_master(start.item), start.level);
            m.next_item_at(start, filter, count)
        })
    }

    fn prev_item_at(
        &self,
        start: LeveledItem,
        filter: Option<&dyn StateFilter>,
        count: u64,
    ) -> LeveledItem {
        self.forward_leveled(|m| {
            let start = LeveledItem::new(self.to_master(start.item), start.level);
            m.prev_item_at(start, filter, count)
        })
    }

    fn subtree_size(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> u64 {
        self.forward(0, |m| m.subtree_size(self.to_master(item), filter))
    }

    fn find_item(
        &self,
        rank: u64,
        filter: Option<&dyn StateFilter>,
        start: ItemHandle,
        start_rank: u64,
    ) -> ItemHandle {
        self.forward_item(|m| m.find_item(rank, filter, self.to_master(start), start_rank))
    }

    fn item_rank(&self, item: ItemHandle, filter: Option<&dyn StateFilter>) -> Option<u64> {
        self.forward(None, |m| m.item_rank(self.to_master(item), filter))
    }

    fn find_first(&self, matcher: &Matcher, filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.forward_item(|m| m.find_first(matcher, filter))
    }

    fn find_next(
        &self,
        matcher: &Matcher,
        from: ItemHandle,
        filter: Option<&dyn StateFilter>,
    ) -> ItemHandle {
        self.forward_item(|m| m.find_next(matcher, self.to_master(from), filter))
    }

    fn find_prev(
        &self,
        matcher: &Matcher,
        from: ItemHandle,
        filter: Option<&dyn StateFilter>,
    ) -> ItemHandle {
        self.forward_item(|m| m.find_prev(matcher, self.to_master(from), filter))
    }

    fn can_sort(&self, spec: &SortSpec) -> bool {
        self.forward(false, |m| m.can_sort(spec))
    }

    fn sort(&self, spec: &SortSpec) -> bool {
        let sorted = self.forward(false, |m| m.sort(spec));
        if sorted {
            self.base.signals().layout_changed.emit(());
        }
        sorted
    }

    fn reset_sorting(&self) {
        self.forward((), |m| m.reset_sorting());
        self.base.signals().layout_changed.emit(());
    }

    fn compare(&self, a: ItemHandle, b: ItemHandle, spec: &SortSpec) -> Ordering {
        self.forward(Ordering::Equal, |m| {
            m.compare(self.to_master(a), self.to_master(b), spec)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::CountingTree;
    use crate::model::{FilterProxyModel, ListModel, SearchOptions, SortProxyModel, VecSource};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn list(items: Vec<&'static str>) -> ListModel<VecSource<&'static str>> {
        ListModel::new(VecSource::with_extractor(items, 1, |s: &&'static str, _| {
            ItemValue::from(*s)
        }))
    }

    #[test]
    fn test_detached_proxy_is_empty() {
        let proxy = ProxyModel::new();
        assert!(!proxy.has_master());
        assert_eq!(proxy.child_count(proxy.root()), 0);
        assert!(proxy.child(proxy.root(), 0).is_invalid());
        assert!(matches!(proxy.try_master(), Err(Error::NoMasterModel)));
    }

    #[test]
    fn test_forwarding_reowns_handles() {
        let proxy = ProxyModel::with_master(Box::new(list(vec!["a", "b", "c"])));
        let item = proxy.child(proxy.root(), 2);
        assert_eq!(item.model(), Some(proxy.id()));
        assert_eq!(proxy.value(item, 0), ItemValue::from("c"));
        assert!(proxy.parent(item).is_root());
        assert_eq!(proxy.parent(item).model(), Some(proxy.id()));
        assert_eq!(proxy.item_rank(item, None), Some(3));
        assert_eq!(proxy.find_item(1, None, ItemHandle::invalid(), 0).model(), Some(proxy.id()));
    }

    #[test]
    fn test_handles_equal_across_layers() {
        let proxy = ProxyModel::with_master(Box::new(list(vec!["a"])));
        let master = proxy.master().unwrap();
        let below = master.child(master.root(), 0);
        let above = proxy.child(proxy.root(), 0);
        assert_ne!(below.model(), above.model());
        assert_eq!(below, above);
        assert_eq!(proxy.to_master(above).model(), Some(master.id()));
    }

    #[test]
    fn test_attach_detach_ownership() {
        let mut proxy = ProxyModel::new();
        let resets = Arc::new(Mutex::new(0));
        let recv = resets.clone();
        proxy.signals().model_reset.connect(move |_| *recv.lock() += 1);

        let master = list(vec!["x"]);
        let master_id = master.id();
        assert!(proxy.attach(Box::new(master)).is_none());
        assert_eq!(proxy.master().unwrap().parent_model(), Some(proxy.id()));

        let released = proxy.detach().unwrap();
        assert_eq!(released.id(), master_id);
        assert_eq!(released.parent_model(), None);
        assert!(proxy.detach().is_none());
        assert_eq!(*resets.lock(), 2);
    }

    #[test]
    fn test_chain_navigation() {
        let bottom = list(vec!["a", "b"]);
        let bottom_id = bottom.id();
        let middle = ProxyModel::with_master(Box::new(bottom));
        let middle_id = middle.id();
        let top = ProxyModel::with_master(Box::new(middle));

        assert_eq!(top.chain(), vec![top.id(), middle_id, bottom_id]);
        assert_eq!(bottom_model(&top).id(), bottom_id);
        assert!(bottom_model(&top).as_list().is_some());
        assert_eq!(find_layer(&top, middle_id).map(|m| m.id()), Some(middle_id));
        assert!(find_layer(&top, ModelId::next()).is_none());

        let item = top.child(top.root(), 1);
        assert_eq!(to_bottom(&top, item).model(), Some(bottom_id));
        assert_eq!(
            find_layer(&top, middle_id).unwrap().parent_model(),
            Some(top.id())
        );
    }

    #[test]
    fn test_top_model_from_every_layer() {
        let bottom = list(vec!["b", "a", "c"]);
        let bottom_id = bottom.id();
        let filter = FilterProxyModel::with_master(Box::new(bottom));
        let filter_id = filter.id();
        let mut sort = SortProxyModel::with_master(Box::new(filter));
        let sort_id = sort.id();

        for id in [sort_id, filter_id, bottom_id] {
            let layer = find_layer(&sort, id).unwrap();
            assert_eq!(layer.top_model(), sort_id);
        }
        assert_eq!(find_layer(&sort, bottom_id).unwrap().parent_model(), Some(filter_id));

        // Detaching cuts the chain below the released layer.
        let filter = sort.detach().unwrap();
        assert_eq!(filter.top_model(), filter_id);
        assert_eq!(find_layer(filter.as_ref(), bottom_id).unwrap().top_model(), filter_id);
    }

    #[test]
    fn test_top_model_follows_rewrapping() {
        let bottom = list(vec!["a"]);
        let bottom_id = bottom.id();
        let inner = ProxyModel::with_master(Box::new(bottom));
        let inner_id = inner.id();
        let outer = ProxyModel::with_master(Box::new(inner));
        let outer_id = outer.id();

        for id in [outer_id, inner_id, bottom_id] {
            assert_eq!(find_layer(&outer, id).unwrap().top_model(), outer_id);
        }
    }

    #[test]
    fn test_forwards_master_overrides() {
        let tree = CountingTree::from_edges(&[(0, 1), (1, 2), (0, 3)]);
        let proxy = ProxyModel::with_master(Box::new(tree));
        let order: Vec<u64> = std::iter::successors(
            Some(proxy.next_item(proxy.root(), None)),
            |&item| Some(proxy.next_item(item, None)),
        )
        .take_while(|item| !item.is_invalid())
        .map(|item| item.id())
        .collect();
        assert_eq!(order, vec![1, 2, 3]);
        let matcher = SearchOptions::new("item-3").compile().unwrap();
        assert_eq!(proxy.find_first(&matcher, None).id(), 3);
    }
}
