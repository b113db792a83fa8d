//! Proxies that materialize child lists.
//!
//! [`ArrayProxyModel`] answers `child_count`, `child` and `child_index` from
//! a per-parent array of children. The array is produced by a
//! [`ChildrenHook`], which is where sorting and filtering proxies plug in,
//! and is kept in a bounded [`ChildrenCache`]. Every other operation runs
//! the generic algorithms on top of those three, so rank and traversal
//! queries see the re-ordered or filtered hierarchy.
//!
//! The cache is cleared wholesale whenever the result of the hook may have
//! changed: a master is attached or detached, the sort order changes, or a
//! filter is pushed or popped.

use std::cmp::Ordering;
use std::sync::Arc;

use hugetree_core::logging::targets;

use super::algorithms;
use super::cache::{CacheConfig, CacheStats, ChildrenCache};
use super::handle::ItemHandle;
use super::proxy_model::{ProxyAccess, ProxyModel};
use super::traits::{ItemModel, ModelBase, StateFilter};
use super::value::{FieldCount, ItemValue, SortSpec};

/// Produces the child list of a parent for an [`ArrayProxyModel`].
///
/// Hooks are shared behind `&self`; implementations that carry mutable
/// configuration keep it behind a lock.
pub trait ChildrenHook: Send + Sync {
    /// Appends the children of `parent` to `out`, in display order.
    ///
    /// `parent` and the pushed handles belong to `master`.
    fn collect_children(&self, master: &dyn ItemModel, parent: ItemHandle, out: &mut Vec<ItemHandle>);

    /// Whether this hook can order children by `spec`.
    fn can_sort(&self, _spec: &SortSpec) -> bool {
        false
    }

    /// Adopts `spec` as the new order. Returns `false` if the hook does not
    /// sort, in which case the request goes to the master.
    fn set_sort(&self, _spec: &SortSpec) -> bool {
        false
    }

    /// Drops the current order. Returns `false` if the hook does not sort.
    fn reset_sort(&self) -> bool {
        false
    }

    fn sort_spec(&self) -> Option<SortSpec> {
        None
    }

    /// Temporarily stops restricting children by `field`. Returns `true` if
    /// the produced child lists may have changed.
    fn suspend_field(&self, _field: u32) -> bool {
        false
    }

    /// Undoes [`suspend_field`](Self::suspend_field).
    fn resume_field(&self, _field: u32) {}
}

/// A hook that keeps the master's children as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ChildrenHook for PassThrough {
    fn collect_children(&self, master: &dyn ItemModel, parent: ItemHandle, out: &mut Vec<ItemHandle>) {
        let count = master.child_count(parent);
        out.reserve(count as usize);
        out.extend((0..count).map(|i| master.child(parent, i)));
    }
}

/// A proxy that serves children from cached arrays built by a hook.
///
/// # Example
///
/// ```
/// use hugetree::model::{ArrayProxyModel, ItemModel, PassThrough, TreeModel};
///
/// let tree: TreeModel<String> = TreeModel::new();
/// let a = tree.append(None, "a".to_string()).unwrap();
/// tree.append(Some(a), "a1".to_string());
///
/// let proxy: ArrayProxyModel<PassThrough> = ArrayProxyModel::with_master(Box::new(tree));
/// let first = proxy.child(proxy.root(), 0);
/// assert_eq!(proxy.child_count(first), 1);
/// assert_eq!(proxy.cache_stats().misses, 2);
///
/// proxy.child_count(first);
/// assert_eq!(proxy.cache_stats().hits, 1);
/// ```
pub struct ArrayProxyModel<H: ChildrenHook> {
    proxy: ProxyModel,
    cache: ChildrenCache,
    hook: H,
}

impl<H: ChildrenHook> std::fmt::Debug for ArrayProxyModel<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayProxyModel")
            .field("proxy", &self.proxy)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<H: ChildrenHook + Default> Default for ArrayProxyModel<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ChildrenHook + Default> ArrayProxyModel<H> {
    /// Creates a detached proxy with the default hook.
    pub fn new() -> Self {
        Self::with_hook(H::default())
    }

    pub fn with_master(master: Box<dyn ItemModel>) -> Self {
        let mut proxy = Self::new();
        proxy.attach(master);
        proxy
    }
}

impl<H: ChildrenHook> ArrayProxyModel<H> {
    pub fn with_hook(hook: H) -> Self {
        Self {
            proxy: ProxyModel::new(),
            cache: ChildrenCache::default(),
            hook,
        }
    }

    /// Replaces the cache sizing. An invalid `config` disables caching.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = ChildrenCache::new(config);
        self
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn master(&self) -> Option<&dyn ItemModel> {
        self.proxy.master()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Takes ownership of `master` and clears the cache.
    pub fn attach(&mut self, master: Box<dyn ItemModel>) -> Option<Box<dyn ItemModel>> {
        self.cache.clear("master attached");
        self.proxy.attach(master)
    }

    /// Releases the master and clears the cache.
    pub fn detach(&mut self) -> Option<Box<dyn ItemModel>> {
        self.cache.clear("master detached");
        self.proxy.detach()
    }

    /// Drops every cached child list and emits `layout_changed`.
    pub fn invalidate(&self, reason: &'static str) {
        self.cache.clear(reason);
        self.proxy.base().signals().layout_changed.emit(());
    }

    /// The children of `parent` in display order.
    ///
    /// The returned handles belong to this proxy and carry their position
    /// as child index hint.
    pub fn get_all_children(&self, parent: ItemHandle) -> Arc<[ItemHandle]> {
        let Some(master) = self.proxy.master() else {
            return Arc::from([]);
        };
        if parent.is_invalid() {
            return Arc::from([]);
        }
        self.cache.get_or_compute(parent, |out| {
            self.hook.collect_children(master, self.to_master(parent), out);
            for (index, child) in out.iter_mut().enumerate() {
                *child = self.from_master(*child).with_child_index(index as u32);
            }
        })
    }

    /// Converts a proxy handle into a master handle.
    ///
    /// The child index hint is dropped since positions differ between the
    /// two layers.
    pub fn to_master(&self, item: ItemHandle) -> ItemHandle {
        let mut item = self.proxy.to_master(item);
        item.reset_child_index_hint();
        item
    }

    pub fn from_master(&self, item: ItemHandle) -> ItemHandle {
        let mut item = self.proxy.from_master(item);
        item.reset_child_index_hint();
        item
    }

    fn forward<R>(&self, default: R, f: impl FnOnce(&dyn ItemModel) -> R) -> R {
        match self.proxy.master() {
            Some(master) => f(master),
            None => default,
        }
    }

    /// Adopts `spec` in the hook or the master, invalidating on success.
    pub(crate) fn apply_sort(&self, spec: &SortSpec) -> bool {
        if self.hook.set_sort(spec) {
            tracing::debug!(
                target: targets::PROXY,
                proxy = %self.proxy.base().id(),
                keys = spec.keys.len(),
                "sort order changed"
            );
            self.invalidate("sort changed");
            return true;
        }
        let sorted = self.forward(false, |m| m.sort(spec));
        if sorted {
            self.invalidate("master sorted");
        }
        sorted
    }
}

impl<H: ChildrenHook> ProxyAccess for ArrayProxyModel<H> {
    fn master(&self) -> Option<&dyn ItemModel> {
        self.proxy.master()
    }

    fn to_master(&self, item: ItemHandle) -> ItemHandle {
        self.to_master(item)
    }

    fn from_master(&self, item: ItemHandle) -> ItemHandle {
        self.from_master(item)
    }
}

impl<H: ChildrenHook> ItemModel for ArrayProxyModel<H> {
    fn base(&self) -> &ModelBase {
        self.proxy.base()
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        self.proxy.base_mut()
    }

    fn as_proxy(&self) -> Option<&dyn ProxyAccess> {
        Some(self)
    }

    fn parent(&self, item: ItemHandle) -> ItemHandle {
        self.forward(ItemHandle::invalid(), |m| {
            self.from_master(m.parent(self.to_master(item)))
        })
    }

    fn child_count(&self, item: ItemHandle) -> u32 {
        self.get_all_children(item).len() as u32
    }

    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle {
        self.get_all_children(parent)
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }

    fn child_index(&self, parent: ItemHandle, child: ItemHandle) -> Option<u32> {
        if !child.is_ok() {
            return None;
        }
        let children = self.get_all_children(parent);
        if let Some(hint) = child.child_index_hint()
            && children.get(hint as usize) == Some(&child)
        {
            return Some(hint);
        }
        children.iter().position(|&c| c == child).map(|i| i as u32)
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
            self.proxy.base().signals().data_changed.emit((item, field));
        }
        stored
    }

    /// Visits the values of `field` as if no restriction on `field` applied.
    ///
    /// A filter on `field` is suspended for the duration of the scan so the
    /// values offered for building that filter are not narrowed by it.
    fn for_each_value(
        &self,
        field: u32,
        filter: Option<&dyn StateFilter>,
        f: &mut dyn FnMut(&ItemValue),
    ) {
        let suspended = self.hook.suspend_field(field);
        if suspended {
            self.cache.clear("field suspended");
        }
        algorithms::for_each_value(self, field, filter, f);
        if suspended {
            self.hook.resume_field(field);
            self.cache.clear("field resumed");
        }
    }

    fn can_sort(&self, spec: &SortSpec) -> bool {
        self.hook.can_sort(spec) || self.forward(false, |m| m.can_sort(spec))
    }

    fn sort(&self, spec: &SortSpec) -> bool {
        self.apply_sort(spec)
    }

    fn reset_sorting(&self) {
        if !self.hook.reset_sort() {
            self.forward((), |m| m.reset_sorting());
        }
        self.invalidate("sort reset");
    }

    fn compare(&self, a: ItemHandle, b: ItemHandle, spec: &SortSpec) -> Ordering {
        self.forward(Ordering::Equal, |m| {
            m.compare(self.to_master(a), self.to_master(b), spec)
        })
    }
}
