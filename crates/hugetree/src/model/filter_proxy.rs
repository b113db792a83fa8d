//! Filtering proxy.
//!
//! Filters form a stack: [`push_filter`](FilterProxyModel::push_filter)
//! adds one on top and [`pop_filter`](FilterProxyModel::pop_filter) removes
//! the most recent. An item is shown only if every active filter accepts
//! the value of its field. A recursive filter also accepts an item when any
//! descendant in the master carries an accepted value, which keeps the path
//! to a match visible.

use parking_lot::RwLock;

use hugetree_core::logging::targets;

use super::array_proxy::{ArrayProxyModel, ChildrenHook};
use super::handle::ItemHandle;
use super::traits::ItemModel;
use super::value::ItemValue;

/// Decides whether a single value passes.
///
/// Any `Fn(&ItemValue) -> bool` closure is a non-recursive filter; wrap it
/// with [`recursive`] to also accept ancestors of matches.
pub trait ValueFilter: Send + Sync {
    fn accepts(&self, value: &ItemValue) -> bool;

    /// Whether an item with a matching descendant is accepted too.
    fn is_recursive(&self) -> bool {
        false
    }
}

impl<F> ValueFilter for F
where
    F: Fn(&ItemValue) -> bool + Send + Sync,
{
    fn accepts(&self, value: &ItemValue) -> bool {
        self(value)
    }
}

/// A filter that also accepts ancestors of accepted items.
#[derive(Debug, Clone, Copy)]
pub struct Recursive<F>(pub F);

impl<F: ValueFilter> ValueFilter for Recursive<F> {
    fn accepts(&self, value: &ItemValue) -> bool {
        self.0.accepts(value)
    }

    fn is_recursive(&self) -> bool {
        true
    }
}

/// Wraps `filter` so it accepts ancestors of matching items.
pub fn recursive<F: ValueFilter>(filter: F) -> Recursive<F> {
    Recursive(filter)
}

struct FilterEntry {
    field: u32,
    filter: Box<dyn ValueFilter>,
    active: bool,
}

/// Keeps the master children accepted by every active filter.
#[derive(Default)]
pub struct FilterChildren {
    filters: RwLock<Vec<FilterEntry>>,
}

impl std::fmt::Debug for FilterChildren {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filters = self.filters.read();
        f.debug_list()
            .entries(filters.iter().map(|e| (e.field, e.active)))
            .finish()
    }
}

impl FilterChildren {
    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }

    /// Whether `item` of `master` passes every active filter.
    pub fn is_accepted(&self, master: &dyn ItemModel, item: ItemHandle) -> bool {
        self.check(master, item, true)
    }

    /// Whether `item` itself carries a value every active filter accepts.
    ///
    /// Unlike [`is_accepted`](Self::is_accepted), a recursive filter does
    /// not pass an item through its descendants, and no subtree is walked.
    pub fn is_accepted_non_recursive(&self, master: &dyn ItemModel, item: ItemHandle) -> bool {
        self.check(master, item, false)
    }

    fn check(&self, master: &dyn ItemModel, item: ItemHandle, allow_recursive: bool) -> bool {
        self.filters
            .read()
            .iter()
            .filter(|entry| entry.active)
            .all(|entry| {
                entry.filter.accepts(&master.value(item, entry.field))
                    || (allow_recursive
                        && entry.filter.is_recursive()
                        && any_descendant(master, item, |d| {
                            entry.filter.accepts(&master.value(d, entry.field))
                        }))
            })
    }
}

/// Walks the full master subtree below `item`, ignoring expansion state.
fn any_descendant(
    master: &dyn ItemModel,
    item: ItemHandle,
    mut pred: impl FnMut(ItemHandle) -> bool,
) -> bool {
    let mut stack = vec![item];
    while let Some(node) = stack.pop() {
        let count = master.child_count(node);
        for i in 0..count {
            let child = master.child(node, i);
            if pred(child) {
                return true;
            }
            stack.push(child);
        }
    }
    false
}

impl ChildrenHook for FilterChildren {
    fn collect_children(&self, master: &dyn ItemModel, parent: ItemHandle, out: &mut Vec<ItemHandle>) {
        let count = master.child_count(parent);
        out.extend(
            (0..count)
                .map(|i| master.child(parent, i))
                .filter(|&child| self.is_accepted(master, child)),
        );
    }

    fn suspend_field(&self, field: u32) -> bool {
        let mut suspended = false;
        for entry in self.filters.write().iter_mut() {
            if entry.field == field && entry.active {
                entry.active = false;
                suspended = true;
            }
        }
        suspended
    }

    fn resume_field(&self, field: u32) {
        for entry in self.filters.write().iter_mut() {
            if entry.field == field {
                entry.active = true;
            }
        }
    }
}

/// A proxy that hides items rejected by a stack of value filters.
///
/// # Example
///
/// ```
/// use hugetree::model::{FilterProxyModel, ItemModel, ItemValue, ListModel, VecSource};
///
/// let list = ListModel::new(VecSource::with_extractor(vec![1u64, 2, 3, 4], 1, |n: &u64, _| {
///     ItemValue::UInt(*n)
/// }));
/// let mut proxy = FilterProxyModel::with_master(Box::new(list));
/// proxy.push_filter(0, |v: &ItemValue| v.as_uint().is_some_and(|n| n % 2 == 0));
///
/// assert_eq!(proxy.child_count(proxy.root()), 2);
/// proxy.pop_filter();
/// assert_eq!(proxy.child_count(proxy.root()), 4);
/// ```
pub type FilterProxyModel = ArrayProxyModel<FilterChildren>;

impl ArrayProxyModel<FilterChildren> {
    /// Pushes a filter on `field` on top of the stack.
    pub fn push_filter<F>(&mut self, field: u32, filter: F)
    where
        F: ValueFilter + 'static,
    {
        self.hook().filters.write().push(FilterEntry {
            field,
            filter: Box::new(filter),
            active: true,
        });
        tracing::debug!(target: targets::PROXY, proxy = %self.id(), field, "filter pushed");
        self.invalidate("filter pushed");
    }

    /// Removes the most recently pushed filter and returns its field.
    pub fn pop_filter(&mut self) -> Option<u32> {
        let entry = self.hook().filters.write().pop()?;
        tracing::debug!(target: targets::PROXY, proxy = %self.id(), field = entry.field, "filter popped");
        self.invalidate("filter popped");
        Some(entry.field)
    }

    pub fn filter_count(&self) -> usize {
        self.hook().len()
    }

    /// Whether the proxy item `item` passes every active filter.
    pub fn is_accepted(&self, item: ItemHandle) -> bool {
        self.master()
            .is_some_and(|master| self.hook().is_accepted(master, self.to_master(item)))
    }

    /// Whether the proxy item `item` is a match in its own right.
    ///
    /// Under a recursive filter, an ancestor kept only to lead to a match
    /// is accepted but is not a match itself; views use this to tell the
    /// two apart, for example to highlight matches only.
    pub fn is_accepted_non_recursive(&self, item: ItemHandle) -> bool {
        self.master().is_some_and(|master| {
            self.hook()
                .is_accepted_non_recursive(master, self.to_master(item))
        })
    }
}
