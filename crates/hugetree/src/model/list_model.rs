//! Flat list models.
//!
//! A list is a tree whose root is the only item with children. Every
//! derived operation therefore collapses to arithmetic on the row index:
//! the rank of row `r` is `r + 1`, stepping forward `n` items is `r + n`,
//! and the parent of every row is the root.
//!
//! [`ListModel`] adapts any [`ListSource`] (row-addressed data) into an
//! [`ItemModel`] with those closed forms. [`VecSource`] is the in-memory
//! source; [`VirtualSource`] computes rows on demand and never stores them.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;

use super::handle::ItemHandle;
use super::traits::{ItemModel, LeveledItem, ModelBase, StateFilter};
use super::value::{FieldCount, ItemValue, SortSpec};

/// Row-addressed access exposed by flat models.
///
/// Returned by [`ItemModel::as_list`] so callers can skip generic tree walks
/// when the model is known to be flat.
pub trait ListAccess {
    fn row_count(&self) -> u32;

    /// The handle of `row`, or invalid if out of range.
    fn item_for_row(&self, row: u32) -> ItemHandle;

    /// The row of `item`, or `None` if it is not a row of this list.
    fn row_of(&self, item: ItemHandle) -> Option<u32>;
}

/// Row-addressed data behind a [`ListModel`].
pub trait ListSource: Send + Sync {
    /// Number of rows.
    fn len(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fields per row.
    fn field_count(&self) -> u32 {
        1
    }

    fn value(&self, row: u32, field: u32) -> ItemValue;

    /// Stores a value. The default is read-only.
    fn set_value(&self, _row: u32, _field: u32, _value: ItemValue) -> bool {
        false
    }

    fn can_sort(&self, _spec: &SortSpec) -> bool {
        false
    }

    /// Re-orders rows. Returns `true` if the order may have changed.
    fn sort(&self, _spec: &SortSpec) -> bool {
        false
    }

    fn reset_sorting(&self) {}
}

/// Type alias for a value extractor function.
pub type ValueExtractor<T> = Arc<dyn Fn(&T, u32) -> ItemValue + Send + Sync>;

/// Type alias for a value setter function.
pub type ValueSetter<T> = Arc<dyn Fn(&mut T, u32, ItemValue) -> bool + Send + Sync>;

/// An in-memory list source with closure-based field extraction.
///
/// Sorting does not move the items; it installs a row permutation that
/// [`reset_sorting`](ListSource::reset_sorting) discards again.
///
/// # Example
///
/// ```
/// use hugetree::model::{ItemValue, VecSource};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let source = VecSource::with_extractor(
///     vec![Person { name: "Alice".into(), age: 30 }],
///     2,
///     |person, field| match field {
///         0 => ItemValue::from(person.name.as_str()),
///         1 => ItemValue::from(person.age),
///         _ => ItemValue::None,
///     },
/// );
/// ```
pub struct VecSource<T> {
    items: RwLock<Vec<T>>,
    order: RwLock<Option<Vec<u32>>>,
    fields: u32,
    extractor: ValueExtractor<T>,
    setter: Option<ValueSetter<T>>,
}

impl<T: Send + Sync + 'static> VecSource<T> {
    /// Creates a source with `fields` fields per row.
    pub fn with_extractor<F>(items: Vec<T>, fields: u32, extractor: F) -> Self
    where
        F: Fn(&T, u32) -> ItemValue + Send + Sync + 'static,
    {
        Self {
            items: RwLock::new(items),
            order: RwLock::new(None),
            fields,
            extractor: Arc::new(extractor),
            setter: None,
        }
    }

    /// Makes the source editable through `setter`.
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut T, u32, ItemValue) -> bool + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Appends an item; it becomes the last row even when sorted.
    pub fn push(&self, item: T) {
        let mut items = self.items.write();
        let index = clamp_len(items.len());
        items.push(item);
        if let Some(order) = self.order.write().as_mut() {
            order.push(index);
        }
    }

    /// Replaces every item and drops any sort order.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
        *self.order.write() = None;
    }

    /// Provides read access to the item displayed at `row`.
    pub fn with_row<F, R>(&self, row: u32, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        let index = self.storage_index(row)?;
        self.items.read().get(index).map(f)
    }

    fn storage_index(&self, row: u32) -> Option<usize> {
        match self.order.read().as_ref() {
            Some(order) => order.get(row as usize).map(|&i| i as usize),
            None => Some(row as usize),
        }
    }
}

fn clamp_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<T: Send + Sync + 'static> ListSource for VecSource<T> {
    fn len(&self) -> u32 {
        clamp_len(self.items.read().len())
    }

    fn field_count(&self) -> u32 {
        self.fields
    }

    fn value(&self, row: u32, field: u32) -> ItemValue {
        if field >= self.fields {
            return ItemValue::None;
        }
        self.with_row(row, |item| (self.extractor)(item, field))
            .unwrap_or_default()
    }

    fn set_value(&self, row: u32, field: u32, value: ItemValue) -> bool {
        let Some(setter) = &self.setter else {
            return false;
        };
        if field >= self.fields {
            return false;
        }
        let Some(index) = self.storage_index(row) else {
            return false;
        };
        self.items
            .write()
            .get_mut(index)
            .is_some_and(|item| setter(item, field, value))
    }

    fn can_sort(&self, spec: &SortSpec) -> bool {
        spec.keys.iter().all(|key| key.field < self.fields)
    }

    fn sort(&self, spec: &SortSpec) -> bool {
        if !self.can_sort(spec) {
            return false;
        }
        let items = self.items.read();
        let mut order: Vec<u32> = (0..clamp_len(items.len())).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&items[a as usize], &items[b as usize]);
            for key in &spec.keys {
                let ordering = (self.extractor)(a, key.field).compare(&(self.extractor)(b, key.field));
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
        });
        *self.order.write() = Some(order);
        true
    }

    fn reset_sorting(&self) {
        *self.order.write() = None;
    }
}

/// A list source whose rows are computed on demand.
///
/// Useful for lists far too large to materialize:
///
/// ```
/// use hugetree::model::{ItemModel, ItemValue, ListModel, VirtualSource};
///
/// let model = ListModel::new(VirtualSource::new(1_000_000_000, 1, |row, _| {
///     ItemValue::from(row as u64 * 2)
/// }));
/// let item = model.find_item(500_000_000, None, model.root(), 0);
/// assert_eq!(model.value(item, 0), ItemValue::UInt(999_999_998));
/// ```
pub struct VirtualSource<F> {
    len: u32,
    fields: u32,
    generator: F,
}

impl<F> VirtualSource<F>
where
    F: Fn(u32, u32) -> ItemValue + Send + Sync,
{
    pub fn new(len: u32, fields: u32, generator: F) -> Self {
        Self {
            len,
            fields,
            generator,
        }
    }
}

impl<F> ListSource for VirtualSource<F>
where
    F: Fn(u32, u32) -> ItemValue + Send + Sync,
{
    fn len(&self) -> u32 {
        self.len
    }

    fn field_count(&self) -> u32 {
        self.fields
    }

    fn value(&self, row: u32, field: u32) -> ItemValue {
        if row >= self.len || field >= self.fields {
            return ItemValue::None;
        }
        (self.generator)(row, field)
    }
}

/// A flat model over a [`ListSource`].
///
/// Row `r` is addressed by a handle with id `r + 1`, so the root (id 0) is
/// never confused with the first row.
pub struct ListModel<S> {
    base: ModelBase,
    source: S,
}

impl<S: ListSource> ListModel<S> {
    pub fn new(source: S) -> Self {
        Self {
            base: ModelBase::new(),
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of rows.
    pub fn len(&self) -> u32 {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The handle for `row`, or invalid if out of range.
    pub fn item(&self, row: u32) -> ItemHandle {
        if row >= self.source.len() {
            return ItemHandle::invalid();
        }
        ItemHandle::new(u64::from(row) + 1, row, 0, self.id()).with_child_index(row)
    }

    /// The row addressed by `item`.
    pub fn row(&self, item: ItemHandle) -> Option<u32> {
        if !item.is_ok() || item.id() != u64::from(item.row()) + 1 {
            return None;
        }
        (item.row() < self.source.len()).then_some(item.row())
    }

    /// Tells views that rows were added, removed or replaced behind the
    /// model's back.
    pub fn notify_reset(&self) {
        self.base.signals().model_reset.emit(());
    }
}

impl<T: Send + Sync + 'static> ListModel<VecSource<T>> {
    /// Appends an item and notifies views.
    pub fn push(&self, item: T) {
        self.source.push(item);
        self.base.signals().layout_changed.emit(());
    }

    /// Replaces all items and notifies views.
    pub fn set_items(&self, items: Vec<T>) {
        self.base.signals().emit_reset(|| self.source.set_items(items));
    }
}

impl<S: ListSource> ListAccess for ListModel<S> {
    fn row_count(&self) -> u32 {
        self.len()
    }

    fn item_for_row(&self, row: u32) -> ItemHandle {
        self.item(row)
    }

    fn row_of(&self, item: ItemHandle) -> Option<u32> {
        self.row(item)
    }
}

impl<S: ListSource> ItemModel for ListModel<S> {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn parent(&self, item: ItemHandle) -> ItemHandle {
        match self.row(item) {
            Some(_) => self.root(),
            None => ItemHandle::invalid(),
        }
    }

    fn child_count(&self, item: ItemHandle) -> u32 {
        if item.is_root() { self.len() } else { 0 }
    }

    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle {
        if parent.is_root() {
            self.item(index)
        } else {
            ItemHandle::invalid()
        }
    }

    fn as_list(&self) -> Option<&dyn ListAccess> {
        Some(self)
    }

    fn field_count(&self, item: ItemHandle) -> FieldCount {
        if item.is_ok() {
            FieldCount::Fields(self.source.field_count())
        } else {
            FieldCount::Fields(0)
        }
    }

    fn value(&self, item: ItemHandle, field: u32) -> ItemValue {
        match self.row(item) {
            Some(row) => self.source.value(row, field),
            None => ItemValue::None,
        }
    }

    fn set_value(&self, item: ItemHandle, field: u32, value: ItemValue) -> bool {
        let Some(row) = self.row(item) else {
            return false;
        };
        if !self.source.set_value(row, field, value) {
            return false;
        }
        self.base.signals().data_changed.emit((item, field));
        true
    }

    fn child_index(&self, parent: ItemHandle, child: ItemHandle) -> Option<u32> {
        if parent.is_root() { self.row(child) } else { None }
    }

    fn depth(&self, item: ItemHandle) -> usize {
        if self.row(item).is_some() { 1 } else { 0 }
    }

    fn next_sibling(&self, item: ItemHandle) -> ItemHandle {
        match self.row(item) {
            Some(row) => self.item(row.saturating_add(1)),
            None => ItemHandle::invalid(),
        }
    }

    fn prev_sibling(&self, item: ItemHandle) -> ItemHandle {
        match self.row(item) {
            Some(row) if row > 0 => self.item(row - 1),
            _ => ItemHandle::invalid(),
        }
    }

    fn first_descendant(&self, item: ItemHandle, _filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.first_child(item)
    }

    fn last_descendant(&self, item: ItemHandle, _filter: Option<&dyn StateFilter>) -> ItemHandle {
        self.last_child(item)
    }

    fn is_ancestor_of(&self, ancestor: ItemHandle, item: ItemHandle) -> bool {
        ancestor.is_root() && self.row(item).is_some()
    }

    fn next_item_at(
        &self,
        start: LeveledItem,
        _filter: Option<&dyn StateFilter>,
        count: u64,
    ) -> LeveledItem {
        match self.item_rank(start.item, None) {
            Some(rank) if count > 0 => {
                let item = self.find_item(rank.saturating_add(count), None, start.item, rank);
                if item.is_invalid() {
                    LeveledItem::invalid()
                } else {
                    LeveledItem::new(item, 1)
                }
            }
            Some(_) => start,
            None => LeveledItem::invalid(),
        }
    }

    fn prev_item_at(
        &self,
        start: LeveledItem,
        _filter: Option<&dyn StateFilter>,
        count: u64,
    ) -> LeveledItem {
        match self.item_rank(start.item, None) {
            Some(rank) if count > 0 && count <= rank => {
                let target = rank - count;
                if target == 0 {
                    LeveledItem::new(self.root(), 0)
                } else {
                    LeveledItem::new(self.find_item(target, None, start.item, rank), 1)
                }
            }
            Some(_) if count == 0 => start,
            _ => LeveledItem::invalid(),
        }
    }

    fn subtree_size(&self, item: ItemHandle, _filter: Option<&dyn StateFilter>) -> u64 {
        if item.is_root() {
            u64::from(self.len()) + 1
        } else if self.row(item).is_some() {
            1
        } else {
            0
        }
    }

    fn find_item(
        &self,
        rank: u64,
        _filter: Option<&dyn StateFilter>,
        _start: ItemHandle,
        _start_rank: u64,
    ) -> ItemHandle {
        match rank {
            0 => self.root(),
            rank => u32::try_from(rank - 1)
                .map(|row| self.item(row))
                .unwrap_or_else(|_| ItemHandle::invalid()),
        }
    }

    fn item_rank(&self, item: ItemHandle, _filter: Option<&dyn StateFilter>) -> Option<u64> {
        if item.is_root() {
            return Some(0);
        }
        self.row(item).map(|row| u64::from(row) + 1)
    }

    fn can_sort(&self, spec: &SortSpec) -> bool {
        self.source.can_sort(spec)
    }

    fn sort(&self, spec: &SortSpec) -> bool {
        let sorted = self.source.sort(spec);
        if sorted {
            self.base.signals().layout_changed.emit(());
        }
        sorted
    }

    fn reset_sorting(&self) {
        self.source.reset_sorting();
        self.base.signals().layout_changed.emit(());
    }
}
