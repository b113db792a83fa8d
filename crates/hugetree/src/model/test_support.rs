//! Call-counting models shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::handle::ItemHandle;
use super::traits::{ItemModel, ModelBase};
use super::value::{FieldCount, ItemValue};

/// A minimal tree that only implements the mandatory tier and counts calls.
///
/// Item `n` has id `n`; id 0 is the root. Field 0 holds `"item-{n}"` and
/// field 1 holds `n` as an unsigned integer.
pub(crate) struct CountingTree {
    base: ModelBase,
    children: HashMap<u64, Vec<u64>>,
    parents: HashMap<u64, u64>,
    child_calls: AtomicUsize,
    child_count_calls: AtomicUsize,
}

impl CountingTree {
    pub(crate) fn from_edges(edges: &[(u64, u64)]) -> Self {
        let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
        let mut parents = HashMap::new();
        for &(parent, child) in edges {
            children.entry(parent).or_default().push(child);
            parents.insert(child, parent);
        }
        Self {
            base: ModelBase::new(),
            children,
            parents,
            child_calls: AtomicUsize::new(0),
            child_count_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn item(&self, id: u64) -> ItemHandle {
        if id == 0 {
            return self.root();
        }
        let index = self
            .parents
            .get(&id)
            .and_then(|parent| self.children.get(parent))
            .and_then(|siblings| siblings.iter().position(|&c| c == id))
            .unwrap_or(0);
        ItemHandle::new(id, 0, 0, self.id()).with_child_index(index as u32)
    }

    pub(crate) fn child_calls(&self) -> usize {
        self.child_calls.load(Ordering::Relaxed)
    }

    pub(crate) fn child_count_calls(&self) -> usize {
        self.child_count_calls.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_counts(&self) {
        self.child_calls.store(0, Ordering::Relaxed);
        self.child_count_calls.store(0, Ordering::Relaxed);
    }

    fn key(&self, item: ItemHandle) -> Option<u64> {
        if item.is_root() {
            Some(0)
        } else if item.is_ok() && self.parents.contains_key(&item.id()) {
            Some(item.id())
        } else {
            None
        }
    }
}

impl ItemModel for CountingTree {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn parent(&self, item: ItemHandle) -> ItemHandle {
        match self.key(item) {
            Some(0) | None => ItemHandle::invalid(),
            Some(id) => self.item(self.parents[&id]),
        }
    }

    fn child_count(&self, item: ItemHandle) -> u32 {
        self.child_count_calls.fetch_add(1, Ordering::Relaxed);
        self.key(item)
            .and_then(|id| self.children.get(&id))
            .map_or(0, |c| c.len() as u32)
    }

    fn child(&self, parent: ItemHandle, index: u32) -> ItemHandle {
        self.child_calls.fetch_add(1, Ordering::Relaxed);
        match self
            .key(parent)
            .and_then(|id| self.children.get(&id))
            .and_then(|c| c.get(index as usize))
        {
            Some(&id) => ItemHandle::new(id, 0, 0, self.id()).with_child_index(index),
            None => ItemHandle::invalid(),
        }
    }

    fn field_count(&self, _item: ItemHandle) -> FieldCount {
        FieldCount::Fields(2)
    }

    fn value(&self, item: ItemHandle, field: u32) -> ItemValue {
        match (self.key(item), field) {
            (Some(0) | None, _) => ItemValue::None,
            (Some(id), 0) => ItemValue::from(format!("item-{id}")),
            (Some(id), 1) => ItemValue::UInt(id),
            _ => ItemValue::None,
        }
    }
}
