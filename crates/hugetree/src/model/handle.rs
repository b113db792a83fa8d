//! Item handles for addressing items in very large models.
//!
//! An [`ItemHandle`] is the universal value passed between models, proxies,
//! state trackers and views. It is small, `Copy`, and never allocates.
//!
//! Equality, ordering and hashing only look at the three identity fields
//! (`id`, `row`, `column`). The owning model and the cached child index are
//! deliberately ignored so that a proxy layer can re-own a handle from its
//! master and still have it compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use static_assertions::const_assert;

/// A global counter for minting model identifiers.
static MODEL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier for a model instance.
///
/// Handles carry a `ModelId` as a non-owning back-reference to the model
/// that produced them. Resolve it through a proxy chain with
/// [`find_layer`](super::find_layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(NonZeroU64);

impl ModelId {
    /// Mint a fresh identifier.
    pub fn next() -> Self {
        let raw = MODEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 models to wrap.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Identifies a single item in a model.
///
/// # Special values
///
/// | value | id fields | owner |
/// |-------|-----------|-------|
/// | invalid | all zero | `None` |
/// | root | all zero | `Some` |
/// | ok | `id != 0` | `Some` |
///
/// Handles should be treated as short-lived. A model that hands out
/// handles which must survive mutation is responsible for keeping its ids
/// stable; otherwise use a [`TreePath`](super::TreePath).
#[derive(Clone, Copy)]
pub struct ItemHandle {
    id: u64,
    row: u32,
    column: u32,
    model: Option<ModelId>,
    child_index: u32,
}

const_assert!(std::mem::size_of::<ItemHandle>() <= 32);

impl Default for ItemHandle {
    fn default() -> Self {
        Self::invalid()
    }
}

impl ItemHandle {
    /// Sentinel stored in the child index hint when the position is unknown.
    pub const UNKNOWN_CHILD_INDEX: u32 = u32::MAX;

    /// The invalid handle.
    #[inline]
    pub const fn invalid() -> Self {
        Self {
            id: 0,
            row: 0,
            column: 0,
            model: None,
            child_index: Self::UNKNOWN_CHILD_INDEX,
        }
    }

    /// The root handle of `model`.
    #[inline]
    pub const fn root(model: ModelId) -> Self {
        Self {
            id: 0,
            row: 0,
            column: 0,
            model: Some(model),
            child_index: Self::UNKNOWN_CHILD_INDEX,
        }
    }

    /// Create a handle from a 64-bit id.
    #[inline]
    pub const fn new(id: u64, row: u32, column: u32, model: ModelId) -> Self {
        Self {
            id,
            row,
            column,
            model: Some(model),
            child_index: Self::UNKNOWN_CHILD_INDEX,
        }
    }

    /// Create a handle from a 32-bit id.
    #[inline]
    pub const fn from_u32(id: u32, row: u32, column: u32, model: ModelId) -> Self {
        Self::new(id as u64, row, column, model)
    }

    /// Create a handle whose id is an address-sized value.
    #[inline]
    pub const fn from_ptr(ptr: usize, row: u32, column: u32, model: ModelId) -> Self {
        Self::new(ptr as u64, row, column, model)
    }

    /// Attach a known child index to this handle.
    #[inline]
    pub const fn with_child_index(mut self, index: u32) -> Self {
        self.child_index = index;
        self
    }

    /// All three identity fields are zero, whatever the owner.
    #[inline]
    pub const fn is_root_or_invalid(&self) -> bool {
        self.id == 0 && self.row == 0 && self.column == 0
    }

    /// Zero identity fields and no owner.
    #[inline]
    pub const fn is_invalid(&self) -> bool {
        self.is_root_or_invalid() && self.model.is_none()
    }

    /// Zero identity fields with an owner.
    #[inline]
    pub const fn is_root(&self) -> bool {
        self.is_root_or_invalid() && self.model.is_some()
    }

    /// A non-root item owned by a model.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.id != 0 && self.model.is_some()
    }

    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The id truncated to 32 bits.
    #[inline]
    pub const fn id_u32(&self) -> u32 {
        self.id as u32
    }

    /// The id as an address-sized value.
    #[inline]
    pub const fn id_ptr(&self) -> usize {
        self.id as usize
    }

    #[inline]
    pub fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    #[inline]
    pub const fn row(&self) -> u32 {
        self.row
    }

    #[inline]
    pub fn set_row(&mut self, row: u32) {
        self.row = row;
    }

    #[inline]
    pub const fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn set_column(&mut self, column: u32) {
        self.column = column;
    }

    /// The model that produced this handle.
    #[inline]
    pub const fn model(&self) -> Option<ModelId> {
        self.model
    }

    #[inline]
    pub fn set_model(&mut self, model: Option<ModelId>) {
        self.model = model;
    }

    /// Returns a copy of this handle owned by `model`.
    ///
    /// Identity fields and the child index hint are preserved.
    #[inline]
    pub const fn reowned(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }

    /// The cached position of this item among its siblings, if known.
    #[inline]
    pub const fn child_index_hint(&self) -> Option<u32> {
        if self.child_index == Self::UNKNOWN_CHILD_INDEX {
            None
        } else {
            Some(self.child_index)
        }
    }

    #[inline]
    pub fn set_child_index_hint(&mut self, index: u32) {
        self.child_index = index;
    }

    /// Forget the cached child index.
    ///
    /// Must be called whenever the item is re-derived without a known position.
    #[inline]
    pub fn reset_child_index_hint(&mut self) {
        self.child_index = Self::UNKNOWN_CHILD_INDEX;
    }

    /// Identity equality; owner and hint are ignored.
    #[inline]
    pub const fn is_same(&self, other: &Self) -> bool {
        self.id == other.id && self.row == other.row && self.column == other.column
    }

    /// Identity ordering: by id, then row, then column.
    #[inline]
    pub const fn is_less(&self, other: &Self) -> bool {
        if self.id != other.id {
            return self.id < other.id;
        }
        if self.row != other.row {
            return self.row < other.row;
        }
        self.column < other.column
    }

    /// FNV-1a over the identity fields.
    pub const fn hash_code(&self) -> u64 {
        let mut hash = FNV_OFFSET_BASIS;
        let id = self.id.to_le_bytes();
        let mut i = 0;
        while i < id.len() {
            hash ^= id[i] as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        let row = self.row.to_le_bytes();
        let column = self.column.to_le_bytes();
        let mut j = 0;
        while j < 4 {
            hash ^= row[j] as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
            j += 1;
        }
        let mut k = 0;
        while k < 4 {
            hash ^= column[k] as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
            k += 1;
        }
        hash
    }
}

impl fmt::Debug for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            return write!(f, "ItemHandle(invalid)");
        }
        if self.is_root() {
            return match self.model {
                Some(model) => write!(f, "ItemHandle(root of {model})"),
                None => write!(f, "ItemHandle(root)"),
            };
        }
        let mut s = f.debug_struct("ItemHandle");
        s.field("id", &self.id)
            .field("row", &self.row)
            .field("column", &self.column);
        if let Some(model) = self.model {
            s.field("model", &model.get());
        }
        if let Some(index) = self.child_index_hint() {
            s.field("child_index", &index);
        }
        s.finish()
    }
}

impl PartialEq for ItemHandle {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for ItemHandle {}

impl Hash for ItemHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl PartialOrd for ItemHandle {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemHandle {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.id, self.row, self.column).cmp(&(other.id, other.row, other.column))
    }
}
