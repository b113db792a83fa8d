//! Cell values, check states and sort specifications.
//!
//! Models expose one [`ItemValue`] per (item, field). Values are small owned
//! scalars; anything richer belongs to the rendering layer.

use std::cmp::Ordering;
use std::fmt;

/// Check state for checkable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckState {
    /// Item is unchecked.
    #[default]
    Unchecked,
    /// Item is checked.
    Checked,
    /// Some but not all descendants are checked.
    PartiallyChecked,
}

impl CheckState {
    /// Returns `true` if the item is checked (fully or partially).
    pub fn is_checked(&self) -> bool {
        !matches!(self, CheckState::Unchecked)
    }

    /// Returns `true` if the item is fully checked.
    pub fn is_fully_checked(&self) -> bool {
        matches!(self, CheckState::Checked)
    }

    /// Toggles between Unchecked and Checked.
    /// PartiallyChecked becomes Checked.
    pub fn toggle(&self) -> CheckState {
        match self {
            CheckState::Unchecked | CheckState::PartiallyChecked => CheckState::Checked,
            CheckState::Checked => CheckState::Unchecked,
        }
    }

    /// Two-bit encoding used by the state trackers.
    pub(crate) const fn to_bits(self) -> u32 {
        match self {
            CheckState::Unchecked => 0,
            CheckState::Checked => 1,
            CheckState::PartiallyChecked => 2,
        }
    }

    pub(crate) const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            1 => CheckState::Checked,
            2 => CheckState::PartiallyChecked,
            _ => CheckState::Unchecked,
        }
    }
}

/// Number of fields (sub-columns) an item provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCount {
    /// The item has this many fields.
    Fields(u32),
    /// The item spans every column (group and category rows).
    SpanAll,
}

impl FieldCount {
    /// Number of fields that should be visited when scanning values.
    ///
    /// A spanning item only has field 0.
    pub fn scan_count(self) -> u32 {
        match self {
            FieldCount::Fields(n) => n,
            FieldCount::SpanAll => 1,
        }
    }
}

impl Default for FieldCount {
    fn default() -> Self {
        FieldCount::Fields(1)
    }
}

/// The value stored in one field of one item.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemValue {
    /// No data.
    #[default]
    None,
    /// Text.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Check state.
    CheckState(CheckState),
}

impl ItemValue {
    /// Returns `true` if this is `ItemValue::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, ItemValue::None)
    }

    /// Returns `true` if this contains some data.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the value as a signed integer.
    ///
    /// Unsigned values that fit are converted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ItemValue::Int(n) => Some(*n),
            ItemValue::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Attempts to get the value as an unsigned integer.
    ///
    /// Non-negative signed values are converted.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            ItemValue::UInt(n) => Some(*n),
            ItemValue::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Attempts to get the value as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ItemValue::Float(n) => Some(*n),
            ItemValue::Int(n) => Some(*n as f64),
            ItemValue::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Attempts to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the value as a check state.
    pub fn as_check_state(&self) -> Option<CheckState> {
        match self {
            ItemValue::CheckState(s) => Some(*s),
            _ => None,
        }
    }

    /// Total order used for sorting.
    ///
    /// `None` sorts first; numbers compare numerically across integer and
    /// float variants; otherwise values of different kinds order by kind.
    pub fn compare(&self, other: &ItemValue) -> Ordering {
        use ItemValue::*;
        match (self, other) {
            (None, None) => Ordering::Equal,
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,
            (String(a), String(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (UInt(a), UInt(b)) => a.cmp(b),
            (Bool(a), Bool(b)) => a.cmp(b),
            (CheckState(a), CheckState(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a
                    .as_float()
                    .unwrap_or_default()
                    .total_cmp(&b.as_float().unwrap_or_default()),
            },
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ItemValue::Int(_) | ItemValue::UInt(_) | ItemValue::Float(_))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            ItemValue::None => 0,
            ItemValue::Bool(_) => 1,
            ItemValue::Int(_) | ItemValue::UInt(_) | ItemValue::Float(_) => 2,
            ItemValue::CheckState(_) => 3,
            ItemValue::String(_) => 4,
        }
    }
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::None => Ok(()),
            ItemValue::String(s) => f.write_str(s),
            ItemValue::Int(n) => write!(f, "{n}"),
            ItemValue::UInt(n) => write!(f, "{n}"),
            ItemValue::Float(n) => write!(f, "{n}"),
            ItemValue::Bool(b) => write!(f, "{b}"),
            ItemValue::CheckState(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<String> for ItemValue {
    fn from(s: String) -> Self {
        ItemValue::String(s)
    }
}

impl From<&str> for ItemValue {
    fn from(s: &str) -> Self {
        ItemValue::String(s.to_string())
    }
}

impl From<i64> for ItemValue {
    fn from(n: i64) -> Self {
        ItemValue::Int(n)
    }
}

impl From<i32> for ItemValue {
    fn from(n: i32) -> Self {
        ItemValue::Int(n as i64)
    }
}

impl From<u64> for ItemValue {
    fn from(n: u64) -> Self {
        ItemValue::UInt(n)
    }
}

impl From<u32> for ItemValue {
    fn from(n: u32) -> Self {
        ItemValue::UInt(n as u64)
    }
}

impl From<f64> for ItemValue {
    fn from(n: f64) -> Self {
        ItemValue::Float(n)
    }
}

impl From<bool> for ItemValue {
    fn from(b: bool) -> Self {
        ItemValue::Bool(b)
    }
}

impl From<CheckState> for ItemValue {
    fn from(s: CheckState) -> Self {
        ItemValue::CheckState(s)
    }
}

impl<T: Into<ItemValue>> From<Option<T>> for ItemValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(ItemValue::None, Into::into)
    }
}

/// A scalar type that can be extracted from an [`ItemValue`].
///
/// Used by [`ItemModelExt::all_values`](super::ItemModelExt::all_values) to
/// collect the distinct values of a field.
pub trait ScalarValue: Ord + Sized {
    /// Extract a value of this type, or `None` if the value has another kind.
    fn from_item_value(value: &ItemValue) -> Option<Self>;
}

impl ScalarValue for String {
    fn from_item_value(value: &ItemValue) -> Option<Self> {
        match value {
            ItemValue::None => None,
            ItemValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl ScalarValue for i64 {
    fn from_item_value(value: &ItemValue) -> Option<Self> {
        value.as_int()
    }
}

impl ScalarValue for u64 {
    fn from_item_value(value: &ItemValue) -> Option<Self> {
        value.as_uint()
    }
}

impl ScalarValue for bool {
    fn from_item_value(value: &ItemValue) -> Option<Self> {
        value.as_bool()
    }
}

impl ScalarValue for CheckState {
    fn from_item_value(value: &ItemValue) -> Option<Self> {
        value.as_check_state()
    }
}

/// One sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortKey {
    /// The field to compare.
    pub field: u32,
    /// Reverse the order for this key.
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: u32) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn descending(field: u32) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// An ordered list of sort keys; earlier keys take precedence.
///
/// An empty spec means "intrinsic order".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    /// A spec with no keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by a single field.
    pub fn by(field: u32, descending: bool) -> Self {
        Self {
            keys: vec![SortKey { field, descending }],
        }
    }

    /// Append a tie-breaking key.
    pub fn then_by(mut self, field: u32, descending: bool) -> Self {
        self.keys.push(SortKey { field, descending });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_state_toggle() {
        assert_eq!(CheckState::Unchecked.toggle(), CheckState::Checked);
        assert_eq!(CheckState::Checked.toggle(), CheckState::Unchecked);
        assert_eq!(CheckState::PartiallyChecked.toggle(), CheckState::Checked);
    }

    #[test]
    fn test_check_state_bits() {
        for state in [
            CheckState::Unchecked,
            CheckState::Checked,
            CheckState::PartiallyChecked,
        ] {
            assert_eq!(CheckState::from_bits(state.to_bits()), state);
        }
        assert_eq!(CheckState::from_bits(3), CheckState::Unchecked);
    }

    #[test]
    fn test_field_count_scan() {
        assert_eq!(FieldCount::Fields(4).scan_count(), 4);
        assert_eq!(FieldCount::SpanAll.scan_count(), 1);
    }

    #[test]
    fn test_value_accessors() {
        let value = ItemValue::from("hello");
        assert_eq!(value.as_str(), Some("hello"));
        assert!(value.as_int().is_none());
        assert_eq!(ItemValue::UInt(5).as_int(), Some(5));
        assert_eq!(ItemValue::Int(-1).as_uint(), None);
        assert_eq!(ItemValue::from(Some(3i64)), ItemValue::Int(3));
        assert!(ItemValue::from(Option::<bool>::None).is_none());
    }

    #[test]
    fn test_value_compare() {
        assert_eq!(ItemValue::None.compare(&ItemValue::Int(0)), Ordering::Less);
        assert_eq!(ItemValue::Int(2).compare(&ItemValue::UInt(10)), Ordering::Less);
        assert_eq!(ItemValue::Float(2.5).compare(&ItemValue::Int(2)), Ordering::Greater);
        assert_eq!(
            ItemValue::from("b").compare(&ItemValue::from("a")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_scalar_extraction() {
        assert_eq!(String::from_item_value(&ItemValue::Int(7)), Some("7".to_string()));
        assert_eq!(String::from_item_value(&ItemValue::None), None);
        assert_eq!(u64::from_item_value(&ItemValue::Int(7)), Some(7));
        assert_eq!(bool::from_item_value(&ItemValue::Int(7)), None);
    }

    #[test]
    fn test_sort_spec_builder() {
        let spec = SortSpec::by(1, false).then_by(0, true);
        assert_eq!(spec.keys.len(), 2);
        assert_eq!(spec.keys[1], SortKey::descending(0));
        assert!(SortSpec::new().is_empty());
    }
}
