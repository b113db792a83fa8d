//! Text search over item values.
//!
//! [`SearchOptions`] describes what to look for; [`Matcher`] is the compiled
//! form handed to [`ItemModel::find_first`](super::ItemModel::find_first)
//! and friends. Plain patterns are escaped and compiled into the same
//! regular expression engine as regex patterns, so every combination of
//! `exact`, `case_sensitive` and `regex` goes through one code path.

use hugetree_core::{Error, Result};
use regex::{Regex, RegexBuilder};

use super::handle::ItemHandle;
use super::traits::ItemModel;
use super::value::{FieldCount, ItemValue};

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// Text or regular expression to look for.
    pub pattern: String,
    /// Restrict the search to one field; `None` searches every field.
    pub field: Option<u32>,
    /// The whole value must match, not just a substring.
    pub exact: bool,
    pub case_sensitive: bool,
    /// Interpret `pattern` as a regular expression.
    pub regex: bool,
}

impl SearchOptions {
    /// A case-insensitive substring search for `pattern` in every field.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn in_field(mut self, field: u32) -> Self {
        self.field = Some(field);
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Compile these options.
    pub fn compile(&self) -> Result<Matcher> {
        Matcher::new(self)
    }
}

/// Compiled search options.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    field: Option<u32>,
}

impl Matcher {
    /// Compile `options`.
    ///
    /// Fails with [`Error::InvalidPattern`] if a regex pattern does not parse.
    pub fn new(options: &SearchOptions) -> Result<Self> {
        let body = if options.regex {
            options.pattern.clone()
        } else {
            regex::escape(&options.pattern)
        };
        let source = if options.exact {
            format!("^(?:{body})$")
        } else {
            body
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|err| Error::invalid_pattern(options.pattern.clone(), err))?;

        Ok(Self {
            regex,
            field: options.field,
        })
    }

    /// The field this matcher is restricted to, if any.
    pub fn field(&self) -> Option<u32> {
        self.field
    }

    /// Returns `true` if the textual form of `value` matches.
    ///
    /// Empty values never match.
    pub fn matches_value(&self, value: &ItemValue) -> bool {
        match value {
            ItemValue::None => false,
            ItemValue::String(s) => self.regex.is_match(s),
            other => self.regex.is_match(&other.to_string()),
        }
    }

    /// Returns `true` if any searched field of `item` matches.
    pub fn matches<M: ItemModel + ?Sized>(&self, model: &M, item: ItemHandle) -> bool {
        let fields = model.field_count(item);
        match self.field {
            Some(field) => {
                // A spanning row only has field 0 but shows it in every column.
                let field = if fields == FieldCount::SpanAll { 0 } else { field };
                field < fields.scan_count() && self.matches_value(&model.value(item, field))
            }
            None => (0..fields.scan_count()).any(|f| self.matches_value(&model.value(item, f))),
        }
    }
}
