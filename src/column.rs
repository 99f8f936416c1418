//! Column layout of a fixed-length record.
//!
//! A [`ColumnLayout`] is built once, either with [`LayoutBuilder`] or from a
//! JSON document (see [`crate::config`]), and is read-only afterwards.
//!
//! ```
//! use fixed_length_rs::{ColumnDef, ColumnLayout, TrimMode};
//!
//! // Record layout: Id(5) Name(21) Balance(15)
//! let layout = ColumnLayout::builder()
//!     .column(ColumnDef::new(0, 5).named("Id").trim(TrimMode::TrimStart).trim_chars("0"))
//!     .column(ColumnDef::new(5, 21).named("Name").trim(TrimMode::TrimEnd).empty_is_null())
//!     .column(ColumnDef::new(26, 15).named("Balance"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(layout.resolve("Balance").unwrap(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{FixedLengthError, Result};
use crate::trim::TrimMode;

/// Predicate deciding whether a decoded field is null.
pub type NullPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// When a decoded, trimmed field counts as null.
#[derive(Clone, Default)]
pub enum NullPolicy {
    /// Never null.
    #[default]
    Never,
    /// Null when the field is empty.
    EmptyIsNull,
    /// Null when the predicate returns `true`.
    Predicate(NullPredicate),
}

impl NullPolicy {
    pub fn is_null(&self, value: &str) -> bool {
        match self {
            NullPolicy::Never => false,
            NullPolicy::EmptyIsNull => value.is_empty(),
            NullPolicy::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullPolicy::Never => f.write_str("Never"),
            NullPolicy::EmptyIsNull => f.write_str("EmptyIsNull"),
            NullPolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// One column of a record layout.
#[derive(Debug, Clone)]
pub struct Column {
    ordinal: usize,
    name: Option<String>,
    offset: usize,
    length: usize,
    trim_mode: TrimMode,
    trim_chars: Option<Vec<char>>,
    null_policy: NullPolicy,
}

impl Column {
    /// Zero-based position in declaration order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Byte offset from the start of the record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn trim_mode(&self) -> TrimMode {
        self.trim_mode
    }

    pub fn trim_chars(&self) -> Option<&[char]> {
        self.trim_chars.as_deref()
    }

    pub fn null_policy(&self) -> &NullPolicy {
        &self.null_policy
    }

    pub fn is_null(&self, value: &str) -> bool {
        self.null_policy.is_null(value)
    }
}

/// Declaration of a column before it is assigned an ordinal.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: Option<String>,
    offset: usize,
    length: usize,
    trim_mode: TrimMode,
    trim_chars: Option<Vec<char>>,
    null_policy: NullPolicy,
}

impl ColumnDef {
    /// Unnamed, untrimmed, never-null column spanning `length` bytes at `offset`.
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            name: None,
            offset,
            length,
            trim_mode: TrimMode::None,
            trim_chars: None,
            null_policy: NullPolicy::Never,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn trim(mut self, trim_mode: TrimMode) -> Self {
        self.trim_mode = trim_mode;
        self
    }

    /// Characters removed by trimming instead of whitespace.
    pub fn trim_chars(mut self, chars: &str) -> Self {
        self.trim_chars = Some(chars.chars().collect());
        self
    }

    pub fn empty_is_null(self) -> Self {
        self.null_policy(NullPolicy::EmptyIsNull)
    }

    pub fn null_when<F>(self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.null_policy(NullPolicy::Predicate(Arc::new(predicate)))
    }

    pub fn null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = policy;
        self
    }

    fn into_column(self, ordinal: usize) -> Column {
        Column {
            ordinal,
            name: self.name,
            offset: self.offset,
            length: self.length,
            trim_mode: self.trim_mode,
            trim_chars: self.trim_chars,
            null_policy: self.null_policy,
        }
    }
}

/// Builds a [`ColumnLayout`], assigning ordinals in declaration order.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    columns: Vec<ColumnDef>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Finish the layout.
    ///
    /// # Errors
    /// [`FixedLengthError::InvalidLayout`] if two columns share a name.
    pub fn build(self) -> Result<ColumnLayout> {
        let columns = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(ordinal, def)| def.into_column(ordinal))
            .collect();
        ColumnLayout::from_columns(columns)
    }
}

/// Ordered, immutable set of columns with lookup by name.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    ordinals: HashMap<String, usize>,
}

impl ColumnLayout {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::new()
    }

    /// `columns[i]` must carry ordinal `i`.
    fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut ordinals = HashMap::with_capacity(columns.len());
        for column in &columns {
            if let Some(name) = &column.name
                && ordinals.insert(name.clone(), column.ordinal).is_some()
            {
                return Err(FixedLengthError::InvalidLayout(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        Ok(Self { columns, ordinals })
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// Ordinal of the column named `name`.
    ///
    /// # Errors
    /// [`FixedLengthError::ColumnNotFound`] if no column has that name.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.ordinals
            .get(name)
            .copied()
            .ok_or_else(|| FixedLengthError::ColumnNotFound(name.to_string()))
    }
}

impl<'a> IntoIterator for &'a ColumnLayout {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

// ---------------------------------------------------------------------------
// Raw construction used by the JSON loader
// ---------------------------------------------------------------------------

pub(crate) struct RawColumn {
    pub ordinal: usize,
    pub name: String,
    pub def: ColumnDef,
}

impl ColumnLayout {
    /// Layout from columns carrying explicit ordinals, which must be exactly
    /// `0..n` in some order.
    pub(crate) fn from_ordinals(mut raw: Vec<RawColumn>) -> Result<Self> {
        raw.sort_by_key(|column| column.ordinal);
        for (expected, column) in raw.iter().enumerate() {
            if column.ordinal != expected {
                return Err(FixedLengthError::InvalidLayout(format!(
                    "column '{}' has ordinal {}, expected {expected}",
                    column.name, column.ordinal
                )));
            }
        }
        let columns = raw
            .into_iter()
            .map(|column| column.def.named(column.name).into_column(column.ordinal))
            .collect();
        Self::from_columns(columns)
    }
}
