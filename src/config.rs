//! JSON column layout documents.
//!
//! Format:
//! ```text
//! {
//!   "Columns": {
//!     "Id":   { "Ordinal": 0, "Offset": 0, "Length": 5,
//!               "TrimMode": "TrimStart", "TrimChars": "0", "IsEmptyNull": true },
//!     "Name": { "Ordinal": 1, "Offset": 5, "Length": 21, "TrimMode": "TrimEnd" }
//!   }
//! }
//! ```
//!
//! - Keys of `Columns` are column names
//! - Property names are matched case-insensitively (`columns`, `TRIMMODE`, ...);
//!   column names are not
//! - `TrimMode` defaults to `None`; labels are case-sensitive
//! - `TrimChars` replaces whitespace as the trimmed set
//! - `IsEmptyNull` makes an empty (trimmed) field read as null
//! - Ordinals must be exactly `0..n`; columns are ordered by ordinal

use std::collections::BTreeMap;
use std::fs;
use std::mem;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::column::{ColumnDef, ColumnLayout, RawColumn};
use crate::error::{FixedLengthError, Result};
use crate::trim::TrimMode;

// Field names are the lowercased property names; see `fold_property_names`.
#[derive(Debug, Deserialize)]
struct LayoutDocument {
    #[serde(default)]
    columns: Option<BTreeMap<String, ColumnEntry>>,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    ordinal: usize,
    offset: usize,
    length: usize,
    #[serde(rename = "trimmode", default)]
    trim_mode: Option<String>,
    #[serde(rename = "trimchars", default)]
    trim_chars: Option<String>,
    #[serde(rename = "isemptynull", default)]
    is_empty_null: Option<bool>,
}

/// Lowercase the keys of a JSON object. Other values pass through.
fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect(),
        ),
        other => other,
    }
}

/// Lowercase property names of the document and of each column entry,
/// leaving the column names (keys of `columns`) untouched.
fn fold_property_names(document: Value) -> Value {
    let mut document = lowercase_keys(document);
    if let Some(Value::Object(columns)) = document.get_mut("columns") {
        for entry in columns.values_mut() {
            *entry = lowercase_keys(mem::take(entry));
        }
    }
    document
}

impl ColumnEntry {
    fn into_raw(self, name: String) -> Result<RawColumn> {
        let trim_mode = match &self.trim_mode {
            Some(label) => label.parse()?,
            None => TrimMode::None,
        };

        let mut def = ColumnDef::new(self.offset, self.length).trim(trim_mode);
        if let Some(chars) = &self.trim_chars {
            def = def.trim_chars(chars);
        }
        if self.is_empty_null == Some(true) {
            def = def.empty_is_null();
        }

        Ok(RawColumn {
            ordinal: self.ordinal,
            name,
            def,
        })
    }
}

impl ColumnLayout {
    /// Parse a JSON layout document.
    ///
    /// # Errors
    /// - [`FixedLengthError::MalformedLayout`] if the text is not a JSON
    ///   object of the expected shape
    /// - [`FixedLengthError::MissingColumns`] if `Columns` is absent or null
    /// - [`FixedLengthError::InvalidTrimMode`] for an unknown trim label
    /// - [`FixedLengthError::InvalidLayout`] if ordinals are not `0..n`
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        let document: LayoutDocument = serde_json::from_value(fold_property_names(document))?;
        let entries = document.columns.ok_or(FixedLengthError::MissingColumns)?;

        let raw = entries
            .into_iter()
            .map(|(name, entry)| entry.into_raw(name))
            .collect::<Result<Vec<_>>>()?;

        let layout = Self::from_ordinals(raw)?;
        debug!(columns = layout.len(), "column layout loaded");
        Ok(layout)
    }

    /// Read and parse a JSON layout file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl FromStr for ColumnLayout {
    type Err = FixedLengthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::NullPolicy;
    use std::io::Write;

    const LAYOUT: &str = r#"
    {
      "Columns": {
        "Id": {
          "Ordinal": 0,
          "Offset": 0,
          "Length": 5,
          "TrimMode": "TrimStart",
          "TrimChars": " 0123",
          "IsEmptyNull": true
        },
        "Name": {
          "Ordinal": 1,
          "Offset": 5,
          "Length": 10,
          "TrimMode": "TrimEnd"
        },
        "Description": {
          "Ordinal": 2,
          "Offset": 15,
          "Length": 20,
          "TrimMode": "Trim",
          "IsEmptyNull": false
        }
      }
    }"#;

    #[test]
    fn test_parse_layout() {
        let layout = ColumnLayout::from_json(LAYOUT).unwrap();
        assert_eq!(layout.len(), 3);

        let id = layout.get(0).unwrap();
        assert_eq!(id.name(), Some("Id"));
        assert_eq!(id.offset(), 0);
        assert_eq!(id.length(), 5);
        assert_eq!(id.trim_mode(), TrimMode::TrimStart);
        assert_eq!(id.trim_chars(), Some(&[' ', '0', '1', '2', '3'][..]));
        assert!(id.is_null(""));
        assert!(!id.is_null("abc"));

        let name = layout.get(1).unwrap();
        assert_eq!(name.name(), Some("Name"));
        assert_eq!(name.offset(), 5);
        assert_eq!(name.length(), 10);
        assert_eq!(name.trim_mode(), TrimMode::TrimEnd);
        assert!(name.trim_chars().is_none());
        assert!(!name.is_null(""));

        let description = layout.get(2).unwrap();
        assert_eq!(description.name(), Some("Description"));
        assert_eq!(description.trim_mode(), TrimMode::Trim);
        assert!(matches!(description.null_policy(), NullPolicy::Never));

        assert_eq!(layout.resolve("Description").unwrap(), 2);
    }

    #[test]
    fn test_camel_case_and_default_trim() {
        let layout: ColumnLayout =
            r#"{"columns": {"Code": {"ordinal": 0, "offset": 2, "length": 3}}}"#
                .parse()
                .unwrap();
        let code = layout.get(0).unwrap();
        assert_eq!(code.offset(), 2);
        assert_eq!(code.trim_mode(), TrimMode::None);
    }

    #[test]
    fn test_property_names_ignore_case() {
        let json = r#"{"COLUMNS": {"CustomerId": {
            "ORDINAL": 0, "offset": 1, "LeNgTh": 4,
            "trimmode": "TrimStart", "TRIMCHARS": "0", "isEmptyNULL": true
        }}}"#;
        let layout = ColumnLayout::from_json(json).unwrap();
        let id = layout.get(0).unwrap();
        assert_eq!(id.name(), Some("CustomerId"));
        assert_eq!(id.offset(), 1);
        assert_eq!(id.length(), 4);
        assert_eq!(id.trim_mode(), TrimMode::TrimStart);
        assert_eq!(id.trim_chars(), Some(&['0'][..]));
        assert!(id.is_null(""));
        assert!(layout.resolve("customerid").is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ColumnLayout::from_json("invalid json"),
            Err(FixedLengthError::MalformedLayout(_))
        ));
        assert!(matches!(
            ColumnLayout::from_json(r#"{"Columns": {"Id": {"Ordinal": -1, "Offset": 0, "Length": 1}}}"#),
            Err(FixedLengthError::MalformedLayout(_))
        ));
        assert!(matches!(
            ColumnLayout::from_json("42"),
            Err(FixedLengthError::MalformedLayout(_))
        ));
    }

    #[test]
    fn test_missing_columns() {
        assert!(matches!(
            ColumnLayout::from_json("{}"),
            Err(FixedLengthError::MissingColumns)
        ));
        assert!(matches!(
            ColumnLayout::from_json(r#"{"Columns": null}"#),
            Err(FixedLengthError::MissingColumns)
        ));
    }

    #[test]
    fn test_unknown_trim_mode() {
        let json = r#"{"Columns": {"Id": {"Ordinal": 0, "Offset": 0, "Length": 5, "TrimMode": "trim"}}}"#;
        assert!(matches!(
            ColumnLayout::from_json(json),
            Err(FixedLengthError::InvalidTrimMode(label)) if label == "trim"
        ));
    }

    #[test]
    fn test_ordinals_must_be_contiguous() {
        let json = r#"{"Columns": {
            "A": {"Ordinal": 0, "Offset": 0, "Length": 1},
            "B": {"Ordinal": 0, "Offset": 1, "Length": 1}
        }}"#;
        assert!(matches!(
            ColumnLayout::from_json(json),
            Err(FixedLengthError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_columns_ordered_by_ordinal() {
        let json = r#"{"Columns": {
            "Zeta": {"Ordinal": 0, "Offset": 0, "Length": 1},
            "Alpha": {"Ordinal": 1, "Offset": 1, "Length": 1}
        }}"#;
        let layout = ColumnLayout::from_json(json).unwrap();
        assert_eq!(layout.get(0).unwrap().name(), Some("Zeta"));
        assert_eq!(layout.get(1).unwrap().name(), Some("Alpha"));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LAYOUT.as_bytes()).unwrap();
        let layout = ColumnLayout::from_json_file(file.path()).unwrap();
        assert_eq!(layout.len(), 3);
    }
}
