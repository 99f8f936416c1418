//! Row-oriented access to fixed-length records.
//!
//! [`FixedLengthDataReader`] combines a [`FixedLengthReader`] with a
//! [`ColumnLayout`] so that fields can be read by ordinal or by name, with
//! each column's trimming and null policy applied.

use std::io::Read;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::charset::Charset;
use crate::column::{Column, ColumnLayout};
use crate::error::{FixedLengthError, Result};
use crate::reader::FixedLengthReader;
use crate::source::{Blocking, ByteSource, Suspending};

/// Reads records as rows of named, nullable string fields.
#[derive(Debug)]
pub struct FixedLengthDataReader<S> {
    reader: FixedLengthReader<S>,
    layout: ColumnLayout,
    closed: bool,
}

impl<R: Read> FixedLengthDataReader<Blocking<R>> {
    /// Row reader over a blocking source.
    pub fn from_reader(reader: R, charset: Charset, layout: ColumnLayout) -> Self {
        Self::new(FixedLengthReader::new(reader, charset), layout)
    }

    /// Move to the next row. Returns `false` at end of input.
    pub fn read(&mut self) -> Result<bool> {
        self.reader.advance()
    }
}

impl<R: AsyncRead + Unpin> FixedLengthDataReader<Suspending<R>> {
    /// Row reader over an async source.
    pub fn from_async_reader(reader: R, charset: Charset, layout: ColumnLayout) -> Self {
        Self::new(FixedLengthReader::new_async(reader, charset), layout)
    }

    pub async fn read_async(&mut self) -> Result<bool> {
        self.reader.advance_async().await
    }

    pub async fn read_cancellable(&mut self, cancel: &CancellationToken) -> Result<bool> {
        self.reader.advance_cancellable(cancel).await
    }
}

impl<S: ByteSource> FixedLengthDataReader<S> {
    pub fn new(reader: FixedLengthReader<S>, layout: ColumnLayout) -> Self {
        Self {
            reader,
            layout,
            closed: false,
        }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Number of columns per row.
    pub fn field_count(&self) -> usize {
        self.layout.len()
    }

    /// Ordinal of the column named `name`.
    pub fn ordinal(&self, name: &str) -> Result<usize> {
        self.layout.resolve(name)
    }

    /// Name of the column at `ordinal`, if it has one.
    pub fn name(&self, ordinal: usize) -> Result<Option<&str>> {
        self.column(ordinal).map(Column::name)
    }

    /// Field at `ordinal` of the current row, `None` if the column reads it
    /// as null.
    pub fn value(&self, ordinal: usize) -> Result<Option<String>> {
        let column = self.column(ordinal)?;
        let value = self.extract(column)?;
        Ok((!column.is_null(&value)).then_some(value))
    }

    /// Field named `name` of the current row.
    pub fn value_by_name(&self, name: &str) -> Result<Option<String>> {
        self.value(self.ordinal(name)?)
    }

    pub fn is_null(&self, ordinal: usize) -> Result<bool> {
        let column = self.column(ordinal)?;
        let value = self.extract(column)?;
        Ok(column.is_null(&value))
    }

    /// Every field of the current row, in ordinal order.
    pub fn values(&self) -> Result<Vec<Option<String>>> {
        (0..self.field_count())
            .map(|ordinal| self.value(ordinal))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the row reader and the underlying reader. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.reader.close();
    }

    fn column(&self, ordinal: usize) -> Result<&Column> {
        self.layout
            .get(ordinal)
            .ok_or(FixedLengthError::OrdinalOutOfRange {
                ordinal,
                field_count: self.layout.len(),
            })
    }

    fn extract(&self, column: &Column) -> Result<String> {
        self.reader.field(
            column.offset(),
            column.length(),
            column.trim_mode(),
            column.trim_chars(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::trim::TrimMode;

    const INPUT: &str = "00554Pedro Gomez          123423006022004\r\n\
                         00000                     000000000000000\r\n";

    fn layout() -> ColumnLayout {
        ColumnLayout::builder()
            .column(
                ColumnDef::new(0, 5)
                    .named("Id")
                    .trim(TrimMode::TrimStart)
                    .trim_chars("0")
                    .empty_is_null(),
            )
            .column(
                ColumnDef::new(5, 21)
                    .named("Name")
                    .trim(TrimMode::TrimEnd)
                    .empty_is_null(),
            )
            .column(ColumnDef::new(26, 15).null_when(|v| v.chars().all(|c| c == '0')))
            .build()
            .unwrap()
    }

    #[test]
    fn test_read_rows() {
        let mut rows = FixedLengthDataReader::from_reader(INPUT.as_bytes(), Charset::utf8(), layout());
        assert_eq!(rows.field_count(), 3);

        assert!(rows.read().unwrap());
        assert_eq!(rows.value(0).unwrap().as_deref(), Some("554"));
        assert_eq!(rows.value_by_name("Name").unwrap().as_deref(), Some("Pedro Gomez"));
        assert_eq!(rows.value(2).unwrap().as_deref(), Some("123423006022004"));
        assert!(!rows.is_null(1).unwrap());

        assert!(rows.read().unwrap());
        assert_eq!(rows.values().unwrap(), vec![None, None, None]);
        assert!(rows.is_null(0).unwrap());

        assert!(!rows.read().unwrap());
    }

    #[test]
    fn test_names_and_ordinals() {
        let rows = FixedLengthDataReader::from_reader(INPUT.as_bytes(), Charset::utf8(), layout());
        assert_eq!(rows.ordinal("Name").unwrap(), 1);
        assert_eq!(rows.name(0).unwrap(), Some("Id"));
        assert_eq!(rows.name(2).unwrap(), None);
        assert!(matches!(
            rows.ordinal("Missing"),
            Err(FixedLengthError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_ordinal_out_of_range() {
        let mut rows = FixedLengthDataReader::from_reader(INPUT.as_bytes(), Charset::utf8(), layout());
        assert!(rows.read().unwrap());
        assert!(matches!(
            rows.value(3),
            Err(FixedLengthError::OrdinalOutOfRange {
                ordinal: 3,
                field_count: 3
            })
        ));
        assert!(rows.is_null(3).unwrap_err().is_range_error());
        assert!(rows.name(7).is_err());
    }

    #[test]
    fn test_value_before_read() {
        let rows = FixedLengthDataReader::from_reader(INPUT.as_bytes(), Charset::utf8(), layout());
        assert!(matches!(rows.value(0), Err(FixedLengthError::NoCurrentRecord)));
    }

    #[test]
    fn test_short_record_is_range_error() {
        let mut rows = FixedLengthDataReader::from_reader("00554Pedro".as_bytes(), Charset::utf8(), layout());
        assert!(rows.read().unwrap());
        assert_eq!(rows.value(0).unwrap().as_deref(), Some("554"));
        assert!(rows.value(1).unwrap_err().is_range_error());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut rows = FixedLengthDataReader::from_reader(INPUT.as_bytes(), Charset::utf8(), layout());
        rows.close();
        rows.close();
        assert!(rows.is_closed());
        assert!(matches!(rows.read(), Err(FixedLengthError::Closed)));
        assert!(matches!(rows.value(0), Err(FixedLengthError::Closed)));
    }

    #[tokio::test]
    async fn test_read_async_rows() {
        let mut rows =
            FixedLengthDataReader::from_async_reader(INPUT.as_bytes(), Charset::utf8(), layout());
        let mut ids = Vec::new();
        while rows.read_async().await.unwrap() {
            ids.push(rows.value_by_name("Id").unwrap());
        }
        assert_eq!(ids, vec![Some("554".to_string()), None]);
    }
}
