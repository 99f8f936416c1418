//! Error types for fixed-length record reading.

use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FixedLengthError>;

/// Errors raised while reading fixed-length records.
#[derive(Debug, thiserror::Error)]
pub enum FixedLengthError {
    /// Underlying source failed while reading.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Requested buffer is smaller than the supported minimum.
    #[error("buffer size {size} is below the minimum of {min} bytes")]
    InvalidBufferSize { size: usize, min: usize },

    /// No encoding is registered under the given label.
    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),

    /// A previous read was abandoned before it completed.
    #[error("a read operation is already in progress")]
    ReadInProgress,

    /// A previous read failed; the reader can no longer be used.
    #[error("reader is faulted by an earlier I/O error")]
    Faulted,

    /// The reader has been closed.
    #[error("reader is closed")]
    Closed,

    /// No record is loaded (before the first advance or after end of input).
    #[error("no current record: advance must succeed before reading fields")]
    NoCurrentRecord,

    /// The pending read was cancelled.
    #[error("read was cancelled")]
    Cancelled,

    /// Byte range does not fit inside the current record.
    #[error("field at offset {offset} with length {length} exceeds record length {record_length}")]
    FieldOutOfRange {
        offset: usize,
        length: usize,
        record_length: usize,
    },

    /// Column ordinal is past the last column.
    #[error("field with ordinal {ordinal} was not found ({field_count} columns)")]
    OrdinalOutOfRange { ordinal: usize, field_count: usize },

    /// No column carries the given name.
    #[error("field with name '{0}' was not found")]
    ColumnNotFound(String),

    /// Trim mode label is not one of `None`, `Trim`, `TrimStart`, `TrimEnd`.
    #[error("invalid trim mode '{0}'")]
    InvalidTrimMode(String),

    /// Column layout document is not well-formed JSON of the expected shape.
    #[error("malformed column layout: {0}")]
    MalformedLayout(#[from] serde_json::Error),

    /// Column layout document has no `Columns` collection.
    #[error("column layout has no 'Columns' collection")]
    MissingColumns,

    /// Column layout is structurally inconsistent.
    #[error("invalid column layout: {0}")]
    InvalidLayout(String),
}

impl FixedLengthError {
    /// True for errors caused by calling an operation in the wrong state.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            FixedLengthError::ReadInProgress
                | FixedLengthError::Faulted
                | FixedLengthError::Closed
                | FixedLengthError::NoCurrentRecord
        )
    }

    /// True for errors caused by an offset, length or ordinal out of bounds.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            FixedLengthError::FieldOutOfRange { .. } | FixedLengthError::OrdinalOutOfRange { .. }
        )
    }
}
