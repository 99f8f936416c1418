//! # fixed-length-rs
//!
//! A reader for fixed-width (column-positional) record files.
//!
//! Legacy flat files such as mainframe exports and EDI-style reports lay out
//! each record as fields at fixed byte positions rather than separating them
//! with delimiters. This library splits such a file into records and slices
//! fields out of each record by byte offset and byte length.
//!
//! ## Overview
//!
//! - **Line splitting**: records end at CR, LF or CRLF; a leading byte-order
//!   mark for the configured encoding is skipped once
//! - **Byte offsets**: fields are addressed in bytes, then decoded with the
//!   configured [`Charset`]
//! - **Trimming**: each field can be trimmed at either or both ends
//! - **Column layouts**: named columns with null policies, built in code or
//!   loaded from JSON
//! - **Blocking or async**: every read operation exists for
//!   [`std::io::Read`] and for tokio's `AsyncRead`
//!
//! ## Example
//!
//! ```
//! use fixed_length_rs::{Charset, ColumnDef, ColumnLayout, FixedLengthDataReader, TrimMode};
//!
//! // Record layout: Id(5) Name(21) Balance(15)
//! let input = "00554Pedro Gomez          123423006022004\n";
//! let layout = ColumnLayout::builder()
//!     .column(ColumnDef::new(0, 5).named("Id").trim(TrimMode::TrimStart).trim_chars("0"))
//!     .column(ColumnDef::new(5, 21).named("Name").trim(TrimMode::TrimEnd))
//!     .column(ColumnDef::new(26, 15).named("Balance"))
//!     .build()
//!     .unwrap();
//!
//! let mut rows = FixedLengthDataReader::from_reader(input.as_bytes(), Charset::utf8(), layout);
//! assert!(rows.read().unwrap());
//! assert_eq!(rows.value_by_name("Id").unwrap().as_deref(), Some("554"));
//! assert_eq!(rows.value_by_name("Name").unwrap().as_deref(), Some("Pedro Gomez"));
//! assert!(!rows.read().unwrap());
//! ```

pub mod charset;
pub mod column;
pub mod config;
pub mod data_reader;
pub mod error;
pub mod line_splitter;
pub mod reader;
pub mod source;
pub mod trim;

pub use charset::Charset;
pub use column::{Column, ColumnDef, ColumnLayout, LayoutBuilder, NullPolicy, NullPredicate};
pub use data_reader::FixedLengthDataReader;
pub use error::{FixedLengthError, Result};
pub use line_splitter::{DEFAULT_BUFFER_SIZE, LineSplitter, MIN_BUFFER_SIZE};
pub use reader::FixedLengthReader;
pub use source::{Blocking, ByteSource, Suspending};
pub use trim::TrimMode;
