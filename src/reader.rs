//! Field extraction from fixed-length records.
//!
//! [`FixedLengthReader`] advances through the input one record at a time and
//! slices fields out of the current record by byte offset and byte length.
//!
//! ```
//! use fixed_length_rs::{Charset, FixedLengthReader, TrimMode};
//!
//! let input = "00554Pedro Gomez          123423006022004\n";
//! let mut reader = FixedLengthReader::new(input.as_bytes(), Charset::utf8());
//!
//! assert!(reader.advance().unwrap());
//! assert_eq!(reader.field(0, 5, TrimMode::TrimStart, Some(&['0'])).unwrap(), "554");
//! assert_eq!(reader.field(5, 21, TrimMode::TrimEnd, None).unwrap(), "Pedro Gomez");
//! assert!(!reader.advance().unwrap());
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::charset::Charset;
use crate::error::{FixedLengthError, Result};
use crate::line_splitter::LineSplitter;
use crate::source::{Blocking, ByteSource, Suspending};
use crate::trim::TrimMode;

/// Reads fixed-length records and extracts their fields.
#[derive(Debug)]
pub struct FixedLengthReader<S> {
    splitter: LineSplitter<S>,
    current_line: Option<Vec<u8>>,
}

impl<R: Read> FixedLengthReader<Blocking<R>> {
    pub fn new(reader: R, charset: Charset) -> Self {
        Self::from_splitter(LineSplitter::new(reader, charset))
    }

    pub fn with_buffer_size(reader: R, charset: Charset, buffer_size: usize) -> Result<Self> {
        LineSplitter::with_buffer_size(reader, charset, buffer_size).map(Self::from_splitter)
    }

    /// Load the next record. Returns `false` at end of input.
    pub fn advance(&mut self) -> Result<bool> {
        let line = self.splitter.read_line();
        self.set_current(line)
    }
}

impl FixedLengthReader<Blocking<File>> {
    /// Open the file at `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P, charset: Charset) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, charset))
    }
}

impl<R: AsyncRead + Unpin> FixedLengthReader<Suspending<R>> {
    pub fn new_async(reader: R, charset: Charset) -> Self {
        Self::from_splitter(LineSplitter::new_async(reader, charset))
    }

    pub fn with_buffer_size_async(
        reader: R,
        charset: Charset,
        buffer_size: usize,
    ) -> Result<Self> {
        LineSplitter::with_buffer_size_async(reader, charset, buffer_size).map(Self::from_splitter)
    }

    /// Load the next record without blocking. Returns `false` at end of input.
    pub async fn advance_async(&mut self) -> Result<bool> {
        let line = self.splitter.read_line_async().await;
        self.set_current(line)
    }

    /// Like [`advance_async`](Self::advance_async), aborted when `cancel` fires.
    pub async fn advance_cancellable(&mut self, cancel: &CancellationToken) -> Result<bool> {
        let line = self.splitter.read_line_cancellable(cancel).await;
        self.set_current(line)
    }
}

impl FixedLengthReader<Suspending<tokio::fs::File>> {
    /// Open the file at `path` for non-blocking reading.
    pub async fn open_async<P: AsRef<Path>>(path: P, charset: Charset) -> Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new_async(file, charset))
    }
}

impl<S: ByteSource> FixedLengthReader<S> {
    fn from_splitter(splitter: LineSplitter<S>) -> Self {
        Self {
            splitter,
            current_line: None,
        }
    }

    fn set_current(&mut self, line: Result<Option<Vec<u8>>>) -> Result<bool> {
        // A failed advance leaves no current record.
        self.current_line = None;
        self.current_line = line?;
        Ok(self.current_line.is_some())
    }

    pub fn charset(&self) -> Charset {
        self.splitter.charset()
    }

    pub fn is_closed(&self) -> bool {
        self.splitter.is_closed()
    }

    /// Raw bytes of the current record, without its terminator.
    pub fn current_row(&self) -> Result<&[u8]> {
        if self.is_closed() {
            return Err(FixedLengthError::Closed);
        }
        self.current_line
            .as_deref()
            .ok_or(FixedLengthError::NoCurrentRecord)
    }

    /// Decode the bytes `offset..offset + length` of the current record and
    /// trim the result.
    ///
    /// Offsets are not checked against character boundaries; a slice that cuts
    /// a multi-byte character decodes with replacement characters.
    ///
    /// # Errors
    /// [`FixedLengthError::Closed`] after [`close`](Self::close),
    /// [`FixedLengthError::NoCurrentRecord`] if no record is loaded, and
    /// [`FixedLengthError::FieldOutOfRange`] if the range does not fit.
    pub fn field(
        &self,
        offset: usize,
        length: usize,
        trim_mode: TrimMode,
        trim_chars: Option<&[char]>,
    ) -> Result<String> {
        let line = self.current_row()?;
        let bytes = offset
            .checked_add(length)
            .and_then(|end| line.get(offset..end))
            .ok_or(FixedLengthError::FieldOutOfRange {
                offset,
                length,
                record_length: line.len(),
            })?;
        let decoded = self.splitter.charset().decode(bytes);
        Ok(trim_mode.apply(&decoded, trim_chars))
    }

    /// Decode a field without trimming.
    pub fn raw_field(&self, offset: usize, length: usize) -> Result<String> {
        self.field(offset, length, TrimMode::None, None)
    }

    /// Close the reader and release its input. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.current_line = None;
        self.splitter.close();
    }
}
