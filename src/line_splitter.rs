//! Buffered splitting of a byte stream into raw lines.
//!
//! Lines end at CR, LF or CRLF. Splitting happens on bytes, before any
//! decoding, because record layouts are defined in byte offsets.
//!
//! The buffer holds one partial line at offset 0 followed by bytes not yet
//! scanned. After each line the unconsumed tail is shifted back to offset 0.
//! When a line does not fit, the buffer doubles.
//!
//! ```
//! use fixed_length_rs::{Charset, LineSplitter};
//!
//! let mut splitter = LineSplitter::new("AB\r\nCD".as_bytes(), Charset::utf8());
//! assert_eq!(splitter.read_line().unwrap(), Some(b"AB".to_vec()));
//! assert_eq!(splitter.read_line().unwrap(), Some(b"CD".to_vec()));
//! assert_eq!(splitter.read_line().unwrap(), None);
//! ```

use std::future::Future;
use std::io::{self, Read};
use std::pin::pin;
use std::task::{Context, Poll, Waker};

use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::charset::Charset;
use crate::error::{FixedLengthError, Result};
use crate::source::{Blocking, ByteSource, Suspending};

/// Initial buffer capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Smallest accepted buffer capacity in bytes.
pub const MIN_BUFFER_SIZE: usize = 128;

/// Growth stops here; `Vec` cannot hold more than `isize::MAX` bytes.
const MAX_BUFFER_SIZE: usize = isize::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Reading,
    Cancelled,
    Faulted,
    Closed,
}

/// Splits a byte source into lines.
///
/// Invariant: `read_position <= read_length <= buffer.len()`, and between
/// calls `read_position == 0`.
#[derive(Debug)]
pub struct LineSplitter<S> {
    source: Option<S>,
    charset: Charset,
    /// Full length is the capacity; only `..read_length` holds input.
    buffer: Vec<u8>,
    read_position: usize,
    read_length: usize,
    preamble_pending: bool,
    state: State,
}

impl<R: Read> LineSplitter<Blocking<R>> {
    /// Splitter over a blocking reader with the default buffer size.
    pub fn new(reader: R, charset: Charset) -> Self {
        Self::from_source(Blocking::new(reader), charset, DEFAULT_BUFFER_SIZE)
    }

    /// Splitter over a blocking reader with an explicit initial buffer size.
    pub fn with_buffer_size(reader: R, charset: Charset, buffer_size: usize) -> Result<Self> {
        check_buffer_size(buffer_size)?;
        Ok(Self::from_source(Blocking::new(reader), charset, buffer_size))
    }

    /// Read the next line, or `None` at end of input.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut cx = Context::from_waker(Waker::noop());
        let mut next = pin!(self.next_line());
        match next.as_mut().poll(&mut cx) {
            Poll::Ready(line) => line,
            Poll::Pending => unreachable!("blocking sources never suspend"),
        }
    }
}

impl<R: AsyncRead + Unpin> LineSplitter<Suspending<R>> {
    /// Splitter over an async reader with the default buffer size.
    pub fn new_async(reader: R, charset: Charset) -> Self {
        Self::from_source(Suspending::new(reader), charset, DEFAULT_BUFFER_SIZE)
    }

    /// Splitter over an async reader with an explicit initial buffer size.
    pub fn with_buffer_size_async(
        reader: R,
        charset: Charset,
        buffer_size: usize,
    ) -> Result<Self> {
        check_buffer_size(buffer_size)?;
        Ok(Self::from_source(Suspending::new(reader), charset, buffer_size))
    }

    /// Read the next line, suspending while the source has no bytes ready.
    ///
    /// If the returned future is dropped before it completes, every later
    /// read fails with [`FixedLengthError::ReadInProgress`].
    pub async fn read_line_async(&mut self) -> Result<Option<Vec<u8>>> {
        self.next_line().await
    }

    /// Like [`read_line_async`](Self::read_line_async), aborted when `cancel`
    /// fires.
    ///
    /// Cancellation is terminal: this call and every later read fail with
    /// [`FixedLengthError::Cancelled`].
    pub async fn read_line_cancellable(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<u8>>> {
        // A closed, faulted or cancelled splitter keeps its state.
        self.check_state()?;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            line = self.next_line() => Some(line),
        };
        match outcome {
            Some(line) => line,
            None => {
                warn!("line read cancelled; splitter is no longer usable");
                self.state = State::Cancelled;
                Err(FixedLengthError::Cancelled)
            }
        }
    }
}

impl<S: ByteSource> LineSplitter<S> {
    fn from_source(source: S, charset: Charset, buffer_size: usize) -> Self {
        Self {
            source: Some(source),
            charset,
            buffer: vec![0; buffer_size],
            read_position: 0,
            read_length: 0,
            preamble_pending: true,
            state: State::Idle,
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Current buffer capacity in bytes.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Release the source. Calling this more than once has no effect.
    pub fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        self.state = State::Closed;
        if self.source.take().is_some() {
            debug!("input source released");
        }
    }

    fn check_state(&self) -> Result<()> {
        match self.state {
            State::Idle => Ok(()),
            State::Reading => Err(FixedLengthError::ReadInProgress),
            State::Cancelled => Err(FixedLengthError::Cancelled),
            State::Faulted => Err(FixedLengthError::Faulted),
            State::Closed => Err(FixedLengthError::Closed),
        }
    }

    async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.check_state()?;
        self.state = State::Reading;

        match self.scan_line().await {
            Ok(line) => {
                self.state = State::Idle;
                Ok(line)
            }
            Err(e) => {
                warn!(error = %e, "read from input source failed");
                self.state = State::Faulted;
                Err(e.into())
            }
        }
    }

    async fn scan_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.read_position == self.read_length && self.refill().await? == 0 {
            return Ok(None);
        }

        loop {
            let window = &self.buffer[self.read_position..self.read_length];
            if let Some(index) = window.iter().position(|&b| b == b'\r' || b == b'\n') {
                let end = self.read_position + index;
                let line = self.buffer[..end].to_vec();
                let terminator = self.buffer[end];
                self.read_position = end + 1;

                if terminator == b'\r' {
                    if self.read_position == self.read_length {
                        // The line is already copied out, so the buffer can be reloaded.
                        self.refill().await?;
                    }
                    if self.read_position < self.read_length
                        && self.buffer[self.read_position] == b'\n'
                    {
                        self.read_position += 1;
                    }
                }

                self.compact();
                trace!(length = line.len(), "line read");
                return Ok(Some(line));
            }

            self.read_position = self.read_length;
            if self.append().await? == 0 {
                break;
            }
        }

        // Input ended without a terminator.
        let line = self.buffer[..self.read_length].to_vec();
        self.read_position = 0;
        self.read_length = 0;
        trace!(length = line.len(), "final line read");
        Ok(Some(line))
    }

    /// Reload the buffer from offset 0.
    async fn refill(&mut self) -> io::Result<usize> {
        self.read_position = 0;
        self.read_length = 0;

        if self.preamble_pending {
            self.preamble_pending = false;
            let kept = self.consume_preamble().await?;
            if kept > 0 {
                self.read_length = kept;
                return Ok(kept);
            }
        }

        self.read_length = self.read_into(0, self.buffer.len()).await?;
        Ok(self.read_length)
    }

    /// Read the preamble's length of bytes into the buffer head.
    ///
    /// Returns 0 when they match the preamble, otherwise the number of bytes
    /// read, which stay in the buffer as record data.
    async fn consume_preamble(&mut self) -> io::Result<usize> {
        let preamble = self.charset.preamble();
        if preamble.is_empty() {
            return Ok(0);
        }

        let mut filled = 0;
        while filled < preamble.len() {
            let n = self.read_into(filled, preamble.len()).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if self.buffer[..filled] == *preamble {
            debug!(encoding = self.charset.name(), "byte-order mark skipped");
            Ok(0)
        } else {
            Ok(filled)
        }
    }

    /// Read more bytes after `read_length`, doubling the buffer when full.
    async fn append(&mut self) -> io::Result<usize> {
        if self.read_length == self.buffer.len() {
            self.grow();
        }
        let n = self.read_into(self.read_length, self.buffer.len()).await?;
        self.read_length += n;
        Ok(n)
    }

    fn grow(&mut self) {
        let capacity = self.buffer.len().saturating_mul(2).min(MAX_BUFFER_SIZE);
        debug!(from = self.buffer.len(), to = capacity, "growing line buffer");
        self.buffer.resize(capacity, 0);
    }

    fn compact(&mut self) {
        self.buffer
            .copy_within(self.read_position..self.read_length, 0);
        self.read_length -= self.read_position;
        self.read_position = 0;
    }

    async fn read_into(&mut self, start: usize, end: usize) -> io::Result<usize> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "input source released"))?;
        source.read_bytes(&mut self.buffer[start..end]).await
    }
}

fn check_buffer_size(buffer_size: usize) -> Result<()> {
    if buffer_size < MIN_BUFFER_SIZE {
        return Err(FixedLengthError::InvalidBufferSize {
            size: buffer_size,
            min: MIN_BUFFER_SIZE,
        });
    }
    Ok(())
}
