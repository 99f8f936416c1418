//! Byte sources feeding the line splitter.
//!
//! The splitter runs one `async` algorithm for both call paths. A
//! [`Blocking`] source wraps a [`std::io::Read`] and completes every read
//! without suspending; a [`Suspending`] source wraps a tokio
//! [`AsyncRead`] and yields while waiting for bytes.

use std::future::Future;
use std::io::{self, Read};

use tokio::io::{AsyncRead, AsyncReadExt};

/// A readable stream of bytes.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes into `buf`, returning how many were read.
    ///
    /// `Ok(0)` with a non-empty `buf` means end of input.
    fn read_bytes(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>>;
}

/// Source that reads synchronously from a [`Read`].
#[derive(Debug)]
pub struct Blocking<R>(R);

impl<R: Read> Blocking<R> {
    pub fn new(reader: R) -> Self {
        Self(reader)
    }

    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R: Read> ByteSource for Blocking<R> {
    async fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.0.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }
}

/// Source that suspends on a tokio [`AsyncRead`].
#[derive(Debug)]
pub struct Suspending<R>(R);

impl<R: AsyncRead + Unpin> Suspending<R> {
    pub fn new(reader: R) -> Self {
        Self(reader)
    }

    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<R: AsyncRead + Unpin> ByteSource for Suspending<R> {
    async fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).await
    }
}
