//! Byte-source adapter: positional reads over a seekable input.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// A source of bytes addressable by absolute offset.
///
/// The reader pulls every index node through
/// [`read_exact_at`](ByteSource::read_exact_at). At most one call is in
/// flight at a time, so implementations need not be safe for concurrent use.
pub trait ByteSource {
    /// Fills `buf` completely with the bytes starting at `offset`, or fails.
    ///
    /// A read that ends exactly at the end of the source is not an error.
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()>;
}

/// `File` reads positionally: the call leaves the file cursor alone and is
/// independent of any other outstanding read.
#[cfg(unix)]
impl ByteSource for File {
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::read_exact_at(self, buf, offset)
    }
}

#[cfg(not(unix))]
impl ByteSource for File {
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }
}

/// Adapter that turns any `Read + Seek` type into a [`ByteSource`] by
/// seeking before each read.
///
/// Useful for in-memory containers held in an [`io::Cursor`].
#[derive(Debug)]
pub struct SeekSource<R> {
    inner: R,
}

impl<R> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consumes the adapter, returning the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf)
    }
}
