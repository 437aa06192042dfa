//! Polymorphic byte stream capability: read/write/seek/tell/at_end/error.
//!
//! Partial reads/writes are normal; callers loop. On error, `get_error`
//! returns `Some` and subsequent reads/writes are unspecified.

use crate::error::{Error, ErrorKind};
use std::io::{Read as StdRead, Seek as StdSeek, SeekFrom, Write as StdWrite};

/// Virtual byte stream used by every codec entry point.
pub trait Stream {
    /// Reads into `buf`, returning the number of bytes actually read (which
    /// may be less than `buf.len()`; `0` means end-of-stream).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Writes from `buf`, returning the number of bytes actually written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;

    /// Total stream size in bytes, if known without scanning forward.
    fn size(&self) -> Option<u64>;

    /// Seeks to an absolute byte offset.
    fn seek(&mut self, pos: u64) -> Result<(), Error>;

    /// Returns the current byte offset.
    fn tell(&self) -> Result<u64, Error>;

    /// True if the stream is positioned at end-of-data.
    fn at_end(&self) -> bool;

    /// Returns the last I/O error, if any, without clearing it.
    fn get_error(&self) -> Option<Error> {
        None
    }

    /// Releases any resources held by this stream. A no-op by default.
    fn close(&mut self) {}
}

/// Read-only view over a `&[u8]` memblock.
pub struct MemReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Stream for MemReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize, Error> {
        Err(Error::new(ErrorKind::StreamError))
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn seek(&mut self, pos: u64) -> Result<(), Error> {
        if pos > self.data.len() as u64 {
            return Err(Error::new(ErrorKind::StreamError));
        }
        self.pos = pos as usize;
        Ok(())
    }

    fn tell(&self) -> Result<u64, Error> {
        Ok(self.pos as u64)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Read-write view over an owned `Vec<u8>`, growing on writes past the
/// current end, with a logical cursor independent of the backing length.
pub struct MemReadWrite {
    data: Vec<u8>,
    pos: usize,
}

impl MemReadWrite {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
        }
    }

    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for MemReadWrite {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for MemReadWrite {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let end = self.pos + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn seek(&mut self, pos: u64) -> Result<(), Error> {
        self.pos = pos as usize;
        Ok(())
    }

    fn tell(&self) -> Result<u64, Error> {
        Ok(self.pos as u64)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Adapts any `std::io::{Read, Write, Seek}` type (typically
/// `std::fs::File`) to the [`Stream`] trait, for the `*_file` convenience
/// entry points. This is the one piece of file-opening glue the codec
/// itself does not need but the convenience wrappers do.
pub struct StdStream<T> {
    inner: T,
    size_hint: Option<u64>,
    pos: u64,
}

impl<T: StdRead + StdWrite + StdSeek> StdStream<T> {
    pub fn new(mut inner: T) -> Result<Self, Error> {
        let current = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(current))?;
        Ok(Self {
            inner,
            size_hint: Some(end),
            pos: current,
        })
    }
}

impl<T: StdRead + StdWrite + StdSeek> Stream for StdStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let n = self.inner.write(buf)?;
        self.pos += n as u64;
        if let Some(size) = self.size_hint {
            self.size_hint = Some(size.max(self.pos));
        }
        Ok(n)
    }

    fn size(&self) -> Option<u64> {
        self.size_hint
    }

    fn seek(&mut self, pos: u64) -> Result<(), Error> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    fn tell(&self) -> Result<u64, Error> {
        Ok(self.pos)
    }

    fn at_end(&self) -> bool {
        self.size_hint.map_or(false, |total| self.pos >= total)
    }
}
