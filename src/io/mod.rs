mod local;

pub use local::LocalFileReader;

use std::io::{self, Read};
use std::path::Path;

use tracing::warn;

/// Trait for random access reading from a data source
pub trait ReadAt {
    /// Read data at the specified offset into the buffer
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely starting at `offset`
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    offset += n as u64;
                    buf = &mut buf[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Sequential [`Read`] over `len` bytes of a [`ReadAt`] source starting at `offset`.
pub struct RangeReader<'a, R: ReadAt> {
    source: &'a R,
    offset: u64,
    remaining: u64,
}

impl<'a, R: ReadAt> RangeReader<'a, R> {
    pub fn new(source: &'a R, offset: u64, len: u64) -> Self {
        Self {
            source,
            offset,
            remaining: len,
        }
    }
}

impl<R: ReadAt> Read for RangeReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(self.remaining.min(usize::MAX as u64) as usize);
        let n = self.source.read_at(self.offset, &mut buf[..want])?;
        if n == 0 {
            // the source is shorter than the range we were promised
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        self.offset += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Best-effort removal of an output file left behind by a failed operation.
pub(crate) fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => warn!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}
