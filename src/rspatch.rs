#![forbid(unsafe_code)]
use super::error::Result;
use super::rsdiff::{Chunk, Delta};
use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Default copy buffer size.
pub const BUFFER_SIZE: usize = 16384;

/// Patcher replaying a delta against a seekable basis.
///
/// Apply a delta to a basis using a 4k buffer:
/// ```
/// use std::io;
/// use rsdelta::{Delta, Rspatch};
///
/// fn rspatch(basis: &[u8], delta: &Delta) -> rsdelta::Result<Vec<u8>> {
///     let mut target = Vec::new();
///     Rspatch::new(delta)
///         .buffer_size(4096)
///         .apply(io::Cursor::new(basis), io::Cursor::new(&mut target))?;
///     Ok(target)
/// }
/// ```
///
/// A failure midway leaves whatever was already written in `target`.
pub struct Rspatch<'d> {
    delta: &'d Delta,
    bsize: usize,
}

impl<'d> Rspatch<'d> {
    /// Create new patcher configuration.
    pub fn new(delta: &'d Delta) -> Self {
        Rspatch {
            delta,
            bsize: BUFFER_SIZE,
        }
    }

    /// Set the copy buffer size, (`bs >= 128`, default is `BUFFER_SIZE`).
    pub fn buffer_size(mut self, mut bs: usize) -> Self {
        if bs < 128 {
            bs = 128;
        }
        self.bsize = bs;
        self
    }

    /// Apply the delta to `basis` and output the reconstructed stream.
    ///
    /// The target data size would be returned if no error occurs.
    pub fn apply<B, T>(self, basis: B, target: T) -> Result<u64>
    where
        B: Read + Seek,
        T: Write,
    {
        let ctx = Context::new(basis, target, self.bsize);
        ctx.apply(self.delta)
    }
}

impl Delta {
    /// Apply this delta to `basis` with default settings, see [`Rspatch`].
    pub fn patch<B, T>(&self, basis: B, target: T) -> Result<u64>
    where
        B: Read + Seek,
        T: Write,
    {
        Rspatch::new(self).apply(basis, target)
    }
}

/// Rspatch context.
struct Context<B, T> {
    basis: B,
    target: T,
    buf: Vec<u8>,
    total: u64,
}

impl<B, T> Context<B, T>
where
    B: Read + Seek,
    T: Write,
{
    fn new(basis: B, target: T, bsize: usize) -> Self {
        Context {
            basis,
            target,
            buf: vec![0; bsize],
            total: 0,
        }
    }

    fn apply(mut self, delta: &Delta) -> Result<u64> {
        for chunk in delta.chunks() {
            match chunk {
                Chunk::Reusable { start, length } => self.copy(*start, *length)?,
                Chunk::Literal(data) => self.literal(&data[..])?,
            }
        }
        self.target.flush()?;

        debug!(chunks = delta.len(), total = self.total, "delta applied");
        Ok(self.total)
    }

    /// Copy a basis range to target.
    fn copy(&mut self, start: u64, mut count: u64) -> Result<()> {
        self.basis.seek(SeekFrom::Start(start))?;
        while count > 0 {
            let k = Ord::min(count, self.buf.len() as u64) as usize;
            self.basis.read_exact(&mut self.buf[..k]).map_err(|e| {
                if e.kind() == ErrorKind::UnexpectedEof {
                    Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("basis too short for range {}+{}", start, count),
                    )
                } else {
                    e
                }
            })?;
            self.target.write_all(&self.buf[..k])?;
            self.total += k as u64;
            count -= k as u64;
        }
        Ok(())
    }

    /// Write literal data to target.
    fn literal(&mut self, data: &[u8]) -> Result<()> {
        self.target.write_all(data)?;
        self.total += data.len() as u64;
        Ok(())
    }
}
