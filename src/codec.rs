#![forbid(unsafe_code)]
//! Binary encoding of signatures and deltas.
//!
//! All integers are big-endian with no padding, header or trailing
//! checksum. Both formats are a sequence of records read until a clean end
//! of stream.
//!
//! Signature:
//! ```text
//! block length    u32
//! per block:
//!   weak sum      u32
//!   strong hash   [u8; 32]
//! ```
//!
//! Delta, per chunk:
//! ```text
//! tag             u8      0 = reusable, 1 = literal
//! reusable:       start u64, length u64
//! literal:        length u64, data [u8; length]
//! ```
use super::error::{Error, Result};
use super::rsdiff::{Chunk, Delta};
use super::signature::{BlockSum, Signature};
use super::strong::STRONG_HASH_SIZE;
use super::utils::{read_exact_or_eof, read_up_to};
use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt, BE};
use std::io::{BufReader, BufWriter, Read, Write};
use tracing::debug;

/// Tag of a reusable chunk record.
pub const TAG_REUSABLE: u8 = 0;

/// Tag of a literal chunk record.
pub const TAG_LITERAL: u8 = 1;

/// Upper bound of the buffer preallocated for a literal payload.
const PREALLOC_MAX: u64 = 1 << 20;

impl Signature {
    /// Decode a signature.
    ///
    /// Return error if the stream is truncated, if a strong hash is cut
    /// short, or if the recorded block length is invalid.
    pub fn read<R: Read>(source: R) -> Result<Self> {
        let mut r = BufReader::new(source);
        let block_length = r.read_u32::<BE>()?;

        let mut blocks = Vec::new();
        let mut weak = [0; 4];
        let mut strong = [0; STRONG_HASH_SIZE];
        while read_exact_or_eof(&mut r, &mut weak[..])? != 0 {
            let n = read_up_to(&mut r, &mut strong[..])?;
            if n != STRONG_HASH_SIZE {
                return Err(Error::corrupt(format!(
                    "too short strong hash, got = {}, want = {}",
                    n, STRONG_HASH_SIZE
                )));
            }
            blocks.push(BlockSum {
                weak: BE::read_u32(&weak[..]),
                strong,
            });
        }

        let sig = Signature::from_blocks(block_length, blocks)?;
        debug!(block_length, blocks = sig.len(), "signature decoded");
        Ok(sig)
    }

    /// Encode the signature to `sink`.
    ///
    /// The count of bytes written would be returned if no error occurs.
    pub fn write<W: Write>(&self, sink: W) -> Result<u64> {
        let mut w = BufWriter::new(sink);
        w.write_u32::<BE>(self.block_length())?;
        for block in self.blocks() {
            w.write_u32::<BE>(block.weak)?;
            w.write_all(&block.strong[..])?;
        }
        w.flush()?;
        Ok(4 + self.len() as u64 * (4 + STRONG_HASH_SIZE as u64))
    }
}

impl Delta {
    /// Decode a delta. Chunks are kept exactly as recorded.
    ///
    /// Return error on an unknown chunk tag, a truncated record or a literal
    /// payload shorter than its recorded length.
    pub fn read<R: Read>(source: R) -> Result<Self> {
        let mut r = BufReader::new(source);
        let mut chunks = Vec::new();
        while let Some(chunk) = read_chunk(&mut r)? {
            chunks.push(chunk);
        }

        let delta = Delta::from(chunks);
        debug!(chunks = delta.len(), "delta decoded");
        Ok(delta)
    }

    /// Encode the delta to `sink`.
    ///
    /// The count of bytes written would be returned if no error occurs.
    pub fn write<W: Write>(&self, sink: W) -> Result<u64> {
        let mut w = BufWriter::new(sink);
        let mut total = 0;
        for chunk in self.chunks() {
            total += write_chunk(&mut w, chunk)?;
        }
        w.flush()?;
        Ok(total)
    }
}

/// Encode a single chunk record, return its size.
fn write_chunk<W: Write>(w: &mut W, chunk: &Chunk) -> Result<u64> {
    match chunk {
        Chunk::Reusable { start, length } => {
            w.write_u8(TAG_REUSABLE)?;
            w.write_u64::<BE>(*start)?;
            w.write_u64::<BE>(*length)?;
            Ok(17)
        }
        Chunk::Literal(data) => {
            w.write_u8(TAG_LITERAL)?;
            w.write_u64::<BE>(data.len() as u64)?;
            w.write_all(&data[..])?;
            Ok(9 + data.len() as u64)
        }
    }
}

/// Decode the next chunk record, `None` on a clean end of stream.
fn read_chunk<R: Read>(r: &mut R) -> Result<Option<Chunk>> {
    let mut tag = [0; 1];
    if read_exact_or_eof(r, &mut tag[..])? == 0 {
        return Ok(None);
    }

    match tag[0] {
        TAG_REUSABLE => {
            let start = r.read_u64::<BE>()?;
            let length = r.read_u64::<BE>()?;
            Ok(Some(Chunk::Reusable { start, length }))
        }
        TAG_LITERAL => {
            let length = r.read_u64::<BE>()?;
            let mut data = Vec::with_capacity(Ord::min(length, PREALLOC_MAX) as usize);
            r.by_ref().take(length).read_to_end(&mut data)?;
            if data.len() as u64 != length {
                return Err(Error::corrupt(format!(
                    "literal length mismatch, got = {}, want = {}",
                    data.len(),
                    length
                )));
            }
            Ok(Some(Chunk::Literal(data)))
        }
        other => Err(Error::corrupt(format!(
            "unknown chunk type = {:#x}",
            other
        ))),
    }
}
