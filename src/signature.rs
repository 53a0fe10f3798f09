#![forbid(unsafe_code)]
use super::error::{Error, Result};
use super::rollsum::RollingChecksum;
use super::strong::{strong_hash, StrongHash, STRONG_HASH_SIZE};
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Default block length.
pub const DEFAULT_BLOCK_LENGTH: u32 = 32;

/// Smallest accepted block length, the size of the strong hash.
pub const MIN_BLOCK_LENGTH: u32 = STRONG_HASH_SIZE as u32;

/// Weak and strong sums of a single basis block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BlockSum {
    pub weak: u32,
    pub strong: StrongHash,
}

impl BlockSum {
    /// Compute both sums of `block`.
    pub fn of(block: &[u8]) -> Self {
        BlockSum {
            weak: RollingChecksum::of(block),
            strong: strong_hash(block),
        }
    }
}

/// Fingerprint of a basis stream.
///
/// The basis is cut into non-overlapping blocks of `block_length` bytes
/// (the last one may be shorter). Each block is identified by its 0-based
/// index and described by a [`BlockSum`]. Blocks sharing a weak checksum
/// are all kept as candidates and resolved by their strong hash.
///
/// Build a signature and write it out:
/// ```
/// use std::io;
/// use rsdelta::Signature;
///
/// fn signature(basis: &[u8]) -> rsdelta::Result<Vec<u8>> {
///     let mut out = Vec::new();
///     Signature::new(basis, 64)?.write(io::Cursor::new(&mut out))?;
///     Ok(out)
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Signature {
    block_length: u32,
    blocks: Vec<BlockSum>,
    index: HashMap<u32, Vec<usize>>,
}

impl Signature {
    /// Scan `basis` and build its signature.
    ///
    /// Return error if `block_length` is smaller than `MIN_BLOCK_LENGTH`, or
    /// if reading the basis fails.
    pub fn new<R: Read>(mut basis: R, block_length: u32) -> Result<Self> {
        check_block_length(block_length)?;

        let mut sig = Signature {
            block_length,
            blocks: Vec::new(),
            index: HashMap::new(),
        };
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = basis
                .by_ref()
                .take(u64::from(block_length))
                .read_to_end(&mut buf)?;
            if n == 0 {
                break;
            }
            sig.push(BlockSum::of(&buf[..]));
            if n < block_length as usize {
                break;
            }
        }

        debug!(
            block_length,
            blocks = sig.blocks.len(),
            "signature generated"
        );
        Ok(sig)
    }

    /// Create a signature from precomputed block sums, given in block order.
    pub fn from_blocks(block_length: u32, blocks: Vec<BlockSum>) -> Result<Self> {
        check_block_length(block_length)?;

        let mut sig = Signature {
            block_length,
            blocks: Vec::with_capacity(blocks.len()),
            index: HashMap::with_capacity(blocks.len()),
        };
        for block in blocks {
            sig.push(block);
        }
        Ok(sig)
    }

    /// The block length used to cut the basis.
    pub fn block_length(&self) -> u32 {
        self.block_length
    }

    /// Number of basis blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block sums in block order.
    pub fn blocks(&self) -> &[BlockSum] {
        &self.blocks[..]
    }

    /// Byte offset of block `id` within the basis.
    pub fn offset_of(&self, id: usize) -> u64 {
        id as u64 * u64::from(self.block_length)
    }

    /// Tells whether any block has the weak checksum `weak`.
    #[inline]
    pub fn has_weak(&self, weak: u32) -> bool {
        self.index.contains_key(&weak)
    }

    /// Look up the block whose sums match `window`, given its weak checksum.
    ///
    /// When `hint` names a matching block it wins, so runs of identical
    /// blocks stay contiguous. Otherwise candidates sharing the weak checksum
    /// are tried in block order and the first one whose strong hash equals
    /// the window's wins.
    pub fn find(&self, weak: u32, window: &[u8], hint: Option<usize>) -> Option<usize> {
        let candidates = self.index.get(&weak)?;
        let strong = strong_hash(window);
        let matches = |id: usize| {
            self.blocks
                .get(id)
                .map_or(false, |b| b.weak == weak && b.strong == strong)
        };
        hint.filter(|&id| matches(id))
            .or_else(|| candidates.iter().copied().find(|&id| matches(id)))
    }

    fn push(&mut self, block: BlockSum) {
        let id = self.blocks.len();
        self.index.entry(block.weak).or_insert_with(Vec::new).push(id);
        self.blocks.push(block);
    }
}

fn check_block_length(block_length: u32) -> Result<()> {
    if block_length < MIN_BLOCK_LENGTH {
        return Err(Error::BlockLength {
            length: block_length,
            min: MIN_BLOCK_LENGTH,
        });
    }
    Ok(())
}
