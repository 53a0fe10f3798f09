#![forbid(unsafe_code)]
use super::error::Result;
use super::rollsum::RollingChecksum;
use super::signature::Signature;
use super::utils::read_up_to;
use std::collections::VecDeque;
use std::io::{BufReader, Read};
use tracing::{debug, trace};

/// Default size of the read buffer wrapped around the new stream.
pub const BUFFER_SIZE: usize = 16384;

/// Single delta instruction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Chunk {
    /// Copy `length` bytes of the basis starting at `start`.
    Reusable { start: u64, length: u64 },

    /// Bytes not found in the basis.
    Literal(Vec<u8>),
}

impl Chunk {
    /// Number of bytes this chunk contributes to the reconstructed stream.
    pub fn len(&self) -> u64 {
        match self {
            Chunk::Reusable { length, .. } => *length,
            Chunk::Literal(data) => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge `next` into this chunk when both describe one continuous run,
    /// otherwise give `next` back.
    fn absorb(&mut self, next: Chunk) -> std::result::Result<(), Chunk> {
        match (self, next) {
            (
                Chunk::Reusable { start, length },
                Chunk::Reusable {
                    start: next_start,
                    length: next_length,
                },
            ) if start.checked_add(*length) == Some(next_start) => {
                *length += next_length;
                Ok(())
            }
            (Chunk::Literal(data), Chunk::Literal(more)) => {
                data.extend_from_slice(&more[..]);
                Ok(())
            }
            (_, next) => Err(next),
        }
    }
}

/// Ordered chunk sequence turning a basis into a new stream.
///
/// Chunks appended with [`Delta::push`] are coalesced: adjacent literals are
/// concatenated and a reusable range that continues the previous one extends
/// it. Reusable ranges that are not contiguous in the basis stay separate.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Delta {
    chunks: Vec<Chunk>,
}

impl Delta {
    /// Compute the delta of `new` against `signature` with default settings.
    pub fn new<R: Read>(new: R, signature: &Signature) -> Result<Self> {
        Rsdiff::new(signature).compare(new)
    }

    /// Append a chunk, merging it into the last one where possible.
    /// Empty chunks are dropped.
    pub fn push(&mut self, chunk: Chunk) {
        if chunk.is_empty() {
            return;
        }
        let rest = match self.chunks.last_mut() {
            Some(last) => last.absorb(chunk),
            None => Err(chunk),
        };
        if let Err(chunk) = rest {
            self.chunks.push(chunk);
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks[..]
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Size of the stream this delta reconstructs, saturating at
    /// `u64::MAX` for decoded deltas with absurd ranges.
    pub fn target_len(&self) -> u64 {
        self.chunks
            .iter()
            .fold(0, |total: u64, c| total.saturating_add(c.len()))
    }

    /// Number of bytes carried inline by literal chunks.
    pub fn literal_len(&self) -> u64 {
        self.chunks
            .iter()
            .filter(|c| matches!(c, Chunk::Literal(_)))
            .fold(0, |total: u64, c| total.saturating_add(c.len()))
    }
}

impl From<Vec<Chunk>> for Delta {
    /// Wrap chunks as they are, without coalescing.
    fn from(chunks: Vec<Chunk>) -> Self {
        Delta { chunks }
    }
}

/// Rsync delta calculator.
///
/// Scans the new stream block by block; where a block is not found in the
/// basis it slides byte by byte until the window matches a basis block
/// again.
///
/// Compute the delta between a basis and a new version:
/// ```
/// use std::io;
/// use rsdelta::{Delta, Rsdiff, Signature};
///
/// fn rsdiff(basis: &[u8], new: &[u8]) -> rsdelta::Result<Delta> {
///     let sig = Signature::new(basis, 32)?;
///     Rsdiff::new(&sig).buffer_size(4096).compare(new)
/// }
/// ```
pub struct Rsdiff<'s> {
    signature: &'s Signature,
    bsize: usize,
}

impl<'s> Rsdiff<'s> {
    /// Create new configuration for delta calculation against `signature`.
    pub fn new(signature: &'s Signature) -> Self {
        Rsdiff {
            signature,
            bsize: BUFFER_SIZE,
        }
    }

    /// Set the read buffer size (`bs >= 128`, default is `BUFFER_SIZE`).
    pub fn buffer_size(mut self, mut bs: usize) -> Self {
        if bs < 128 {
            bs = 128;
        }
        self.bsize = bs;
        self
    }

    /// Scan `new` and build the delta.
    pub fn compare<R: Read>(&self, new: R) -> Result<Delta> {
        let input = BufReader::with_capacity(self.bsize, new);
        let mut scanner = Scanner::new(self.signature, input);
        let mut delta = Delta::default();
        while let Some(chunk) = scanner.next_chunk()? {
            delta.push(chunk);
        }

        debug!(
            chunks = delta.len(),
            target = delta.target_len(),
            literal = delta.literal_len(),
            "delta computed"
        );
        Ok(delta)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mode {
    /// Read the next non-overlapping window.
    Aligned,
    /// Slide the current window by one byte.
    Resync,
    /// Input exhausted.
    Done,
}

/// Scanning state of one delta calculation.
struct Scanner<'s, R> {
    sig: &'s Signature,
    input: R,
    mode: Mode,
    sum: RollingChecksum,
    window: VecDeque<u8>,
    block: Vec<u8>,
    /// Block following the last match.
    hint: Option<usize>,
}

impl<'s, R: Read> Scanner<'s, R> {
    fn new(sig: &'s Signature, input: R) -> Self {
        // Buffers grow with the input; the block length may come from an
        // untrusted signature.
        Scanner {
            sig,
            input,
            mode: Mode::Aligned,
            sum: RollingChecksum::new(),
            window: VecDeque::new(),
            block: Vec::new(),
            hint: None,
        }
    }

    /// Advance the window and emit the next chunk, `None` at the end.
    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        match self.mode {
            Mode::Done => return Ok(None),
            Mode::Aligned => {
                self.block.clear();
                let limit = u64::from(self.sig.block_length());
                if self.input.by_ref().take(limit).read_to_end(&mut self.block)? == 0 {
                    self.mode = Mode::Done;
                    return Ok(None);
                }
                self.window.clear();
                self.window.extend(&self.block[..]);
                self.sum.init(&self.block[..]);
            }
            Mode::Resync => {
                let mut byte = [0; 1];
                if read_up_to(&mut self.input, &mut byte[..])? == 0 {
                    self.mode = Mode::Done;
                    return Ok(self.flush());
                }
                if let Some(out) = self.window.pop_front() {
                    self.sum.roll(out, byte[0]);
                }
                self.window.push_back(byte[0]);
            }
        }
        Ok(Some(self.evaluate()))
    }

    /// Match the current window against the signature.
    fn evaluate(&mut self) -> Chunk {
        let weak = self.sum.sum();
        let found = if self.sig.has_weak(weak) {
            self.sig.find(weak, self.window.make_contiguous(), self.hint)
        } else {
            None
        };

        match found {
            Some(id) => {
                let start = self.sig.offset_of(id);
                let length = self.window.len() as u64;
                trace!(block = id, start, length, "block matched");
                self.mode = Mode::Aligned;
                self.hint = Some(id + 1);
                Chunk::Reusable { start, length }
            }
            None => {
                self.mode = Mode::Resync;
                self.hint = None;
                Chunk::Literal(self.window.front().copied().into_iter().collect())
            }
        }
    }

    /// Remaining window at the end of a resync run. Its first byte has
    /// already been emitted.
    fn flush(&mut self) -> Option<Chunk> {
        self.window.pop_front();
        if self.window.is_empty() {
            None
        } else {
            Some(Chunk::Literal(self.window.drain(..).collect()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::utils::faults::FailingReader;
    use std::io::{Cursor, ErrorKind};

    fn hello() -> Vec<u8> {
        b"hello ".repeat(11)
    }

    fn hello_signature() -> Signature {
        Signature::new(Cursor::new(hello()), 32).unwrap()
    }

    fn reusable(start: u64, length: u64) -> Chunk {
        Chunk::Reusable { start, length }
    }

    #[test]
    fn no_changes() {
        let delta = Delta::new(Cursor::new(hello()), &hello_signature()).unwrap();
        assert_eq!(delta.chunks(), &[reusable(0, 66)]);
        assert_eq!(delta.target_len(), 66);
        assert_eq!(delta.literal_len(), 0);
    }

    #[test]
    fn changed_byte() {
        let mut new = hello();
        new[31] = 102;
        let delta = Delta::new(Cursor::new(&new), &hello_signature()).unwrap();
        assert_eq!(
            delta.chunks(),
            &[Chunk::Literal(new[..32].to_vec()), reusable(32, 34)]
        );
    }

    #[test]
    fn inserted_byte() {
        let mut new = hello();
        new.insert(32, 19);
        let delta = Delta::new(Cursor::new(&new), &hello_signature()).unwrap();
        assert_eq!(
            delta.chunks(),
            &[reusable(0, 32), Chunk::Literal(vec![19]), reusable(32, 34)]
        );
    }

    #[test]
    fn removed_byte() {
        let mut new = hello();
        new.remove(31);
        let delta = Delta::new(Cursor::new(&new), &hello_signature()).unwrap();
        assert_eq!(
            delta.chunks(),
            &[Chunk::Literal(new[..31].to_vec()), reusable(32, 34)]
        );
    }

    #[test]
    fn empty_new_stream() {
        let delta = Delta::new(Cursor::new(b""), &hello_signature()).unwrap();
        assert!(delta.is_empty());
    }

    #[test]
    fn empty_basis_gives_single_literal() {
        let sig = Signature::new(Cursor::new(b""), 32).unwrap();
        let new = b"completely new content, longer than a block".to_vec();
        let delta = Delta::new(Cursor::new(&new), &sig).unwrap();
        assert_eq!(delta.chunks(), &[Chunk::Literal(new)]);
    }

    #[test]
    fn short_tail_after_literal() {
        // The short trailing window never matches and ends in resync mode.
        let sig = hello_signature();
        let new = b"xy".to_vec();
        let delta = Delta::new(Cursor::new(&new), &sig).unwrap();
        assert_eq!(delta.chunks(), &[Chunk::Literal(new)]);
    }

    #[test]
    fn reordered_blocks_stay_separate() {
        let basis: Vec<u8> = (0..96u8).collect();
        let sig = Signature::new(Cursor::new(&basis), 32).unwrap();
        let mut new = basis[64..96].to_vec();
        new.extend_from_slice(&basis[0..64]);
        let delta = Delta::new(Cursor::new(&new), &sig).unwrap();
        assert_eq!(delta.chunks(), &[reusable(64, 32), reusable(0, 64)]);
    }

    #[test]
    fn literal_does_not_alias_window() {
        let basis: Vec<u8> = (0..64u8).collect();
        let sig = Signature::new(Cursor::new(&basis), 32).unwrap();
        let mut new = b"abcdefgh".to_vec();
        new.extend_from_slice(&basis[..]);
        new.extend_from_slice(b"ijk");
        let delta = Rsdiff::new(&sig)
            .buffer_size(1)
            .compare(Cursor::new(&new))
            .unwrap();
        assert_eq!(
            delta.chunks(),
            &[
                Chunk::Literal(b"abcdefgh".to_vec()),
                reusable(0, 64),
                Chunk::Literal(b"ijk".to_vec()),
            ]
        );
        assert_eq!(delta.target_len(), new.len() as u64);
    }

    #[test]
    fn repeated_blocks_stay_contiguous() {
        let basis = vec![0; 100];
        let sig = Signature::new(Cursor::new(&basis), 32).unwrap();
        let delta = Delta::new(Cursor::new(&basis), &sig).unwrap();
        assert_eq!(delta.chunks(), &[reusable(0, 100)]);
    }

    #[test]
    fn push_coalesces() {
        let mut delta = Delta::default();
        delta.push(reusable(0, 32));
        delta.push(reusable(32, 32));
        delta.push(Chunk::Literal(vec![1]));
        delta.push(Chunk::Literal(vec![]));
        delta.push(Chunk::Literal(vec![2, 3]));
        delta.push(reusable(128, 4));
        delta.push(reusable(0, 4));
        assert_eq!(
            delta.into_chunks(),
            vec![
                reusable(0, 64),
                Chunk::Literal(vec![1, 2, 3]),
                reusable(128, 4),
                reusable(0, 4),
            ]
        );
    }

    #[test]
    fn push_does_not_overflow() {
        let mut delta = Delta::default();
        delta.push(reusable(u64::MAX, 1));
        delta.push(reusable(0, 1));
        assert_eq!(delta.len(), 2);
    }

    #[test]
    fn huge_block_length_from_decoded_signature() {
        let sig = Signature::read(&[0xff; 4][..]).unwrap();
        assert_eq!(sig.block_length(), u32::MAX);
        let delta = Delta::new(&b"abc"[..], &sig).unwrap();
        assert_eq!(delta.chunks(), &[Chunk::Literal(b"abc".to_vec())]);
    }

    #[test]
    fn failing_new_stream() {
        let mut new = hello();
        new[40] ^= 0xff;
        for &fail_at in [16, 48].iter() {
            let input = FailingReader::new(new.clone(), fail_at);
            match Rsdiff::new(&hello_signature()).compare(input) {
                Err(Error::Io(e)) => assert_eq!(e.kind(), ErrorKind::Other),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn lengths_saturate() {
        let delta = Delta::from(vec![reusable(0, u64::MAX), reusable(1, 1)]);
        assert_eq!(delta.target_len(), u64::MAX);
        assert_eq!(delta.literal_len(), 0);
    }
}
