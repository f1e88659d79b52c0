//! Fixed-size block: the cache-line-sized unit every bit operation is
//! scoped to.
//!
//! Bit `i` of a block lives in word `i / 32` at position `i % 32`
//! (least-significant first). Encoded as little-endian words this puts
//! bit `i` in byte `i / 8` at position `i % 8`, the same layout a block
//! of eight little-endian `u64` words would have.

use bitvec::{order::Lsb0, view::BitView};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Number of bits per block and the minimum number of bits in a filter.
///
/// Matches the L1 cache line size of common architectures.
pub const BLOCK_BITS: u64 = 512;

/// Size of one encoded block.
pub const BLOCK_BYTES: usize = BLOCK_BITS as usize / 8;

pub(crate) const WORD_BITS: u32 = u32::BITS;
pub(crate) const BLOCK_WORDS: usize = BLOCK_BITS as usize / WORD_BITS as usize;

#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(C, align(64))]
pub(crate) struct Block(pub(crate) [u32; BLOCK_WORDS]);

#[inline]
fn locate(i: u32) -> (usize, u32) {
    let word = (i / WORD_BITS) as usize % BLOCK_WORDS;
    (word, 1 << (i % WORD_BITS))
}

impl Block {
    pub(crate) const FULL: Block = Block([u32::MAX; BLOCK_WORDS]);

    /// Reports whether bit `i` modulo [`BLOCK_BITS`] is set.
    #[inline]
    pub(crate) fn get_bit(&self, i: u32) -> bool {
        let (word, mask) = locate(i);
        self.0[word] & mask != 0
    }

    /// Sets bit `i` modulo [`BLOCK_BITS`].
    #[inline]
    pub(crate) fn set_bit(&mut self, i: u32) {
        let (word, mask) = locate(i);
        self.0[word] |= mask;
    }

    pub(crate) fn ones(&self) -> usize {
        self.0.view_bits::<Lsb0>().count_ones()
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    #[inline]
    pub(crate) fn union(&mut self, other: &Block) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a |= *b;
        }
    }

    #[inline]
    pub(crate) fn intersect(&mut self, other: &Block) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a &= *b;
        }
    }

    pub(crate) fn to_le_bytes(self) -> [u8; BLOCK_BYTES] {
        let mut out = [0u8; BLOCK_BYTES];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub(crate) fn from_le_bytes(bytes: &[u8; BLOCK_BYTES]) -> Self {
        let mut block = Block::default();
        for (word, chunk) in block.0.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        block
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Block {{ ones: {} }}", self.ones())
    }
}

/// A [`Block`] viewed as atomic words.
///
/// Has the same size, alignment and field layout as `Block`, so a
/// `&mut [Block]` can be reborrowed as `&[AtomicBlock]`.
#[repr(C, align(64))]
pub(crate) struct AtomicBlock([AtomicU32; BLOCK_WORDS]);

const _: () = {
    assert!(std::mem::size_of::<Block>() == BLOCK_BYTES);
    assert!(std::mem::size_of::<AtomicBlock>() == BLOCK_BYTES);
    assert!(std::mem::align_of::<AtomicBlock>() == std::mem::align_of::<Block>());
};

impl AtomicBlock {
    pub(crate) fn from_blocks(blocks: &mut [Block]) -> &[AtomicBlock] {
        // SAFETY: AtomicU32 has the size and bit validity of u32, and both
        // wrappers are repr(C) with identical alignment (checked above).
        // The exclusive borrow guarantees no non-atomic access aliases the
        // returned view for its lifetime.
        unsafe {
            std::slice::from_raw_parts(
                blocks.as_mut_ptr().cast::<AtomicBlock>(),
                blocks.len(),
            )
        }
    }

    #[inline]
    pub(crate) fn get_bit(&self, i: u32) -> bool {
        let (word, mask) = locate(i);
        self.0[word].load(Ordering::Acquire) & mask != 0
    }

    /// Sets bit `i` with a compare-and-swap loop that gives up as soon as
    /// the bit is observed set, by this thread or any other.
    #[inline]
    pub(crate) fn set_bit(&self, i: u32) {
        let (word, mask) = locate(i);
        let word = &self.0[word];

        let mut old = word.load(Ordering::Acquire);
        loop {
            // Most bits are set early in a filter's life; skipping the CAS
            // for them is the common case.
            if old & mask != 0 {
                return;
            }
            match word.compare_exchange_weak(
                old,
                old | mask,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(current) => old = current,
            }
        }
    }

    pub(crate) fn ones(&self) -> usize {
        self.0
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.0.iter().all(|w| w.load(Ordering::Acquire) == 0)
    }
}
