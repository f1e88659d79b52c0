use crate::block::{BLOCK_BITS, Block};
use crate::cardinality;
use crate::config::FilterConfig;
use crate::hash::derive;
use crate::optimize::optimize;
use crate::traits::BloomFilterStats;
use serde::{Deserialize, Serialize};

/// Maximum number of blocks in a filter. Block selection reduces into a
/// 32-bit range.
pub const MAX_BLOCKS: u64 = u32::MAX as u64;

/// Maximum number of bits in a filter (just under 256GiB).
pub const MAX_BITS: u64 = BLOCK_BITS * MAX_BLOCKS;

/// A blocked Bloom filter.
///
/// Keys are represented exclusively by a caller-supplied 64-bit hash; the
/// filter never hashes anything itself. Two filters are equal when they
/// have the same number of hashes and identical blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter")]
pub struct Filter {
    blocks: Vec<Block>,
    num_hashes: usize,
}

/// Unvalidated serde form of [`Filter`].
#[derive(Deserialize)]
struct RawFilter {
    blocks: Vec<Block>,
    num_hashes: usize,
}

impl TryFrom<RawFilter> for Filter {
    type Error = String;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        if raw.blocks.is_empty() {
            return Err("filter must have at least one block".to_string());
        }
        if raw.blocks.len() as u64 > MAX_BLOCKS {
            return Err(format!(
                "filter has {} blocks, more than {MAX_BLOCKS}",
                raw.blocks.len()
            ));
        }
        if raw.num_hashes < 2 {
            return Err(format!(
                "filter needs at least 2 hashes, got {}",
                raw.num_hashes
            ));
        }
        Ok(Filter {
            blocks: raw.blocks,
            num_hashes: raw.num_hashes,
        })
    }
}

impl Filter {
    /// Creates an empty filter with at least `nbits` bits and `nhashes`
    /// hash functions.
    ///
    /// `nbits` is rounded up to a multiple of [`BLOCK_BITS`]; zero gives one
    /// block. `nhashes` is the number of hashes synthesized from each key's
    /// single hash; values below two are raised to two, since one selects
    /// the block and at least one more sets a bit in it.
    ///
    /// # Panics
    ///
    /// When `nbits` exceeds [`MAX_BITS`].
    pub fn new(nbits: u64, nhashes: usize) -> Self {
        assert!(
            nbits <= MAX_BITS,
            "nbits {nbits} exceeds MAX_BITS {MAX_BITS}"
        );
        let nblocks = nbits.div_ceil(BLOCK_BITS).max(1);

        Self {
            blocks: vec![Block::default(); nblocks as usize],
            num_hashes: nhashes.max(2),
        }
    }

    /// Shorthand for `Filter::new` applied to [`optimize`]`(config)`.
    pub fn optimized(config: &FilterConfig) -> Self {
        let (nbits, nhashes) = optimize(config);
        Self::new(nbits, nhashes)
    }

    /// Wraps blocks read from storage. Shape is validated by the caller.
    pub(crate) fn from_blocks(blocks: Vec<Block>, num_hashes: usize) -> Self {
        debug_assert!(!blocks.is_empty() && num_hashes >= 2);
        Self { blocks, num_hashes }
    }

    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Number of [`BLOCK_BITS`]-sized blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Inserts a key with hash value `hash`. Inserting the same hash again
    /// leaves the filter unchanged.
    pub fn insert(&mut self, hash: u64) {
        let (i, probes) = derive(hash, self.blocks.len(), self.num_hashes);
        let block = &mut self.blocks[i];
        for pos in probes {
            block.set_bit(pos);
        }
    }

    /// Reports whether a key with hash value `hash` may have been inserted.
    ///
    /// `false` is definite; `true` may be a false positive.
    pub fn contains(&self, hash: u64) -> bool {
        let (i, mut probes) = derive(hash, self.blocks.len(), self.num_hashes);
        let block = &self.blocks[i];
        probes.all(|pos| block.get_bit(pos))
    }

    /// Resets every bit to zero.
    pub fn clear(&mut self) {
        self.blocks.fill(Block::default());
    }

    /// Sets every bit, so that `contains` answers `true` for everything.
    pub fn fill(&mut self) {
        self.blocks.fill(Block::FULL);
    }
}

impl BloomFilterStats for Filter {
    fn num_bits(&self) -> u64 {
        BLOCK_BITS * self.blocks.len() as u64
    }

    fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_zero)
    }

    fn cardinality(&self) -> f64 {
        cardinality::estimate(self.blocks.iter().map(Block::ones), self.num_hashes)
    }
}
