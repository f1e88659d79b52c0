//! Lock-free concurrent inserts.
//!
//! [`Filter::as_atomic`] reborrows a filter's blocks as atomic words. The
//! resulting [`AtomicFilter`] can be shared by any number of threads, all
//! inserting and querying at once without a lock and without lost updates.
//! While the view is alive the filter itself is mutably borrowed, so
//! `clear`, `fill`, set algebra and plain `insert` cannot race with it.
//!
//! ```
//! use blocked_bloom::Filter;
//!
//! let mut filter = Filter::new(1 << 16, 6);
//! let hashes: Vec<u64> = (0..1000u64).map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15)).collect();
//!
//! let view = filter.as_atomic();
//! std::thread::scope(|s| {
//!     for chunk in hashes.chunks(250) {
//!         let view = &view;
//!         s.spawn(move || chunk.iter().for_each(|&h| view.insert(h)));
//!     }
//! });
//!
//! assert!(hashes.iter().all(|&h| filter.contains(h)));
//! ```

use crate::block::{AtomicBlock, BLOCK_BITS};
use crate::cardinality;
use crate::filter::Filter;
use crate::hash::derive;
use crate::traits::BloomFilterStats;

/// A shared, lock-free view of a [`Filter`].
///
/// Once `insert(h)` returns, any thread that synchronizes with the
/// inserting thread afterwards sees `contains(h) == true`.
#[derive(Clone, Copy)]
pub struct AtomicFilter<'a> {
    blocks: &'a [AtomicBlock],
    num_hashes: usize,
}

impl Filter {
    /// Borrows the filter for concurrent, lock-free inserts.
    pub fn as_atomic(&mut self) -> AtomicFilter<'_> {
        let num_hashes = self.num_hashes();
        AtomicFilter {
            blocks: AtomicBlock::from_blocks(self.blocks_mut()),
            num_hashes,
        }
    }
}

impl AtomicFilter<'_> {
    /// Atomically inserts a key with hash value `hash`.
    ///
    /// Sets the same bits as [`Filter::insert`], one compare-and-swap per
    /// word that is not already set.
    pub fn insert(&self, hash: u64) {
        let (i, probes) = derive(hash, self.blocks.len(), self.num_hashes);
        let block = &self.blocks[i];
        for pos in probes {
            block.set_bit(pos);
        }
    }

    /// Reports whether a key with hash value `hash` may have been inserted.
    pub fn contains(&self, hash: u64) -> bool {
        let (i, mut probes) = derive(hash, self.blocks.len(), self.num_hashes);
        let block = &self.blocks[i];
        probes.all(|pos| block.get_bit(pos))
    }
}

impl BloomFilterStats for AtomicFilter<'_> {
    fn num_bits(&self) -> u64 {
        BLOCK_BITS * self.blocks.len() as u64
    }

    fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// May report a filter as non-empty while a racing insert is under way;
    /// never reports empty after an insert has returned.
    fn is_empty(&self) -> bool {
        self.blocks.iter().all(AtomicBlock::is_zero)
    }

    fn cardinality(&self) -> f64 {
        cardinality::estimate(self.blocks.iter().map(AtomicBlock::ones), self.num_hashes)
    }
}

impl std::fmt::Debug for AtomicFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicFilter")
            .field("num_blocks", &self.blocks.len())
            .field("num_hashes", &self.num_hashes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn test_atomic_matches_plain_insert() {
        let mut rng = StdRng::seed_from_u64(0xa70);
        let hashes: Vec<u64> = (0..2000).map(|_| rng.random()).collect();

        let mut plain = Filter::new(20_000, 7);
        for &h in &hashes {
            plain.insert(h);
        }

        let mut shared = Filter::new(20_000, 7);
        {
            let view = shared.as_atomic();
            assert!(view.is_empty());
            for &h in &hashes {
                view.insert(h);
                assert!(view.contains(h));
            }
            assert!(!view.is_empty());
            assert_eq!(view.cardinality(), plain.cardinality());
        }
        assert_eq!(shared, plain);
    }

    #[test]
    fn test_view_reports_shape() {
        let mut f = Filter::new(3 * BLOCK_BITS, 5);
        let view = f.as_atomic();
        assert_eq!(view.num_bits(), 3 * BLOCK_BITS);
        assert_eq!(view.num_hashes(), 5);
        assert_eq!(view.cardinality(), 0.0);
    }
}
