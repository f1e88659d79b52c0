//! Expands a single caller-supplied 64-bit hash into a block selector and
//! the in-block bit positions.
//!
//! The upper and lower halves of the hash are treated as two independent
//! 32-bit hashes `h1` and `h2`. Further positions come from the enhanced
//! double hashing construction of Dillinger and Manolios:
//!
//! ```text
//! h1' = h1 + h2
//! h2' = h2 + i
//! ```
//!
//! where `i` is the 0-based iteration. Unlike plain double hashing this does
//! not collapse to a single position when `h2` happens to be zero.

/// Maps `i` to an integer in `[0, n)` with a multiply and a shift instead of
/// a division.
///
/// <https://lemire.me/blog/2016/06/27/a-fast-alternative-to-the-modulo-reduction/>
#[inline]
pub(crate) fn reduce_range(i: u32, n: u32) -> u32 {
    ((u64::from(i) * u64::from(n)) >> 32) as u32
}

/// One step of enhanced double hashing.
#[inline]
pub(crate) fn double_hash(h1: u32, h2: u32, i: u32) -> (u32, u32) {
    (h1.wrapping_add(h2), h2.wrapping_add(i))
}

/// Bit positions derived from one hash. Positions are raw 32-bit values;
/// blocks reduce them modulo the block width.
#[derive(Clone, Debug)]
pub(crate) struct Probes {
    h1: u32,
    h2: u32,
    i: u32,
    remaining: usize,
}

impl Iterator for Probes {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let pos = self.h1;
        (self.h1, self.h2) = double_hash(self.h1, self.h2, self.i);
        self.i = self.i.wrapping_add(1);
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Probes {}

/// Splits `hash` into the index of the block to use (out of `num_blocks`)
/// and the `num_hashes - 1` positions to set or test inside it.
///
/// `num_blocks` must fit in a `u32`; filters guarantee this through
/// [`MAX_BITS`](crate::MAX_BITS).
#[inline]
pub(crate) fn derive(hash: u64, num_blocks: usize, num_hashes: usize) -> (usize, Probes) {
    let h1 = (hash >> 32) as u32;
    let h2 = hash as u32;
    let block = reduce_range(h1, num_blocks as u32) as usize;

    let probes = Probes {
        h1,
        h2,
        i: 0,
        remaining: num_hashes.saturating_sub(1),
    };
    (block, probes)
}
