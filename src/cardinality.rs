//! Cardinality from the fill ratio.
//!
//! Uses the maximum likelihood estimate of Papapetrou, Siberski and Nejdl
//! (<https://www.win.tue.nl/~opapapetrou/papers/Bloomfilters-DAPD.pdf>),
//! applied to each block on its own and summed. Blocks fill independently
//! because the block selector routes every key to exactly one of them.

use crate::block::BLOCK_BITS;

/// Sums the per-block estimates given the number of set bits in each block.
pub(crate) fn estimate<I>(ones_per_block: I, num_hashes: usize) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let block = BLOCK_BITS as f64;
    // One hash picks the block, the rest set bits in it.
    let k = (num_hashes - 1) as f64;

    // A single insertion leaves a given bit unset with probability
    // p0 = (1 - 1/BLOCK_BITS)^k, so 1/log(p0) = 1 / (k * log(1 - 1/BLOCK_BITS)).
    let log_prob0_inv = 1.0 / (k * (-1.0 / block).ln_1p());

    let mut n = 0.0;
    for ones in ones_per_block {
        if ones == 0 {
            continue;
        }
        // ln_1p(-1) is -inf, so a saturated block makes the sum +inf.
        n += (-(ones as f64) / block).ln_1p() * log_prob0_inv;
    }
    n
}
