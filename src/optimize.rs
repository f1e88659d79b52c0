//! Filter sizing for a target capacity and false positive rate.
//!
//! A blocked Bloom filter needs more bits per key than a standard one to
//! reach the same false positive rate, because keys do not spread evenly
//! over blocks. The overhead follows Putze, Sanders and Singler,
//! "Cache-, Hash- and Space-Efficient Bloom Filters" (2010):
//! <https://algo2.iti.kit.edu/documents/cacheefficientbloomfilters-jea.pdf>.

use crate::block::BLOCK_BITS;
use crate::config::FilterConfig;
use crate::filter::MAX_BITS;
use std::f64::consts::LN_2;
use tracing::{debug, warn};

/// Maps bits per key `c = m/n` of a standard Bloom filter to the `c'` a
/// blocked filter needs for the same false positive rate.
///
/// Putze et al.'s Table I, extended down to zero. Past 34 the values grow
/// too fast to be useful.
static CORRECT_C: [u8; 35] = [
    1, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 18, 20, 21, 23, 25,
    26, 28, 30, 32, 35, 38, 40, 44, 48, 51, 58, 64, 74, 90,
];

/// Returns the number of bits and hashes that achieve the false positive
/// rate described by `config`.
///
/// The bit count is a multiple of [`BLOCK_BITS`], at least one block, and
/// never above `config.max_bits` (rounded down to a block) unless that is
/// smaller than one block. Clamping trades a worse false positive rate for
/// the memory bound.
///
/// # Panics
///
/// When the false positive rate is not in (0, 1].
pub fn optimize(config: &FilterConfig) -> (u64, usize) {
    let p = config.false_positive_rate;
    assert!(
        p > 0.0 && p <= 1.0,
        "false positive rate for a Bloom filter must be > 0 and <= 1, got {p}"
    );
    // Callers want room for at least one key; log2(0) is -inf.
    let n = config.capacity.max(1) as f64;

    // Optimal bits per key for a standard Bloom filter: -log2(p) / ln(2).
    let mut c = (-p.log2() / LN_2).ceil();
    c = match CORRECT_C.get(c as usize) {
        Some(&corrected) => f64::from(corrected),
        None => c * 3.0,
    };

    // Saturating float-to-int cast, then keep the rounding below overflow.
    let mut nbits = ((c * n).ceil() as u64).min(MAX_BITS);
    nbits = nbits.div_ceil(BLOCK_BITS) * BLOCK_BITS;

    let limit = match config.max_bits {
        Some(max) if max < MAX_BITS => max,
        _ => MAX_BITS,
    };
    if nbits > limit {
        warn!(
            wanted = nbits,
            max_bits = limit,
            "filter size clamped, false positive rate will exceed target"
        );
        nbits = (limit - limit % BLOCK_BITS).max(BLOCK_BITS);
    }

    // k = c * ln(2) for the bits per key actually granted.
    let c = nbits as f64 / n;
    let nhashes = ((c * LN_2).round() as usize).max(1);

    debug!(
        capacity = config.capacity,
        false_positive_rate = p,
        nbits,
        nhashes,
        "optimized filter size"
    );
    (nbits, nhashes)
}

/// Estimates the false positive rate of a filter with `nbits` bits and
/// `nhashes` hashes after `nkeys` distinct keys have been inserted.
///
/// This is Putze et al.'s Equation (3): the per-block false positive rate
/// weighted by the Poisson distribution of keys over blocks.
///
/// # Panics
///
/// When `nbits` or `nhashes` is zero.
pub fn fp_rate(nkeys: u64, nbits: u64, nhashes: usize) -> f64 {
    assert!(nbits > 0, "number of bits must be > 0");
    assert!(nhashes > 0, "number of hashes must be > 0");
    if nkeys == 0 {
        return 0.0;
    }

    let c = nbits as f64 / nkeys as f64;
    fp_rate_series(c, nhashes as f64).0
}

/// Sums the series for bits-per-key `c` and `k` hashes. Also returns the
/// number of terms used.
///
/// The terms are log-concave in the number of keys per block, so the sum
/// starts at the Poisson mode and walks outwards on both sides until a term
/// drops below 1e-8 of the running sum. The remainder of each side is then
/// added as a geometric tail with the ratio of the last two terms. This
/// needs O(sqrt(lambda)) terms instead of O(lambda), and an overloaded
/// filter still sums to 1 within about 1e-8.
pub(crate) fn fp_rate_series(c: f64, k: f64) -> (f64, usize) {
    const EPS: f64 = 1e-8;

    let block = BLOCK_BITS as f64;
    let lambda = block / c;
    let log_term = |i: f64| log_poisson(lambda, i) + log_fpr_block(block / i, k);

    let mode = lambda.floor();
    let first = log_term(mode);
    let mut sum = first.exp();
    let mut terms = 1usize;

    // Upper side.
    let (mut i, mut prev, mut prev_log) = (mode, sum, first);
    loop {
        i += 1.0;
        let lt = log_term(i);
        let t = lt.exp();
        sum += t;
        terms += 1;
        if t < EPS * sum {
            sum += geometric_tail(t, prev, f64::INFINITY);
            break;
        }
        // Past the peak and underflowed: every further term is zero too.
        if t == 0.0 && lt < prev_log {
            break;
        }
        (prev, prev_log) = (t, lt);
    }

    // Lower side, down to zero keys per block.
    let (mut i, mut prev) = (mode, first.exp());
    while i > 0.0 {
        i -= 1.0;
        let t = log_term(i).exp();
        sum += t;
        terms += 1;
        if t < EPS * sum {
            sum += geometric_tail(t, prev, i);
            break;
        }
        prev = t;
    }

    (sum.min(1.0), terms)
}

/// Sum of at most `n` further terms continuing `t` with ratio `t / prev`.
fn geometric_tail(t: f64, prev: f64, n: f64) -> f64 {
    if !(prev > 0.0 && t < prev) {
        return 0.0;
    }
    let r = t / prev;
    let scale = if n.is_finite() { 1.0 - r.powf(n) } else { 1.0 };
    t * r / (1.0 - r) * scale
}

/// Log of the false positive rate of a single block holding `c` bits per
/// key.
pub(crate) fn log_fpr_block(c: f64, k: f64) -> f64 {
    k * (-(-k / c).exp()).ln_1p()
}

/// Log of the Poisson pmf with mean `lambda` at `k`.
fn log_poisson(lambda: f64, k: f64) -> f64 {
    debug_assert!(k >= 0.0, "negative k");
    k * lambda.ln() - lambda - libm::lgamma(k + 1.0)
}
