use crate::optimize::fp_rate;

/// Shape and fill statistics shared by every filter flavour.
pub trait BloomFilterStats {
    /// Total number of bits, a positive multiple of
    /// [`BLOCK_BITS`](crate::BLOCK_BITS).
    fn num_bits(&self) -> u64;

    /// Number of hash functions synthesized per key, at least two.
    fn num_hashes(&self) -> usize;

    /// Reports whether no bit is set.
    fn is_empty(&self) -> bool;

    /// Estimates the number of distinct keys inserted so far.
    ///
    /// The estimate is most reliable when the filter is filled to roughly
    /// its capacity and gets worse as it fills up. Once any block is
    /// entirely set the estimate is `+inf`. It is meaningless after
    /// [`Filter::intersect`](crate::Filter::intersect).
    fn cardinality(&self) -> f64;

    /// Estimates the false positive rate after `nkeys` distinct keys.
    fn fp_rate(&self, nkeys: u64) -> f64 {
        fp_rate(nkeys, self.num_bits(), self.num_hashes())
    }
}
