//! In-place union and intersection of equally shaped filters.
//!
//! The portable path works word by word and defines the result. On
//! `x86_64` with AVX2 available at runtime, and unless the `portable`
//! feature is on, the same operation runs on 256-bit registers, two per
//! block. Both paths produce identical bits.

use crate::block::Block;
use crate::filter::Filter;
use crate::traits::BloomFilterStats;

impl Filter {
    /// Reports whether `self` and `other` have the same number of blocks
    /// and hashes, so that [`union`](Filter::union) and
    /// [`intersect`](Filter::intersect) accept them.
    ///
    /// Both filters must also be fed by the same hash function; that cannot
    /// be checked.
    pub fn is_compatible(&self, other: &Filter) -> bool {
        self.num_blocks() == other.num_blocks()
            && self.num_hashes() == other.num_hashes()
    }

    fn check_binop(&self, other: &Filter) {
        assert_eq!(
            self.num_blocks(),
            other.num_blocks(),
            "Bloom filters do not have the same number of bits"
        );
        assert_eq!(
            self.num_hashes(),
            other.num_hashes(),
            "Bloom filters do not have the same number of hash functions"
        );
    }

    /// Sets `self` to the union of `self` and `other`.
    ///
    /// Afterwards `contains` answers `true` for every key either filter
    /// answered `true` for.
    ///
    /// # Panics
    ///
    /// When the filters are not [compatible](Filter::is_compatible).
    pub fn union(&mut self, other: &Filter) {
        self.check_binop(other);
        union(self.blocks_mut(), other.blocks());
    }

    /// Sets `self` to the intersection of `self` and `other`.
    ///
    /// Because of false positives `contains` may still answer `true` for a
    /// key that was not in both filters. Cardinality and false positive
    /// rate estimates are unreliable afterwards.
    ///
    /// # Panics
    ///
    /// When the filters are not [compatible](Filter::is_compatible).
    pub fn intersect(&mut self, other: &Filter) {
        self.check_binop(other);
        intersect(self.blocks_mut(), other.blocks());
    }
}

/// Reports whether set algebra runs on the vectorized path on this machine.
#[cfg(all(target_arch = "x86_64", not(feature = "portable")))]
pub fn simd_enabled() -> bool {
    std::arch::is_x86_feature_detected!("avx2")
}

/// Reports whether set algebra runs on the vectorized path on this machine.
#[cfg(not(all(target_arch = "x86_64", not(feature = "portable"))))]
pub fn simd_enabled() -> bool {
    false
}

fn union(dst: &mut [Block], src: &[Block]) {
    #[cfg(all(target_arch = "x86_64", not(feature = "portable")))]
    if std::arch::is_x86_feature_detected!("avx2") {
        tracing::trace!(blocks = dst.len(), "union on avx2 path");
        // SAFETY: AVX2 availability checked just above.
        unsafe { avx2::union(dst, src) };
        return;
    }
    portable::union(dst, src);
}

fn intersect(dst: &mut [Block], src: &[Block]) {
    #[cfg(all(target_arch = "x86_64", not(feature = "portable")))]
    if std::arch::is_x86_feature_detected!("avx2") {
        tracing::trace!(blocks = dst.len(), "intersect on avx2 path");
        // SAFETY: AVX2 availability checked just above.
        unsafe { avx2::intersect(dst, src) };
        return;
    }
    portable::intersect(dst, src);
}

mod portable {
    use crate::block::Block;

    pub(super) fn union(dst: &mut [Block], src: &[Block]) {
        for (a, b) in dst.iter_mut().zip(src) {
            a.union(b);
        }
    }

    pub(super) fn intersect(dst: &mut [Block], src: &[Block]) {
        for (a, b) in dst.iter_mut().zip(src) {
            a.intersect(b);
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use crate::block::Block;
    use std::arch::x86_64::{
        __m256i, _mm256_and_si256, _mm256_load_si256, _mm256_or_si256,
        _mm256_store_si256,
    };

    /// Applies `op` to both 256-bit halves of every block pair, two block
    /// pairs per iteration.
    ///
    /// # Safety
    ///
    /// The CPU must support AVX2.
    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn apply<F>(dst: &mut [Block], src: &[Block], op: F)
    where
        F: Fn(__m256i, __m256i) -> __m256i,
    {
        debug_assert_eq!(dst.len(), src.len());

        #[inline(always)]
        unsafe fn block<F>(a: &mut Block, b: &Block, op: &F)
        where
            F: Fn(__m256i, __m256i) -> __m256i,
        {
            // Blocks are 64-byte aligned, so both halves are 32-byte aligned.
            let p = a.0.as_mut_ptr().cast::<__m256i>();
            let q = b.0.as_ptr().cast::<__m256i>();
            // SAFETY: p and q point into live, aligned 64-byte blocks and
            // the caller guarantees AVX2.
            unsafe {
                _mm256_store_si256(p, op(_mm256_load_si256(p), _mm256_load_si256(q)));
                let (p, q) = (p.add(1), q.add(1));
                _mm256_store_si256(p, op(_mm256_load_si256(p), _mm256_load_si256(q)));
            }
        }

        let mut a = dst.chunks_exact_mut(2);
        let mut b = src.chunks_exact(2);
        for (x, y) in (&mut a).zip(&mut b) {
            // SAFETY: forwarded from the caller.
            unsafe {
                block(&mut x[0], &y[0], &op);
                block(&mut x[1], &y[1], &op);
            }
        }
        for (x, y) in a.into_remainder().iter_mut().zip(b.remainder()) {
            // SAFETY: forwarded from the caller.
            unsafe { block(x, y, &op) };
        }
    }

    /// # Safety
    ///
    /// The CPU must support AVX2.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn union(dst: &mut [Block], src: &[Block]) {
        // SAFETY: forwarded from the caller.
        unsafe { apply(dst, src, |x, y| _mm256_or_si256(x, y)) }
    }

    /// # Safety
    ///
    /// The CPU must support AVX2.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn intersect(dst: &mut [Block], src: &[Block]) {
        // SAFETY: forwarded from the caller.
        unsafe { apply(dst, src, |x, y| _mm256_and_si256(x, y)) }
    }
}
