use crate::config::FilterConfig;
use crate::error::Result;
use crate::filter::Filter;
use crate::traits::BloomFilterStats;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A [`Filter`] behind a mutex, for callers that need every operation,
/// including set algebra and `clear`, to be callable from many threads.
///
/// For insert-heavy workloads prefer [`Filter::as_atomic`], which needs no
/// lock at all.
#[derive(Debug)]
pub struct SyncFilter {
    inner: Mutex<Filter>,
}

impl SyncFilter {
    pub fn new(nbits: u64, nhashes: usize) -> Self {
        Filter::new(nbits, nhashes).into()
    }

    pub fn optimized(config: &FilterConfig) -> Self {
        Filter::optimized(config).into()
    }

    // A panic while holding the lock cannot leave a filter half-updated in
    // a way that breaks membership, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Filter> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, hash: u64) {
        self.lock().insert(hash);
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.lock().contains(hash)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn fill(&self) {
        self.lock().fill();
    }

    pub fn is_compatible(&self, other: &Filter) -> bool {
        self.lock().is_compatible(other)
    }

    /// See [`Filter::union`].
    pub fn union(&self, other: &Filter) {
        self.lock().union(other);
    }

    /// See [`Filter::intersect`].
    pub fn intersect(&self, other: &Filter) {
        self.lock().intersect(other);
    }

    /// Returns a copy of the filter as it is right now.
    pub fn snapshot(&self) -> Filter {
        self.lock().clone()
    }

    pub fn into_inner(self) -> Filter {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the filter in binary form while holding the lock. See
    /// [`Filter::dump`].
    pub fn dump<W: Write>(&self, w: W, comment: &str) -> Result<u64> {
        self.lock().dump(w, comment)
    }
}

impl From<Filter> for SyncFilter {
    fn from(filter: Filter) -> Self {
        Self {
            inner: Mutex::new(filter),
        }
    }
}

impl BloomFilterStats for SyncFilter {
    fn num_bits(&self) -> u64 {
        self.lock().num_bits()
    }

    fn num_hashes(&self) -> usize {
        self.lock().num_hashes()
    }

    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn cardinality(&self) -> f64 {
        self.lock().cardinality()
    }
}
