//! Blocked Bloom filters.
//!
//! A blocked Bloom filter splits its bit array into 512-bit blocks, one CPU
//! cache line each. Every key is routed to a single block and all of its
//! bits are set inside that block, so an insert or a lookup touches one
//! cache line no matter how many hash functions are used. The price is a
//! few more bits per key for the same false positive rate, which
//! [`optimize`] accounts for.
//!
//! The filter never hashes keys itself. Callers pass one 64-bit hash per
//! key, from any decent hash function; both halves of it are used.
//!
//! ```
//! use blocked_bloom::{BloomFilterStats, Filter, FilterConfigBuilder};
//! use std::hash::Hasher;
//!
//! fn hash(key: &str) -> u64 {
//!     let mut h = fnv::FnvHasher::default();
//!     h.write(key.as_bytes());
//!     h.finish()
//! }
//!
//! let config = FilterConfigBuilder::default()
//!     .capacity(10_000)
//!     .false_positive_rate(0.001)
//!     .build()
//!     .unwrap();
//! let mut filter = Filter::optimized(&config);
//!
//! filter.insert(hash("alpha"));
//! filter.insert(hash("beta"));
//!
//! assert!(filter.contains(hash("alpha")));
//! assert!(filter.fp_rate(10_000) < 0.002);
//! ```
//!
//! Concurrency comes in two flavours: [`Filter::as_atomic`] for lock-free
//! inserts from many threads, and [`SyncFilter`] for a mutex around every
//! operation. Filters can be merged with [`Filter::union`] and
//! [`Filter::intersect`] and stored with [`Filter::dump`] and [`Loader`].

mod atomic;
mod block;
mod cardinality;
pub mod common;
mod config;
mod error;
mod filter;
mod hash;
pub mod io;
mod optimize;
mod setop;
mod sync;
mod traits;

pub use atomic::AtomicFilter;
pub use block::BLOCK_BITS;
pub use config::{FilterConfig, FilterConfigBuilder, FilterConfigBuilderError};
pub use error::{BloomError, Result};
pub use filter::{Filter, MAX_BITS, MAX_BLOCKS};
pub use io::Loader;
pub use optimize::{fp_rate, optimize};
pub use setop::simd_enabled;
pub use sync::SyncFilter;
pub use traits::BloomFilterStats;
