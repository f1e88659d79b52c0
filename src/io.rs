//! Binary dump and load.
//!
//! Layout, all offsets in bytes:
//!
//! | offset | size | field                                      |
//! |--------|------|--------------------------------------------|
//! | 0      | 8    | magic, [`MAGIC`]                           |
//! | 8      | 8    | block count, big-endian                    |
//! | 16     | 8    | hash count, big-endian                     |
//! | 24     | 40   | comment, UTF-8, zero-padded                |
//! | 64     | 64·n | blocks, each 16 little-endian `u32` words  |
//!
//! Little-endian words put bit `i` of a block in byte `i / 8` at bit
//! `i % 8`, whatever the word width used to read them back.

use crate::block::{BLOCK_BITS, BLOCK_BYTES, Block};
use crate::error::{BloomError, Result};
use crate::filter::{Filter, MAX_BLOCKS};
use crate::traits::BloomFilterStats;
use std::io::{Read, Write};
use tracing::debug;

/// Format tag; the last byte is the format version.
pub const MAGIC: [u8; 8] = *b"BBLOOM\x00\x01";

/// Maximum length of a comment in bytes.
pub const COMMENT_LEN: usize = 40;

/// Length of the header preceding the blocks.
pub const HEADER_LEN: usize = MAGIC.len() + 8 + 8 + COMMENT_LEN;

// Blocks are read this many at a time so a lying header cannot force a
// large allocation up front.
const READ_CHUNK_BLOCKS: usize = 1024;

impl Filter {
    /// Writes the filter in binary form with an optional comment and
    /// returns the number of bytes written.
    ///
    /// The comment must be at most [`COMMENT_LEN`] bytes and must not
    /// contain NUL.
    pub fn dump<W: Write>(&self, mut w: W, comment: &str) -> Result<u64> {
        if comment.len() > COMMENT_LEN {
            return Err(BloomError::InvalidComment(format!(
                "comment of {} bytes exceeds {COMMENT_LEN}",
                comment.len()
            )));
        }
        if comment.contains('\0') {
            return Err(BloomError::InvalidComment(
                "comment contains NUL".to_string(),
            ));
        }

        let mut header = [0u8; HEADER_LEN];
        header[..8].copy_from_slice(&MAGIC);
        header[8..16].copy_from_slice(&(self.num_blocks() as u64).to_be_bytes());
        header[16..24].copy_from_slice(&(self.num_hashes() as u64).to_be_bytes());
        header[24..24 + comment.len()].copy_from_slice(comment.as_bytes());
        w.write_all(&header)?;

        for block in self.blocks() {
            w.write_all(&block.to_le_bytes())?;
        }
        Ok((HEADER_LEN + BLOCK_BYTES * self.num_blocks()) as u64)
    }
}

/// Reads a filter written by [`Filter::dump`].
///
/// [`Loader::new`] parses only the header, so callers can inspect the
/// declared size and comment before any block is read:
///
/// ```
/// use blocked_bloom::{Filter, Loader, MAX_BITS};
///
/// let mut f = Filter::new(4096, 4);
/// f.insert(42);
/// let mut buf = Vec::new();
/// f.dump(&mut buf, "answers").unwrap();
///
/// let mut loader = Loader::new(buf.as_slice()).unwrap();
/// assert_eq!(loader.comment(), "answers");
/// assert!(loader.num_bits() <= MAX_BITS);
/// let g = loader.load(None).unwrap();
/// assert_eq!(f, g);
/// ```
#[derive(Debug)]
pub struct Loader<R> {
    reader: R,
    comment: String,
    num_blocks: usize,
    num_hashes: usize,
}

impl<R: Read> Loader<R> {
    /// Reads and validates the header.
    ///
    /// A short header gives [`BloomError::UnexpectedEof`]. A wrong magic, a
    /// block count of zero or above [`MAX_BLOCKS`], fewer than two hashes,
    /// or a comment that is not NUL-free UTF-8 give
    /// [`BloomError::InvalidFormat`].
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header)?;

        if header[..8] != MAGIC {
            return Err(BloomError::InvalidFormat(
                "not a blocked Bloom filter dump".to_string(),
            ));
        }

        let num_blocks = be_u64(&header[8..16]);
        if num_blocks == 0 || num_blocks > MAX_BLOCKS {
            return Err(BloomError::InvalidFormat(format!(
                "block count {num_blocks} out of range"
            )));
        }
        let num_blocks = usize::try_from(num_blocks).map_err(|_| {
            BloomError::InvalidFormat(format!(
                "block count {num_blocks} too large for this platform"
            ))
        })?;

        let num_hashes = be_u64(&header[16..24]);
        if num_hashes < 2 {
            return Err(BloomError::InvalidFormat(format!(
                "hash count {num_hashes} out of range"
            )));
        }
        let num_hashes = usize::try_from(num_hashes).map_err(|_| {
            BloomError::InvalidFormat(format!(
                "hash count {num_hashes} too large for this platform"
            ))
        })?;

        let comment = parse_comment(&header[24..])?;

        debug!(
            num_blocks,
            num_hashes,
            comment_len = comment.len(),
            "read filter header"
        );
        Ok(Self {
            reader,
            comment,
            num_blocks,
            num_hashes,
        })
    }

    /// The comment stored with the filter.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Size in bits of the filter [`load`](Loader::load) will return.
    pub fn num_bits(&self) -> u64 {
        BLOCK_BITS * self.num_blocks as u64
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Reads the blocks.
    ///
    /// When `reuse` has the declared shape its storage is overwritten and
    /// returned; otherwise a new filter is allocated and `reuse` dropped.
    /// Input ending before the last block gives
    /// [`BloomError::UnexpectedEof`], also when `load` is called again on
    /// an exhausted reader.
    ///
    /// `reuse` is consumed even when the load fails, possibly after some of
    /// its blocks were already overwritten.
    pub fn load(&mut self, reuse: Option<Filter>) -> Result<Filter> {
        match reuse {
            Some(mut f)
                if f.num_blocks() == self.num_blocks
                    && f.num_hashes() == self.num_hashes =>
            {
                let mut buf = [0u8; BLOCK_BYTES];
                for block in f.blocks_mut() {
                    self.reader.read_exact(&mut buf)?;
                    *block = Block::from_le_bytes(&buf);
                }
                Ok(f)
            }
            _ => {
                let blocks = self.read_blocks()?;
                Ok(Filter::from_blocks(blocks, self.num_hashes))
            }
        }
    }

    fn read_blocks(&mut self) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut buf = vec![0u8; BLOCK_BYTES * READ_CHUNK_BLOCKS.min(self.num_blocks)];

        while blocks.len() < self.num_blocks {
            let n = READ_CHUNK_BLOCKS.min(self.num_blocks - blocks.len());
            let chunk = &mut buf[..n * BLOCK_BYTES];
            self.reader.read_exact(chunk)?;

            blocks.reserve(n);
            for bytes in chunk.chunks_exact(BLOCK_BYTES) {
                let mut word = [0u8; BLOCK_BYTES];
                word.copy_from_slice(bytes);
                blocks.push(Block::from_le_bytes(&word));
            }
        }
        Ok(blocks)
    }
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(bytes);
    u64::from_be_bytes(b)
}

fn parse_comment(field: &[u8]) -> Result<String> {
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let text = &field[..end];
    if text.contains(&0) {
        return Err(BloomError::InvalidFormat(
            "NUL inside comment".to_string(),
        ));
    }
    String::from_utf8(text.to_vec())
        .map_err(|e| BloomError::InvalidFormat(format!("comment is not UTF-8: {e}")))
}
