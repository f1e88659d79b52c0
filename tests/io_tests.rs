mod common;

use blocked_bloom::{
    BLOCK_BITS, BloomError, BloomFilterStats, Filter, Loader,
    io::{COMMENT_LEN, HEADER_LEN, MAGIC},
};
use common::test_utils::{TestFile, random_hashes};
use sha2::{Digest, Sha256};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
};

fn header(nblocks: u64, nhashes: u64, comment: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN);
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&nblocks.to_be_bytes());
    buf.extend_from_slice(&nhashes.to_be_bytes());
    buf.extend_from_slice(comment);
    buf.resize(HEADER_LEN, 0);
    buf
}

fn random_filter() -> Filter {
    let mut f = Filter::new(12345, 6);
    for h in random_hashes(100, 55) {
        f.insert(h);
    }
    f
}

#[cfg(test)]
mod dump_load_tests {
    use super::*;

    #[test]
    fn test_dump_load() {
        let f = random_filter();

        let mut buf = Vec::new();
        let n = f.dump(&mut buf, "random bytes").unwrap();
        assert_eq!(n, 26 * 64);

        let mut reader = buf.as_slice();
        let mut loader = Loader::new(&mut reader).unwrap();
        assert_eq!(loader.comment(), "random bytes");
        assert_eq!(loader.num_blocks(), 25);
        assert_eq!(loader.num_bits(), 25 * BLOCK_BITS);
        assert_eq!(loader.num_hashes(), 6);

        let g = loader.load(Some(Filter::new(12345, 6))).unwrap();
        assert_eq!(f, g);

        // The stream is exhausted now.
        assert!(matches!(loader.load(None), Err(BloomError::UnexpectedEof)));
    }

    #[test]
    fn test_load_with_mismatched_reuse_allocates() {
        let f = random_filter();
        let mut buf = Vec::new();
        f.dump(&mut buf, "").unwrap();

        let mut loader = Loader::new(buf.as_slice()).unwrap();
        assert_eq!(loader.comment(), "");
        let g = loader.load(Some(Filter::new(BLOCK_BITS, 6))).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn test_reused_filter_is_overwritten() {
        let f = random_filter();
        let mut buf = Vec::new();
        f.dump(&mut buf, "").unwrap();

        let mut stale = Filter::new(12345, 6);
        stale.fill();
        let g = Loader::new(buf.as_slice()).unwrap().load(Some(stale)).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn test_file_round_trip() {
        let file = TestFile::new("file_round_trip");
        let mut f = Filter::new(100 * BLOCK_BITS, 9);
        for h in random_hashes(5000, 0xf11e) {
            f.insert(h);
        }

        {
            let mut w = BufWriter::new(File::create(file.path()).unwrap());
            f.dump(&mut w, "on disk").unwrap();
            w.flush().unwrap();
        }

        let r = BufReader::new(File::open(file.path()).unwrap());
        let mut loader = Loader::new(r).unwrap();
        assert_eq!(loader.comment(), "on disk");
        let g = loader.load(None).unwrap();
        assert_eq!(f, g);
        assert_eq!(f.cardinality(), g.cardinality());
    }

    #[test]
    fn test_comment_limits() {
        let f = Filter::new(BLOCK_BITS, 2);
        let mut buf = Vec::new();

        let longest = "c".repeat(COMMENT_LEN);
        f.dump(&mut buf, &longest).unwrap();
        assert_eq!(Loader::new(buf.as_slice()).unwrap().comment(), longest);

        let too_long = "c".repeat(COMMENT_LEN + 1);
        assert!(matches!(
            f.dump(Vec::new(), &too_long),
            Err(BloomError::InvalidComment(_))
        ));
        assert!(matches!(
            f.dump(Vec::new(), "nul\0inside"),
            Err(BloomError::InvalidComment(_))
        ));
    }

    #[test]
    fn test_block_layout_digest() {
        // Bits 0, 1, 111 and 499 of one block, serialized little-endian.
        let mut f = Filter::new(BLOCK_BITS, 2);
        let mut buf = Vec::new();
        f.dump(&mut buf, "").unwrap();
        let zero = Sha256::digest(&buf[HEADER_LEN..]);
        assert_eq!(
            hex::encode(zero),
            hex::encode(Sha256::digest([0u8; 64]))
        );

        // A hash with k = 2 sets exactly the bit h1 mod 512 of block 0.
        for bit in [0u64, 1, 111, 499] {
            f.insert(bit << 32);
        }
        buf.clear();
        f.dump(&mut buf, "").unwrap();
        assert_eq!(
            hex::encode(Sha256::digest(&buf[HEADER_LEN..])),
            "aa7f8c411600fa387f0c10641eab428a7ed2f27a86171ac69f0e2087b2aa9140"
        );
    }
}

#[cfg(test)]
mod malformed_input_tests {
    use super::*;

    #[test]
    fn test_bad_magic() {
        let mut buf = header(1, 2, b"");
        buf[0] = b'b';
        buf.extend_from_slice(&[0; 64]);
        assert!(matches!(
            Loader::new(buf.as_slice()),
            Err(BloomError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_zero_counts() {
        for (nblocks, nhashes) in [(0, 2), (1, 0), (1, 1), (u64::MAX, 3)] {
            let buf = header(nblocks, nhashes, b"");
            let err = Loader::new(buf.as_slice()).unwrap_err();
            assert!(
                matches!(err, BloomError::InvalidFormat(_)),
                "{nblocks} blocks, {nhashes} hashes: {err}"
            );
        }
    }

    #[test]
    fn test_bad_comment() {
        let buf = header(1, 2, b"a\0b");
        assert!(matches!(
            Loader::new(buf.as_slice()),
            Err(BloomError::InvalidFormat(_))
        ));

        let buf = header(1, 2, &[0xc3, 0x28]);
        assert!(matches!(
            Loader::new(buf.as_slice()),
            Err(BloomError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let buf = header(1, 2, b"short");
        for len in [0, 7, 8, 30, HEADER_LEN - 1] {
            assert!(matches!(
                Loader::new(&buf[..len]),
                Err(BloomError::UnexpectedEof)
            ));
        }
    }

    #[test]
    fn test_truncated_payload() {
        let f = random_filter();
        let mut buf = Vec::new();
        f.dump(&mut buf, "").unwrap();
        buf.truncate(buf.len() - 1);

        let mut loader = Loader::new(buf.as_slice()).unwrap();
        assert!(matches!(loader.load(None), Err(BloomError::UnexpectedEof)));
    }

    #[test]
    fn test_truncated_payload_with_reuse() {
        let f = random_filter();
        let mut buf = Vec::new();
        f.dump(&mut buf, "").unwrap();
        // Keep the header and three of the 25 blocks.
        buf.truncate(HEADER_LEN + 3 * 64);

        let mut loader = Loader::new(buf.as_slice()).unwrap();
        let reuse = Filter::new(12345, 6);
        assert_eq!(reuse.num_blocks(), loader.num_blocks());
        assert!(matches!(
            loader.load(Some(reuse)),
            Err(BloomError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_huge_declared_size_is_not_allocated() {
        // Declares u32::MAX blocks but carries only one.
        let mut buf = header(u64::from(u32::MAX), 2, b"liar");
        buf.extend_from_slice(&[0xff; 64]);

        let mut loader = Loader::new(buf.as_slice()).unwrap();
        assert_eq!(loader.comment(), "liar");
        assert!(matches!(loader.load(None), Err(BloomError::UnexpectedEof)));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_loader_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            if let Ok(mut loader) = Loader::new(bytes.as_slice()) {
                prop_assert!(loader.num_blocks() > 0);
                prop_assert!(loader.num_hashes() >= 2);
                prop_assert!(!loader.comment().contains('\0'));
                if let Err(err) = loader.load(None) {
                    prop_assert!(matches!(err, BloomError::UnexpectedEof));
                }
            }
        }

        #[test]
        fn prop_loader_accepts_valid_header(
            tail in prop::collection::vec(any::<u8>(), 64..200),
            nhashes in 2u64..64,
        ) {
            let mut bytes = header(1, nhashes, b"this is a valid zero-padded comment");
            bytes.extend_from_slice(&tail);

            let mut loader = Loader::new(bytes.as_slice()).unwrap();
            let f = loader.load(None).unwrap();
            prop_assert_eq!(f.num_bits(), BLOCK_BITS);
            prop_assert_eq!(f.num_hashes(), nhashes as usize);
        }

        #[test]
        fn prop_dump_load_round_trip(
            nbits in 1u64..50_000,
            nhashes in 2usize..20,
            hashes in prop::collection::vec(any::<u64>(), 0..500),
        ) {
            let mut f = Filter::new(nbits, nhashes);
            hashes.iter().for_each(|&h| f.insert(h));

            let mut buf = Vec::new();
            f.dump(&mut buf, "prop").unwrap();
            let g = Loader::new(buf.as_slice()).unwrap().load(None).unwrap();
            prop_assert_eq!(f, g);
        }
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let f = random_filter();
        let json = serde_json::to_string(&f).unwrap();
        let g: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(f, g);
    }
}
