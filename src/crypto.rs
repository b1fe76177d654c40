//! Hashing for the collision search
//!
//! The engine only ever sees the [`BlockHasher`] seam; [`Sha1BlockHasher`]
//! is the reference implementation backed by the RustCrypto `sha1` crate.

use crate::framer::{MessageBlock, BLOCK_SIZE, LENGTH_OFFSET};
use crate::Target;
use byteorder::{BigEndian, ByteOrder};
use sha1::{Digest, Sha1};

/// SHA-1 digest length in bytes
pub const SHA1_DIGEST_LEN: usize = 20;

/// SHA-1 digest
pub type Sha1Digest = [u8; SHA1_DIGEST_LEN];

/// Largest message that still fits one padded block
const MAX_SINGLE_BLOCK_MESSAGE: usize = LENGTH_OFFSET - 1;

/// Hash function over one padded message block
///
/// Implementations are trusted to always return a digest of the same length.
pub trait BlockHasher: Send + Sync {
    /// Digest produced for a block
    type Output: AsRef<[u8]> + Copy + Send + Sync + 'static;

    /// Hash a single block
    fn hash_block(&self, block: &MessageBlock) -> Self::Output;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// SHA-1 over a single padded block
///
/// The block's length field determines how many leading bytes form the
/// message; hashing that message with standard SHA-1 padding reproduces the
/// block exactly, so the result equals a single compression of the block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1BlockHasher;

impl Sha1BlockHasher {
    /// Create a new SHA-1 block hasher
    pub fn new() -> Self {
        Self
    }

    /// Hash arbitrary data
    pub fn hash(data: &[u8]) -> Sha1Digest {
        Sha1::digest(data).into()
    }
}

impl BlockHasher for Sha1BlockHasher {
    type Output = Sha1Digest;

    #[inline]
    fn hash_block(&self, block: &MessageBlock) -> Sha1Digest {
        let bits = BigEndian::read_u64(&block[LENGTH_OFFSET..BLOCK_SIZE]);
        let len = usize::try_from(bits / 8)
            .unwrap_or(MAX_SINGLE_BLOCK_MESSAGE)
            .min(MAX_SINGLE_BLOCK_MESSAGE);
        Self::hash(&block[..len])
    }

    fn name(&self) -> &'static str {
        "sha1"
    }
}

/// Check whether `digest` starts with at least `target` zero bits
///
/// Whole zero bytes are consumed eight bits at a time, then the top
/// remaining bits of the next byte are masked. A digest shorter than the
/// target never matches.
#[inline]
pub fn meets_target(digest: &[u8], target: Target) -> bool {
    meets_zero_bits(digest, target.bits())
}

/// [`meets_target`] on a raw bit count, where zero always matches
#[inline]
pub fn meets_zero_bits(digest: &[u8], bits: u32) -> bool {
    let mut remaining = bits;
    let mut bytes = digest.iter();

    while remaining >= 8 {
        match bytes.next() {
            Some(0) => remaining -= 8,
            _ => return false,
        }
    }

    if remaining == 0 {
        return true;
    }

    let mask = 0xFFu8 << (8 - remaining);
    matches!(bytes.next(), Some(&byte) if byte & mask == 0)
}

/// Count the leading zero bits of a digest
pub fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut count = 0;
    for &byte in digest {
        let lz = byte.leading_zeros();
        count += lz;
        if lz < 8 {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framer::build_block;

    #[test]
    fn test_sha1_known_vector() {
        // FIPS 180 "abc": 3-byte message, 24-bit length
        let mut block = [0u8; BLOCK_SIZE];
        block[..3].copy_from_slice(b"abc");
        block[3] = 0x80;
        block[63] = 0x18;

        let digest = Sha1BlockHasher.hash_block(&block);
        assert_eq!(
            hex::encode(digest),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_framed_block_hashes_payload() {
        let block = build_block(b"XXXX test", 42);
        let digest = Sha1BlockHasher.hash_block(&block);
        assert_eq!(digest, Sha1BlockHasher::hash(&block[..48]));
        assert_eq!(Sha1BlockHasher.name(), "sha1");
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = build_block(b"XXXX Keep your FPGA spinning!", 7);
        assert_eq!(
            Sha1BlockHasher.hash_block(&block),
            Sha1BlockHasher.hash_block(&block)
        );
        assert_ne!(
            Sha1BlockHasher.hash_block(&block),
            Sha1BlockHasher.hash_block(&build_block(b"XXXX Keep your FPGA spinning!", 8))
        );
    }

    #[test]
    fn test_zero_digest_meets_any_target_up_to_length() {
        let digest = [0u8; SHA1_DIGEST_LEN];
        for bits in 1..=160 {
            assert!(meets_target(&digest, Target::new(bits)), "target {}", bits);
        }
        assert!(!meets_target(&digest, Target::new(161)));
        assert!(!meets_target(&digest, Target::new(u32::MAX)));
    }

    #[test]
    fn test_top_bit_set() {
        let mut digest = [0u8; SHA1_DIGEST_LEN];
        digest[0] = 0x80;
        assert!(meets_zero_bits(&digest, 0));
        assert!(!meets_zero_bits(&digest, 1));
        assert!(!meets_target(&digest, Target::new(1)));
        assert!(!meets_target(&digest, Target::new(20)));
    }

    #[test]
    fn test_bit_granularity() {
        // 0x00 0x1F: eleven leading zero bits
        let digest = [0x00, 0x1F, 0xFF];
        assert!(meets_zero_bits(&digest, 8));
        assert!(meets_zero_bits(&digest, 11));
        assert!(!meets_zero_bits(&digest, 12));
        assert!(!meets_zero_bits(&digest, 16));
        assert_eq!(leading_zero_bits(&digest), 11);
    }

    #[test]
    fn test_nonzero_byte_before_target() {
        let digest = [0x00, 0x00, 0x01, 0x00];
        assert!(meets_zero_bits(&digest, 23));
        assert!(!meets_zero_bits(&digest, 24));
        assert!(!meets_zero_bits(&digest, 32));
    }

    #[test]
    fn test_leading_zero_bits() {
        assert_eq!(leading_zero_bits(&[0xFF]), 0);
        assert_eq!(leading_zero_bits(&[0x01]), 7);
        assert_eq!(leading_zero_bits(&[0x00, 0x40]), 9);
        assert_eq!(leading_zero_bits(&[0u8; SHA1_DIGEST_LEN]), 160);
        assert_eq!(leading_zero_bits(&[]), 0);
    }

    #[test]
    fn test_leading_zero_bits_agrees_with_target_check() {
        for counter in 0..256u32 {
            let digest = Sha1BlockHasher.hash_block(&build_block(b"XXXX test", counter));
            let lz = leading_zero_bits(&digest);
            assert!(meets_zero_bits(&digest, lz));
            assert!(!meets_zero_bits(&digest, lz + 1));
        }
    }
}
