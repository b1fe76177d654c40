//! Message framing
//!
//! Builds the single 64-byte input block hashed for one trial counter. The
//! block carries a fixed 48-byte payload followed by standard Merkle-Damgard
//! padding, so hashing it is one compression of the reference hash.
//!
//! ```text
//! [0..4)    counter, big-endian
//! [4..48)   base string bytes 4..48, zero padded
//! [48]      0x80 padding marker
//! [49..56)  zero
//! [56..64)  payload length in bits, big-endian (0x180)
//! ```

use byteorder::{BigEndian, ByteOrder};

/// Size of a hash input block
pub const BLOCK_SIZE: usize = 64;

/// Size of the framed message payload
pub const PAYLOAD_LEN: usize = 48;

/// Bytes at the start of the payload reserved for the counter
pub const COUNTER_LEN: usize = 4;

/// Base string bytes that survive framing
pub const BASE_CAPACITY: usize = PAYLOAD_LEN - COUNTER_LEN;

/// Padding marker appended right after the payload
pub const PADDING_MARKER: u8 = 0x80;

/// Offset of the 64-bit big-endian length field
pub const LENGTH_OFFSET: usize = BLOCK_SIZE - 8;

/// Payload length in bits as written into the length field
pub const PAYLOAD_BITS: u64 = (PAYLOAD_LEN as u64) * 8;

/// One padded hash input block
pub type MessageBlock = [u8; BLOCK_SIZE];

/// Build the block for `counter` over `base`
///
/// Base strings longer than the payload are silently truncated and shorter
/// ones are zero padded. The first [`COUNTER_LEN`] bytes of `base` are
/// replaced by the counter whatever they contain.
pub fn build_block(base: &[u8], counter: u32) -> MessageBlock {
    let mut block = template(base);
    write_counter(&mut block, counter);
    block
}

/// Read the counter back out of a framed block
pub fn counter_of(block: &MessageBlock) -> u32 {
    BigEndian::read_u32(&block[..COUNTER_LEN])
}

fn template(base: &[u8]) -> MessageBlock {
    let mut block = [0u8; BLOCK_SIZE];
    let len = base.len().min(PAYLOAD_LEN);
    block[..len].copy_from_slice(&base[..len]);
    block[PAYLOAD_LEN] = PADDING_MARKER;
    BigEndian::write_u64(&mut block[LENGTH_OFFSET..], PAYLOAD_BITS);
    block
}

#[inline(always)]
fn write_counter(block: &mut MessageBlock, counter: u32) {
    BigEndian::write_u32(&mut block[..COUNTER_LEN], counter);
}

/// Frames counters over a fixed base string
///
/// The padding and base bytes are computed once; each call only rewrites the
/// counter bytes of a copy of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFramer {
    template: MessageBlock,
}

impl MessageFramer {
    /// Create a framer for `base`
    pub fn new(base: &[u8]) -> Self {
        Self {
            template: template(base),
        }
    }

    /// Block for `counter`
    #[inline]
    pub fn frame(&self, counter: u32) -> MessageBlock {
        let mut block = self.template;
        write_counter(&mut block, counter);
        block
    }

    /// Rewrite the counter of an existing block in place
    #[inline]
    pub fn reframe(&self, block: &mut MessageBlock, counter: u32) {
        write_counter(block, counter);
    }
}
