//! Fixed-layout interpretation of a single index node.
//!
//! A node of arity `A` occupies `16*A + 16` bytes:
//!
//! ```text
//! offset     field
//!   0..3     magic 0x72 0xC3 0x63
//!   3        arity A (1..=255)
//!   4..6     16-bit folded CRC-32/IEEE of bytes [6, 16A+16)
//!   8i+6     reserved, must be zero              (i in 0..=A)
//!   8i+7     tertiary tag for slot i             (0xFE marks a branch)
//!   8i..+5   48-bit LE DPtr_i                    (i in 1..=A; DPtr_0 is
//!                                                 implicitly zero)
//!   8A+7     codec, non-zero
//!   8A+8i+8  48-bit LE CPtr_i, then cLen_i and sTag_i   (i in 0..A)
//!   16A+8    48-bit LE CPtrMax
//!   16A+14   version, non-zero
//!   16A+15   arity A again
//! ```
//!
//! DPtr_A doubles as DPtrMax and CPtr_A as CPtrMax. The buffer is sized for
//! the largest possible node, so no accessor can read out of bounds for any
//! arity; none of them should be called unless [`Node::validate`] returned
//! true.

use byteorder::{ByteOrder, LittleEndian};

use super::models::{Chunk, Codec, Range};

/// Magic bytes at the start of every index node.
pub(crate) const MAGIC: [u8; 3] = [0x72, 0xC3, 0x63];

/// Size of the largest possible node (arity 255).
pub(crate) const MAX_NODE_SIZE: usize = 4096;

/// Tertiary tag value marking a slot as a branch to a subordinate node.
const TTAG_BRANCH: u8 = 0xFE;

/// Size in bytes that a node with the given arity occupies.
pub(crate) fn node_size(arity: u8) -> usize {
    16 * usize::from(arity) + 16
}

fn u48_le(buf: &[u8], offset: usize) -> u64 {
    LittleEndian::read_u48(&buf[offset..offset + 6])
}

/// Scratch buffer holding the most recently loaded index node.
///
/// The reader owns exactly one of these and overwrites it on every load.
/// Chunks handed to callers are value copies detached from it.
pub(crate) struct Node {
    buf: [u8; MAX_NODE_SIZE],
}

impl Node {
    pub(crate) fn new() -> Self {
        Node {
            buf: [0; MAX_NODE_SIZE],
        }
    }

    /// The first `len` bytes of the buffer, for the reader to load into.
    pub(crate) fn prefix_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.buf[..len]
    }

    pub(crate) fn byte(&self, i: usize) -> u8 {
        self.buf[i]
    }

    pub(crate) fn starts_with_magic(&self) -> bool {
        self.buf[..3] == MAGIC
    }

    pub(crate) fn arity(&self) -> usize {
        usize::from(self.buf[3])
    }

    pub(crate) fn codec(&self) -> Codec {
        Codec(self.buf[8 * self.arity() + 7])
    }

    pub(crate) fn version(&self) -> u8 {
        self.buf[16 * self.arity() + 14]
    }

    pub(crate) fn c_ptr_max(&self) -> u64 {
        u48_le(&self.buf, 16 * self.arity() + 8)
    }

    pub(crate) fn d_ptr_max(&self) -> u64 {
        u48_le(&self.buf, 8 * self.arity())
    }

    fn c_len(&self, i: usize) -> u8 {
        self.buf[8 * i + 8 * self.arity() + 14]
    }

    /// Absolute CSpace offset of slot `i`'s compressed bytes.
    pub(crate) fn c_off(&self, i: usize, c_bias: u64) -> u64 {
        c_bias + u48_le(&self.buf, 8 * i + 8 * self.arity() + 8)
    }

    /// The CSpace span covering slot `i`'s primary bytes.
    ///
    /// The span ends at the node's CSpace ceiling, tightened by the slot's
    /// compressed-length hint when one is present. Indexes at or past the
    /// arity yield a zero-size range anchored at the ceiling, which is how
    /// an out-of-table secondary or tertiary tag expresses "absent".
    fn c_off_range(&self, i: usize, c_bias: u64) -> Range {
        let mut high = c_bias + self.c_ptr_max();
        if i >= self.arity() {
            return Range { low: high, high };
        }
        let low = self.c_off(i, c_bias);
        let c_len = self.c_len(i);
        if c_len != 0 {
            high = high.min(low + u64::from(c_len) * 1024);
        }
        Range { low, high }
    }

    /// Absolute DSpace offset where slot `i` begins.
    pub(crate) fn d_off(&self, i: usize, d_bias: u64) -> u64 {
        if i == 0 {
            return d_bias;
        }
        d_bias + u48_le(&self.buf, 8 * i)
    }

    fn d_off_range(&self, i: usize, d_bias: u64) -> Range {
        Range {
            low: self.d_off(i, d_bias),
            high: self.d_off(i + 1, d_bias),
        }
    }

    /// DSpace size of slot `i`, independent of any bias.
    pub(crate) fn d_size(&self, i: usize) -> u64 {
        let low = if i == 0 { 0 } else { u48_le(&self.buf, 8 * i) };
        u48_le(&self.buf, 8 * (i + 1)) - low
    }

    pub(crate) fn s_tag(&self, i: usize) -> u8 {
        self.buf[8 * i + 8 * self.arity() + 15]
    }

    fn t_tag(&self, i: usize) -> u8 {
        self.buf[8 * i + 7]
    }

    pub(crate) fn is_leaf(&self, i: usize) -> bool {
        self.t_tag(i) != TTAG_BRANCH
    }

    /// The smallest slot index whose DSpace range ends beyond `d`.
    ///
    /// Binary search over the DPtr table, which [`Node::validate`] has
    /// already checked to be non-decreasing. The caller guarantees
    /// `d_bias <= d < d_off(arity, d_bias)`.
    pub(crate) fn find_chunk_containing(&self, d: u64, d_bias: u64) -> usize {
        let mut lo = 0;
        let mut hi = self.arity();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.d_off(mid + 1, d_bias) <= d {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        debug_assert!(lo < self.arity());
        lo
    }

    /// Materializes slot `i` as a caller-facing chunk value.
    pub(crate) fn chunk(&self, i: usize, c_bias: u64, d_bias: u64) -> Chunk {
        let s_tag = self.s_tag(i);
        let t_tag = self.t_tag(i);
        Chunk {
            d_range: self.d_off_range(i, d_bias),
            c_primary: self.c_off_range(i, c_bias),
            c_secondary: self.c_off_range(usize::from(s_tag), c_bias),
            c_tertiary: self.c_off_range(usize::from(t_tag), c_bias),
            s_tag,
            t_tag,
            codec: self.codec(),
        }
    }

    /// Checks every structural invariant that can be decided from the node
    /// bytes alone.
    ///
    /// Parent/child consistency (codec subset, version monotonicity, CSpace
    /// ceiling, DSpace size) needs more context and is enforced during
    /// descent; the root's ceiling-equals-container-length requirement is
    /// enforced by root location.
    pub(crate) fn validate(&self) -> bool {
        // Magic and arity, including the duplicate arity footer byte.
        if self.buf[..3] != MAGIC || self.buf[3] == 0 {
            return false;
        }
        let arity = self.arity();
        let size = node_size(self.buf[3]);
        if self.buf[3] != self.buf[size - 1] {
            return false;
        }

        // Reserved bytes are zero and tertiary tags avoid the reserved
        // range [0xC0, 0xFE).
        for i in 0..arity {
            if self.buf[8 * i + 6] != 0 {
                return false;
            }
            let t_tag = self.buf[8 * i + 7];
            if (0xC0..TTAG_BRANCH).contains(&t_tag) {
                return false;
            }
        }
        if self.buf[8 * arity + 6] != 0 {
            return false;
        }

        // Codec and version bytes are non-zero.
        if self.buf[8 * arity + 7] == 0 {
            return false;
        }
        if self.buf[16 * arity + 14] == 0 {
            return false;
        }

        // The DPtr table is non-decreasing. DPtr_0 is implicitly zero, so
        // the first stored entry needs no check of its own.
        let mut prev = u48_le(&self.buf, 8);
        for i in 2..=arity {
            let curr = u48_le(&self.buf, 8 * i);
            if curr < prev {
                return false;
            }
            prev = curr;
        }

        // No CPtr value exceeds CPtrMax, the final CPtr entry.
        let c_ptr_max = u48_le(&self.buf, size - 8);
        for i in 0..arity {
            if u48_le(&self.buf, 8 * i + 8 * arity + 8) > c_ptr_max {
                return false;
            }
        }

        // 16-bit folded CRC-32/IEEE over everything after the checksum
        // field itself.
        let mut checksum = crc32fast::hash(&self.buf[6..size]);
        checksum ^= checksum >> 16;
        LittleEndian::read_u16(&self.buf[4..6]) == checksum as u16
    }
}
