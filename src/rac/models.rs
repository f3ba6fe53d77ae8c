//! Value types surfaced by the RAC reader.

use std::fmt;

/// Identifier of the compression codec applied to a chunk's payload.
///
/// The reader never decompresses anything itself; it carries the codec byte
/// through so callers can hand each chunk to the right decompressor. Values
/// other than the named constants pass through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codec(pub u8);

impl Codec {
    pub const ZLIB: Codec = Codec(0x01);
    pub const BROTLI: Codec = Codec(0x02);
    pub const ZSTANDARD: Codec = Codec(0x04);

    /// Whether every capability bit required by `inner` is also declared by
    /// `self`.
    ///
    /// Index nodes declare the union of the codecs used beneath them, so a
    /// decoder configured for a node can handle every descendant chunk.
    pub fn is_superset_of(self, inner: Codec) -> bool {
        self.0 == self.0 | inner.0
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Codec::ZLIB => write!(f, "zlib"),
            Codec::BROTLI => write!(f, "brotli"),
            Codec::ZSTANDARD => write!(f, "zstandard"),
            Codec(raw) => write!(f, "{:#04x}", raw),
        }
    }
}

/// A half-open `[low, high)` interval of byte offsets.
///
/// Used for both spaces the reader works in: offsets within the compressed
/// container and offsets within the logical decompressed stream. It is
/// invalid for `low` to exceed `high`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub low: u64,
    pub high: u64,
}

impl Range {
    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }

    pub fn size(&self) -> u64 {
        self.high - self.low
    }
}

/// One leaf entry of the index: a span of the decompressed stream together
/// with the compressed byte ranges needed to materialize it.
///
/// Chunks are plain value copies and hold no reference to the reader's
/// internal node buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// The decompressed-stream span this chunk covers. Never empty for a
    /// chunk returned by the reader.
    pub d_range: Range,
    /// The chunk's primary compressed bytes.
    pub c_primary: Range,
    /// Auxiliary compressed bytes, e.g. a shared dictionary. Empty when
    /// unused.
    pub c_secondary: Range,
    /// Further auxiliary compressed bytes. Empty when unused.
    pub c_tertiary: Range,
    /// The raw secondary index tag from the leaf slot.
    pub s_tag: u8,
    /// The raw tertiary index tag from the leaf slot.
    pub t_tag: u8,
    /// Codec identifier inherited from the containing node.
    pub codec: Codec,
}
