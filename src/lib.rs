//! Reader for the Random Access Compression (RAC) container format.
//!
//! RAC is to block-compressed data what a B-tree is to sorted keys: an
//! on-disk index whose leaves point at independently compressed chunks and
//! whose branch nodes recursively delegate ranges of the decompressed
//! stream. This crate parses and validates that index and resolves any
//! decompressed-stream offset to the minimal set of compressed chunks
//! covering it. Decompressing the chunk payloads themselves is left to an
//! external codec, selected by the [`Codec`] identifier each chunk carries.
//!
//! # Example
//! ```no_run
//! use rac_reader::Reader;
//!
//! # fn main() -> rac_reader::Result<()> {
//! let mut reader = Reader::open("archive.rac")?;
//! println!("decompressed size: {}", reader.decompressed_size()?);
//!
//! // Jump into the middle of the decompressed stream and walk the chunks
//! // covering everything from there to the end.
//! reader.seek_to_chunk_containing(1 << 20)?;
//! while let Some(chunk) = reader.next_chunk()? {
//!     println!("{:?} <- {:?} ({})", chunk.d_range, chunk.c_primary, chunk.codec);
//! }
//! # Ok(())
//! # }
//! ```

pub mod rac;

pub use rac::{ByteSource, Chunk, Chunks, Codec, RacError, Range, Reader, Result, SeekSource};
