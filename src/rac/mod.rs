//! Core RAC reader module.
//!
//! A RAC container is a seekable index over independently compressed
//! chunks: a persistent multi-way tree whose leaves point at compressed
//! byte spans and whose branch nodes delegate ranges of the decompressed
//! stream. The reader walks that tree to answer one question: which
//! compressed bytes cover a given decompressed offset?
//!
//! # Module Organization
//!
//! - [`source`]: positional reads over a seekable input
//! - [`node`](self): fixed-layout interpretation and validation of index
//!   nodes
//! - [`reader`](Reader): root location plus the seek/descent cursor
//! - [`models`]: the `Chunk`, `Range` and `Codec` values handed to callers
//!
//! Decompressing chunk payloads is out of scope; chunks carry a [`Codec`]
//! identifier so callers can pick the right decompressor.

pub mod error;
pub mod models;
pub mod source;

mod iter;
mod node;
mod reader;

pub use error::{RacError, Result};
pub use iter::Chunks;
pub use models::{Chunk, Codec, Range};
pub use reader::Reader;
pub use source::{ByteSource, SeekSource};
