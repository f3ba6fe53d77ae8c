//! The RAC reader: root location, seeking, and chunk iteration.

use std::fs::File;
use std::path::Path;

use log::{debug, info, trace};

use super::error::{RacError, Result};
use super::iter::Chunks;
use super::models::{Chunk, Codec};
use super::node::{self, Node};
use super::source::ByteSource;

/// The smallest valid container: a single node of arity 1.
const MIN_COMPRESSED_SIZE: u64 = 32;

/// Upper bound on the depth of a descent from the root.
///
/// Parent/child validation alone cannot rule out a crafted file whose
/// branch nodes form a cycle, so descent gives up after this many levels.
/// No well-formed index comes anywhere near it: every level needs at least
/// one more 32-byte node inside its parent's CSpace ceiling.
const MAX_DESCENT_DEPTH: usize = 64;

/// A reader over a RAC container.
///
/// The reader resolves offsets in the logical decompressed stream to the
/// compressed chunks covering them; decompressing chunk payloads is the
/// caller's business. It holds exactly one node buffer, overwritten on
/// every load, and a cursor that restarts from the root on every seek.
///
/// Errors are sticky: once any operation fails, every subsequent call
/// returns the same error. The reader is not safe for concurrent use.
///
/// # Example
/// ```no_run
/// # use rac_reader::Reader;
/// # fn main() -> rac_reader::Result<()> {
/// let mut reader = Reader::open("data.rac")?;
/// reader.seek_to_chunk_containing(1 << 20)?;
/// while let Some(chunk) = reader.next_chunk()? {
///     // Hand chunk.c_primary to the decompressor named by chunk.codec.
///     println!("{:?} <- {:?} ({})", chunk.d_range, chunk.c_primary, chunk.codec);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Reader<S> {
    source: S,
    compressed_size: u64,

    /// Set by the first public call; construction itself does no I/O.
    initialized: bool,
    /// First error encountered, re-emitted by every later call.
    err: Option<RacError>,

    root_c_offset: u64,
    root_arity: u8,
    decompressed_size: u64,

    /// When true, the next chunk request must descend from the root to the
    /// leaf containing `seek_position`; when false the cursor sits inside a
    /// loaded leaf node.
    need_to_resolve_seek: bool,
    seek_position: u64,
    /// Slot index of the next chunk to emit from the current node.
    next_slot: usize,
    /// Biases established by the path from the root to the current node.
    curr_c_bias: u64,
    curr_d_bias: u64,
    node: Node,
}

impl Reader<File> {
    /// Opens a RAC container on disk, taking the compressed size from file
    /// metadata.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("opening RAC container: {}", path.display());
        let file = File::open(path)?;
        let compressed_size = file.metadata()?.len();
        Ok(Self::new(file, compressed_size))
    }
}

impl<S: ByteSource> Reader<S> {
    /// Creates a reader over `source`, a container of `compressed_size`
    /// bytes.
    ///
    /// No I/O happens here. The index root is located on the first call to
    /// any other method, which is also where an undersized
    /// `compressed_size` is rejected.
    pub fn new(source: S, compressed_size: u64) -> Self {
        Reader {
            source,
            compressed_size,
            initialized: false,
            err: None,
            root_c_offset: 0,
            root_arity: 0,
            decompressed_size: 0,
            need_to_resolve_seek: false,
            seek_position: 0,
            next_slot: 0,
            curr_c_bias: 0,
            curr_d_bias: 0,
            node: Node::new(),
        }
    }

    /// Total size of the logical decompressed stream described by the
    /// index.
    pub fn decompressed_size(&mut self) -> Result<u64> {
        self.initialize()?;
        Ok(self.decompressed_size)
    }

    /// Positions the cursor so that the next chunk returned is the one
    /// containing `d`. That chunk does not necessarily start at `d`.
    ///
    /// Cheap: no I/O happens until the next [`next_chunk`] call.
    ///
    /// [`next_chunk`]: Reader::next_chunk
    pub fn seek_to_chunk_containing(&mut self, d: u64) -> Result<()> {
        self.initialize()?;
        self.need_to_resolve_seek = true;
        self.seek_position = d;
        Ok(())
    }

    /// Returns the next non-empty chunk in decompressed-stream order, or
    /// `None` once the cursor has passed the last chunk.
    ///
    /// Chunks with an empty decompressed range carry only metadata; they
    /// are skipped, though they still advance the cursor.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        self.initialize()?;
        loop {
            if self.need_to_resolve_seek {
                if self.seek_position >= self.decompressed_size {
                    return Ok(None);
                }
                self.need_to_resolve_seek = false;
                self.resolve_seek_position()?;
            }
            while self.next_slot < self.node.arity() {
                let chunk = self
                    .node
                    .chunk(self.next_slot, self.curr_c_bias, self.curr_d_bias);
                self.next_slot += 1;
                self.seek_position = chunk.d_range.high;
                if !chunk.d_range.is_empty() {
                    return Ok(Some(chunk));
                }
            }
            // Leaf exhausted; descend again from the root.
            self.need_to_resolve_seek = true;
        }
    }

    /// Returns an iterator over the chunks ahead of the current cursor
    /// position.
    pub fn chunks(&mut self) -> Chunks<'_, S> {
        Chunks::new(self)
    }

    /// Latches `err` as the sticky error and returns it.
    fn fail(&mut self, err: RacError) -> RacError {
        self.err = Some(err.clone());
        err
    }

    fn initialize(&mut self) -> Result<()> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        if self.compressed_size < MIN_COMPRESSED_SIZE {
            return Err(self.fail(RacError::InvalidCompressedSize(self.compressed_size)));
        }
        self.find_root_node()?;
        let version = self.node.version();
        if version != 1 {
            return Err(self.fail(RacError::UnsupportedVersion(version)));
        }
        Ok(())
    }

    /// Probes both root placements: a node at the head of the container,
    /// then a node ending at its last byte.
    fn find_root_node(&mut self) -> Result<()> {
        // Head placement: magic at offset 0, the root arity in the fourth
        // byte.
        self.read_at(4, 0)?;
        if self.node.starts_with_magic() && self.try_root_node(self.node.byte(3), false)? {
            return Ok(());
        }

        // Tail placement: the container's last byte is the duplicated arity
        // footer of a node occupying the final bytes of the file.
        self.read_at(1, self.compressed_size - 1)?;
        if self.try_root_node(self.node.byte(0), true)? {
            return Ok(());
        }

        Err(self.fail(RacError::MissingRootNode))
    }

    /// Attempts to load and validate a root node of the given arity at one
    /// placement. `Ok(false)` means "no valid root here"; only I/O failures
    /// are errors.
    fn try_root_node(&mut self, arity: u8, from_end: bool) -> Result<bool> {
        if arity == 0 {
            return Ok(false);
        }
        let size = node::node_size(arity) as u64;
        if self.compressed_size < size {
            return Ok(false);
        }
        let c_offset = if from_end {
            self.compressed_size - size
        } else {
            0
        };
        self.load(c_offset, arity)?;
        if !self.node.validate() {
            return Ok(false);
        }
        // The root's CSpace ceiling must equal the container length.
        if self.node.c_ptr_max() != self.compressed_size {
            return Ok(false);
        }

        debug!(
            "index root located: offset={} arity={} decompressed_size={}",
            c_offset,
            arity,
            self.node.d_ptr_max()
        );
        self.need_to_resolve_seek = true;
        self.root_c_offset = c_offset;
        self.root_arity = arity;
        self.decompressed_size = self.node.d_ptr_max();
        Ok(true)
    }

    /// Reads `len` bytes at `offset` into the node buffer, latching any I/O
    /// error.
    fn read_at(&mut self, len: usize, offset: u64) -> Result<()> {
        if let Err(err) = self.source.read_exact_at(self.node.prefix_mut(len), offset) {
            return Err(self.fail(err.into()));
        }
        Ok(())
    }

    /// Loads the full node of the given arity at `c_offset` into the
    /// scratch buffer. The caller is responsible for validating the result.
    fn load(&mut self, c_offset: u64, arity: u8) -> Result<()> {
        debug_assert!(arity != 0);
        trace!("loading node: offset={} arity={}", c_offset, arity);
        self.read_at(node::node_size(arity), c_offset)
    }

    /// Walks from the root to the leaf node containing `seek_position`,
    /// validating each child against its parent.
    fn resolve_seek_position(&mut self) -> Result<()> {
        // Reload the root. It was validated during initialization, and the
        // scratch buffer may hold any node by now.
        self.load(self.root_c_offset, self.root_arity)?;

        let mut c_bias = 0;
        let mut d_bias = 0;
        for _ in 0..MAX_DESCENT_DEPTH {
            let i = self.node.find_chunk_containing(self.seek_position, d_bias);
            if self.node.is_leaf(i) {
                self.next_slot = i;
                self.curr_c_bias = c_bias;
                self.curr_d_bias = d_bias;
                return Ok(());
            }

            // The slot is a branch: its CPtr names the child node, and its
            // STag, when it indexes into the table, names the slot whose
            // CPtr is the child's CSpace bias.
            let parent_codec = self.node.codec();
            let parent_version = self.node.version();
            let parent_c_off_max = c_bias + self.node.c_ptr_max();
            let child_c_offset = self.node.c_off(i, c_bias);
            let s_tag = usize::from(self.node.s_tag(i));
            let child_c_bias = if s_tag < self.node.arity() {
                self.node.c_off(s_tag, c_bias)
            } else {
                c_bias
            };
            let child_d_bias = self.node.d_off(i, d_bias);
            let child_d_size = self.node.d_size(i);

            trace!(
                "descending: slot={} child_offset={} c_bias={} d_bias={}",
                i,
                child_c_offset,
                child_c_bias,
                child_d_bias
            );
            self.load_and_validate(
                child_c_offset,
                parent_codec,
                parent_version,
                parent_c_off_max,
                child_c_bias,
                child_d_size,
            )?;
            c_bias = child_c_bias;
            d_bias = child_d_bias;
        }
        Err(self.fail(RacError::InvalidIndexNode))
    }

    /// Loads the node at `c_offset` and checks it, first in isolation and
    /// then against what its parent declared about it.
    fn load_and_validate(
        &mut self,
        c_offset: u64,
        parent_codec: Codec,
        parent_version: u8,
        parent_c_off_max: u64,
        child_c_bias: u64,
        child_d_size: u64,
    ) -> Result<()> {
        if self.compressed_size - 4 < c_offset {
            return Err(self.fail(RacError::InvalidIndexNode));
        }
        self.read_at(4, c_offset)?;
        let arity = self.node.byte(3);
        if arity == 0 {
            return Err(self.fail(RacError::InvalidIndexNode));
        }
        let size = node::node_size(arity) as u64;
        if self.compressed_size < size || self.compressed_size - size < c_offset {
            return Err(self.fail(RacError::InvalidIndexNode));
        }
        self.load(c_offset, arity)?;

        if !self.node.validate() {
            return Err(self.fail(RacError::InvalidIndexNode));
        }

        // The child must stay within everything its parent declared about
        // it: codec capabilities, version, CSpace ceiling, and DSpace size.
        if !parent_codec.is_superset_of(self.node.codec())
            || parent_version < self.node.version()
            || parent_c_off_max < child_c_bias + self.node.c_ptr_max()
            || child_d_size != self.node.d_ptr_max()
        {
            return Err(self.fail(RacError::InvalidIndexNode));
        }
        Ok(())
    }
}
