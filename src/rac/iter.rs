//! Pull-based iteration over a reader's chunks.

use super::error::Result;
use super::models::Chunk;
use super::reader::Reader;
use super::source::ByteSource;

/// Iterator over the chunks ahead of a reader's cursor, in
/// decompressed-stream order.
///
/// An error is yielded once, after which the iterator is fused; the reader
/// itself keeps returning the same latched error. Seeking the reader after
/// the iterator is dropped restarts the sequence.
///
/// Created by [`Reader::chunks`].
pub struct Chunks<'a, S> {
    reader: &'a mut Reader<S>,
    done: bool,
}

impl<'a, S> Chunks<'a, S> {
    pub(super) fn new(reader: &'a mut Reader<S>) -> Self {
        Chunks {
            reader,
            done: false,
        }
    }
}

impl<S: ByteSource> Iterator for Chunks<'_, S> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
