pub mod mapped;
pub mod memory;
pub mod pieces;
pub mod streamed;

#[cfg(test)]
mod tests;

use std::io::{self, Write};
use std::path::Path;

pub use mapped::MappedFileBuffer;
pub use memory::MemoryBuffer;
pub use streamed::StreamedBuffer;

/// Chunk size used by the default substring search and serialisation
const SCAN_CHUNK: usize = 64 * 1024;

/// Which storage strategy a buffer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Memory,
    MappedFile,
    Streamed,
}

/// Byte storage behind a document. Reads clamp at the end of data and
/// `remove`/`replace` clamp their span.
pub trait ByteBuffer {
    fn kind(&self) -> BufferKind;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `len` bytes starting at `offset`. Returns fewer bytes, or
    /// none, past the end of data.
    fn read(&self, offset: usize, len: usize) -> Vec<u8>;

    /// Single byte at `offset`, `None` past the end
    fn at(&self, offset: usize) -> Option<u8> {
        self.read(offset, 1).first().copied()
    }

    /// Insert `data` at `offset`; offsets past the end append.
    fn insert(&mut self, offset: usize, data: &[u8]);

    /// Remove up to `len` bytes starting at `offset`.
    fn remove(&mut self, offset: usize, len: usize);

    /// Overwrite bytes starting at `offset`, growing the buffer if the write
    /// runs past the end.
    fn replace(&mut self, offset: usize, data: &[u8]);

    /// Whether `offset` is addressable content
    fn accept(&self, _offset: usize) -> bool {
        true
    }

    /// File whose bytes are still identical to this buffer's content
    fn pristine_source(&self) -> Option<&Path> {
        None
    }

    /// First occurrence of `needle` starting at or after `from`
    fn index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() || from >= self.len() {
            return None;
        }

        let overlap = needle.len() - 1;
        let mut start = from;
        while start < self.len() {
            let chunk = self.read(start, SCAN_CHUNK + overlap);
            if chunk.len() < needle.len() {
                return None;
            }
            if let Some(pos) = chunk.windows(needle.len()).position(|w| w == needle) {
                return Some(start + pos);
            }
            start += chunk.len() - overlap;
        }
        None
    }

    /// Last occurrence of `needle` starting at or before `from`
    fn last_index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.len() {
            return None;
        }

        // Highest start position whose window still fits in the data.
        let mut end = from.min(self.len() - needle.len()) + needle.len();
        loop {
            let start = end.saturating_sub(SCAN_CHUNK + needle.len() - 1);
            let chunk = self.read(start, end - start);
            if let Some(pos) = chunk.windows(needle.len()).rposition(|w| w == needle) {
                return Some(start + pos);
            }
            if start == 0 {
                return None;
            }
            end = start + needle.len() - 1;
        }
    }

    /// Serialise the logical content into `sink`.
    fn write(&self, sink: &mut dyn Write) -> io::Result<()> {
        let mut offset = 0;
        while offset < self.len() {
            let chunk = self.read(offset, SCAN_CHUNK);
            if chunk.is_empty() {
                break;
            }
            sink.write_all(&chunk)?;
            offset += chunk.len();
        }
        sink.flush()
    }
}
