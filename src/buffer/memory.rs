use std::io::{self, Write};

use super::{BufferKind, ByteBuffer};

/// Whole content resident in memory. Suited to small files and to
/// documents created from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBuffer {
    data: Vec<u8>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl ByteBuffer for MemoryBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::Memory
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        let start = offset.min(self.data.len());
        let end = offset.saturating_add(len).min(self.data.len());
        self.data[start..end].to_vec()
    }

    fn at(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    fn insert(&mut self, offset: usize, data: &[u8]) {
        let offset = offset.min(self.data.len());
        self.data.splice(offset..offset, data.iter().copied());
    }

    fn remove(&mut self, offset: usize, len: usize) {
        let start = offset.min(self.data.len());
        let end = offset.saturating_add(len).min(self.data.len());
        self.data.drain(start..end);
    }

    fn replace(&mut self, offset: usize, data: &[u8]) {
        let offset = offset.min(self.data.len());
        let overlap = data.len().min(self.data.len() - offset);
        self.data[offset..offset + overlap].copy_from_slice(&data[..overlap]);
        self.data.extend_from_slice(&data[overlap..]);
    }

    fn index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() || from >= self.data.len() {
            return None;
        }
        self.data[from..]
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|pos| from + pos)
    }

    fn write(&self, sink: &mut dyn Write) -> io::Result<()> {
        sink.write_all(&self.data)?;
        sink.flush()
    }
}
