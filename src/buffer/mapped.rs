use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::pieces::{PieceSource, PieceTable};
use super::{BufferKind, ByteBuffer};
use crate::error::{EngineError, Result};

#[derive(Debug)]
pub struct MappedSource {
    // Zero-length files cannot be mapped on every platform.
    mmap: Option<Mmap>,
}

impl PieceSource for MappedSource {
    fn len(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    fn read_into(&self, offset: usize, buf: &mut [u8]) -> usize {
        let Some(mmap) = self.mmap.as_ref() else {
            return 0;
        };
        let start = offset.min(mmap.len());
        let end = offset.saturating_add(buf.len()).min(mmap.len());
        buf[..end - start].copy_from_slice(&mmap[start..end]);
        end - start
    }
}

/// Read-only mapping of a file, edited through a piece table. Truncating the
/// file while it is mapped is undefined behaviour.
#[derive(Debug)]
pub struct MappedFileBuffer {
    table: PieceTable<MappedSource>,
    path: PathBuf,
}

impl MappedFileBuffer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EngineError::open(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| EngineError::open(path, e))?
            .len();

        let mmap = if size == 0 {
            None
        } else {
            // SAFETY: the map is only read; external modification of the
            // file while mapped is outside the engine's guarantees.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| EngineError::map(path, e))?;
            Some(mmap)
        };

        tracing::debug!(path = %path.display(), size, "mapped file");

        Ok(Self {
            table: PieceTable::new(MappedSource { mmap }),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether no edit has been applied since the file was mapped
    pub fn is_pristine(&self) -> bool {
        self.table.is_pristine()
    }
}

impl ByteBuffer for MappedFileBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::MappedFile
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        self.table.read(offset, len)
    }

    fn at(&self, offset: usize) -> Option<u8> {
        self.table.at(offset)
    }

    fn insert(&mut self, offset: usize, data: &[u8]) {
        self.table.insert(offset, data);
    }

    fn remove(&mut self, offset: usize, len: usize) {
        self.table.remove(offset, len);
    }

    fn replace(&mut self, offset: usize, data: &[u8]) {
        self.table.replace(offset, data);
    }

    fn pristine_source(&self) -> Option<&Path> {
        self.is_pristine().then_some(self.path.as_path())
    }
}
