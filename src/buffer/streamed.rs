use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::pieces::{PieceSource, PieceTable};
use super::{BufferKind, ByteBuffer};
use crate::error::{EngineError, Result};

#[derive(Debug)]
struct Chunk {
    offset: usize,
    data: Vec<u8>,
}

#[derive(Debug)]
pub struct StreamSource {
    file: RefCell<File>,
    len: usize,
    chunk_size: usize,
    cache: RefCell<Option<Chunk>>,
}

impl StreamSource {
    fn load_chunk(&self, offset: usize) -> Option<Chunk> {
        let start = offset - offset % self.chunk_size;
        let want = self.chunk_size.min(self.len - start);
        let mut data = vec![0u8; want];

        let mut file = self.file.borrow_mut();
        let result = file
            .seek(SeekFrom::Start(start as u64))
            .and_then(|_| read_full(&mut *file, &mut data));

        match result {
            Ok(n) => {
                data.truncate(n);
                Some(Chunk {
                    offset: start,
                    data,
                })
            }
            Err(e) => {
                tracing::warn!(offset = start, error = %e, "streamed read failed");
                None
            }
        }
    }
}

fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl PieceSource for StreamSource {
    fn len(&self) -> usize {
        self.len
    }

    fn read_into(&self, offset: usize, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() && offset + filled < self.len {
            let pos = offset + filled;
            let mut cache = self.cache.borrow_mut();
            let hit = cache
                .as_ref()
                .is_some_and(|c| pos >= c.offset && pos < c.offset + c.data.len());
            if !hit {
                *cache = self.load_chunk(pos);
            }
            let Some(chunk) = cache.as_ref() else {
                break;
            };
            let inner = pos - chunk.offset;
            if inner >= chunk.data.len() {
                // The file shrank underneath us.
                break;
            }
            let n = (chunk.data.len() - inner).min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&chunk.data[inner..inner + n]);
            filled += n;
        }
        filled
    }
}

/// File read on demand through a one-chunk cache. I/O errors show up as
/// short reads.
#[derive(Debug)]
pub struct StreamedBuffer {
    table: PieceTable<StreamSource>,
    path: PathBuf,
}

impl StreamedBuffer {
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EngineError::open(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| EngineError::open(path, e))?
            .len() as usize;

        tracing::debug!(path = %path.display(), len, chunk_size, "opened streamed file");

        let source = StreamSource {
            file: RefCell::new(file),
            len,
            chunk_size: chunk_size.max(1),
            cache: RefCell::new(None),
        };

        Ok(Self {
            table: PieceTable::new(source),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_pristine(&self) -> bool {
        self.table.is_pristine()
    }
}

impl ByteBuffer for StreamedBuffer {
    fn kind(&self) -> BufferKind {
        BufferKind::Streamed
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
