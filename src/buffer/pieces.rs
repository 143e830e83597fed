use std::ops::Range;

/// Read-only origin of the unedited content
pub trait PieceSource {
    fn len(&self) -> usize;

    /// Fill `buf` from `offset`; returns the number of bytes read.
    fn read_into(&self, offset: usize, buf: &mut [u8]) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PieceKind {
    Original,
    Added,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    kind: PieceKind,
    start: usize,
    len: usize,
}

impl Piece {
    fn split_at(self, at: usize) -> (Piece, Piece) {
        (
            Piece { len: at, ..self },
            Piece {
                start: self.start + at,
                len: self.len - at,
                ..self
            },
        )
    }
}

#[derive(Debug)]
pub struct PieceTable<S> {
    source: S,
    additions: Vec<u8>,
    pieces: Vec<Piece>,
    /// Logical offset of each piece, parallel to `pieces`
    starts: Vec<usize>,
    total: usize,
}

impl<S: PieceSource> PieceTable<S> {
    pub fn new(source: S) -> Self {
        let total = source.len();
        let pieces = if total > 0 {
            vec![Piece {
                kind: PieceKind::Original,
                start: 0,
                len: total,
            }]
        } else {
            Vec::new()
        };

        let mut table = Self {
            source,
            additions: Vec::new(),
            pieces,
            starts: Vec::new(),
            total,
        };
        table.reindex();
        table
    }

    fn reindex(&mut self) {
        self.starts.clear();
        let mut pos = 0;
        for piece in &self.pieces {
            self.starts.push(pos);
            pos += piece.len;
        }
    }

    /// Index of the piece containing `offset`
    fn locate(&self, offset: usize) -> Option<usize> {
        if offset >= self.total {
            return None;
        }
        Some(self.starts.partition_point(|&start| start <= offset) - 1)
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// True while the content is exactly the untouched source
    pub fn is_pristine(&self) -> bool {
        self.additions.is_empty() && self.total == self.source.len() && self.pieces.len() <= 1
    }

    /// Split so that a piece boundary sits at `offset`; returns the index of
    /// the first piece starting at or after it.
    fn split(&mut self, offset: usize) -> usize {
        let Some(idx) = self.locate(offset) else {
            return self.pieces.len();
        };
        let inner = offset - self.starts[idx];
        if inner == 0 {
            return idx;
        }
        let (left, right) = self.pieces[idx].split_at(inner);
        self.pieces[idx] = left;
        self.pieces.insert(idx + 1, right);
        self.starts.insert(idx + 1, offset);
        idx + 1
    }

    /// Single byte at `offset` without allocating
    pub fn at(&self, offset: usize) -> Option<u8> {
        let idx = self.locate(offset)?;
        let piece = self.pieces[idx];
        let inner = piece.start + (offset - self.starts[idx]);
        match piece.kind {
            PieceKind::Original => {
                let mut byte = [0u8; 1];
                (self.source.read_into(inner, &mut byte) == 1).then_some(byte[0])
            }
            PieceKind::Added => self.additions.get(inner).copied(),
        }
    }

    pub fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        let end = offset.saturating_add(len).min(self.total);
        if offset >= end {
            return Vec::new();
        }

        let mut out = vec![0u8; end - offset];
        let mut filled = 0;
        let first = self.locate(offset).unwrap_or(self.pieces.len());
        for (piece, &start) in self.pieces[first..].iter().zip(&self.starts[first..]) {
            let range = start..start + piece.len;
            let pos = range.end;
            let Some(overlap) = intersect(&range, &(offset..end)) else {
                continue;
            };

            let inner = piece.start + (overlap.start - range.start);
            let dst = &mut out[filled..filled + overlap.len()];
            let got = match piece.kind {
                PieceKind::Original => self.source.read_into(inner, dst),
                PieceKind::Added => {
                    dst.copy_from_slice(&self.additions[inner..inner + overlap.len()]);
                    overlap.len()
                }
            };
            filled += got;
            if got < overlap.len() || pos >= end {
                break;
            }
        }

        out.truncate(filled);
        out
    }

    pub fn insert(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let offset = offset.min(self.total);
        let idx = self.split(offset);
        let piece = Piece {
            kind: PieceKind::Added,
            start: self.additions.len(),
            len: data.len(),
        };
        self.additions.extend_from_slice(data);
        self.pieces.insert(idx, piece);
        self.total += data.len();
        self.reindex();
    }

    pub fn remove(&mut self, offset: usize, len: usize) {
        let end = offset.saturating_add(len).min(self.total);
        if offset >= end {
            return;
        }
        let first = self.split(offset);
        let last = self.split(end);
        self.pieces.drain(first..last);
        self.total -= end - offset;
        self.reindex();
    }

    pub fn replace(&mut self, offset: usize, data: &[u8]) {
        let offset = offset.min(self.total);
        let overwritten = data.len().min(self.total - offset);
        self.remove(offset, overwritten);
        self.insert(offset, data);
    }
}

fn intersect(a: &Range<usize>, b: &Range<usize>) -> Option<Range<usize>> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start < end).then_some(start..end)
}
