/// What kind of edit touched a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditKind {
    #[default]
    None,
    Insert,
    Remove,
    Replace,
}

/// Half-open annotated span `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub reason: EditKind,
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(reason: EditKind, start: usize, end: usize) -> Self {
        Self { reason, start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    ranges: Vec<ByteRange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Index of the range containing `offset`
    pub fn find(&self, offset: usize) -> Option<usize> {
        self.ranges
            .binary_search_by(|r| {
                if offset < r.start {
                    std::cmp::Ordering::Greater
                } else if offset >= r.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
    }

    pub fn reason_at(&self, offset: usize) -> EditKind {
        self.find(offset)
            .map_or(EditKind::None, |idx| self.ranges[idx].reason)
    }

    /// Record `len` bytes inserted at `offset`.
    ///
    /// Content after the insertion point slides right. When the insertion
    /// lands inside an existing range, that range is split around the new
    /// one so the set stays disjoint.
    pub fn record_insert(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }

        let mut shifted = Vec::with_capacity(self.ranges.len() + 2);
        for r in &self.ranges {
            if r.end <= offset {
                shifted.push(*r);
            } else if r.start >= offset {
                shifted.push(ByteRange::new(r.reason, r.start + len, r.end + len));
            } else {
                shifted.push(ByteRange::new(r.reason, r.start, offset));
                shifted.push(ByteRange::new(r.reason, offset + len, r.end + len));
            }
        }
        shifted.push(ByteRange::new(EditKind::Insert, offset, offset + len));
        shifted.sort_by_key(|r| r.start);

        tracing::trace!(offset, len, ranges = shifted.len(), "recorded insert");
        self.ranges = shifted;
    }

    /// Record `len` bytes removed at `offset`, trimming, splitting and
    /// shifting the ranges it touches.
    pub fn record_remove(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }

        let end = offset + len;
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.end <= offset {
                kept.push(*r);
            } else if r.start >= end {
                kept.push(ByteRange::new(r.reason, r.start - len, r.end - len));
            } else {
                if r.start < offset {
                    kept.push(ByteRange::new(r.reason, r.start, offset));
                }
                if r.end > end {
                    kept.push(ByteRange::new(r.reason, offset, r.end - len));
                }
            }
        }

        tracing::trace!(offset, len, ranges = kept.len(), "recorded remove");
        self.ranges = kept;
    }

    /// Record `len` bytes overwritten at `offset`.
    ///
    /// Only marks the span when `offset` is not already annotated: a replace
    /// inside an inserted range stays an insert. The new range is clipped at
    /// the next annotated range.
    pub fn record_replace(&mut self, offset: usize, len: usize) {
        if len == 0 || self.find(offset).is_some() {
            return;
        }

        let idx = self.ranges.partition_point(|r| r.start < offset);
        let end = self
            .ranges
            .get(idx)
            .map_or(offset + len, |next| next.start.min(offset + len));
        self.ranges
            .insert(idx, ByteRange::new(EditKind::Replace, offset, end));
        tracing::trace!(offset, len, "recorded replace");
    }

    /// Ranges are sorted and pairwise disjoint
    pub fn is_consistent(&self) -> bool {
        self.ranges.iter().all(|r| !r.is_empty())
            && self.ranges.windows(2).all(|w| w[0].end <= w[1].start)
    }
}
