pub mod undo;

use crate::buffer::ByteBuffer;
use crate::changes::{ChangeSet, EditKind};

/// A byte-level modification reported to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange {
    pub offset: usize,
    pub data: Vec<u8>,
    pub kind: EditKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Insert { data: Vec<u8> },
    /// `removed` is filled on the first redo
    Remove { len: usize, removed: Vec<u8> },
    /// `prior` is filled on every redo
    Replace { data: Vec<u8>, prior: Vec<u8> },
}

/// One reversible buffer mutation together with the annotations that held
/// right after it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCommand {
    offset: usize,
    op: Op,
    changes_after: ChangeSet,
}

impl EditCommand {
    pub fn insert(offset: usize, data: Vec<u8>, changes_after: ChangeSet) -> Self {
        Self {
            offset,
            op: Op::Insert { data },
            changes_after,
        }
    }

    pub fn remove(offset: usize, len: usize, changes_after: ChangeSet) -> Self {
        Self {
            offset,
            op: Op::Remove {
                len,
                removed: Vec::new(),
            },
            changes_after,
        }
    }

    pub fn replace(offset: usize, data: Vec<u8>, changes_after: ChangeSet) -> Self {
        Self {
            offset,
            op: Op::Replace {
                data,
                prior: Vec::new(),
            },
            changes_after,
        }
    }

    /// Annotation snapshot to restore once this command is the last applied
    pub fn changes_after(&self) -> &ChangeSet {
        &self.changes_after
    }

    /// Apply the command, caching whatever is needed to undo it.
    pub fn redo(&mut self, buffer: &mut dyn ByteBuffer) -> DataChange {
        let offset = self.offset;
        match &mut self.op {
            Op::Insert { data } => {
                buffer.insert(offset, data);
                DataChange {
                    offset,
                    data: data.clone(),
                    kind: EditKind::Insert,
                }
            }
            Op::Remove { len, removed } => {
                *removed = buffer.read(offset, *len);
                buffer.remove(offset, removed.len());
                DataChange {
                    offset,
                    data: removed.clone(),
                    kind: EditKind::Remove,
                }
            }
            Op::Replace { data, prior } => {
                *prior = buffer.read(offset, data.len());
                buffer.replace(offset, data);
                DataChange {
                    offset,
                    data: data.clone(),
                    kind: EditKind::Replace,
                }
            }
        }
    }

    /// Revert the command; returns the inverse change for observers.
    pub fn undo(&mut self, buffer: &mut dyn ByteBuffer) -> DataChange {
        let offset = self.offset;
        match &self.op {
            Op::Insert { data } => {
                buffer.remove(offset, data.len());
                DataChange {
                    offset,
                    data: data.clone(),
                    kind: EditKind::Remove,
                }
            }
            Op::Remove { removed, .. } => {
                buffer.insert(offset, removed);
                DataChange {
                    offset,
                    data: removed.clone(),
                    kind: EditKind::Insert,
                }
            }
            Op::Replace { data, prior } => {
                buffer.replace(offset, prior);
                // Drop whatever the replace appended past the old end.
                if data.len() > prior.len() {
                    buffer.remove(offset + prior.len(), data.len() - prior.len());
                }
                DataChange {
                    offset,
                    data: prior.clone(),
                    kind: EditKind::Replace,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    #[test]
    fn test_insert_round_trip() {
        let mut buffer = MemoryBuffer::from_bytes(b"abcdef".to_vec());
        let mut cmd = EditCommand::insert(3, b"XY".to_vec(), ChangeSet::new());

        let change = cmd.redo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abcXYdef");
        assert_eq!(change.kind, EditKind::Insert);

        let change = cmd.undo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abcdef");
        assert_eq!(change.kind, EditKind::Remove);
        assert_eq!(change.data, b"XY");
    }

    #[test]
    fn test_remove_caches_payload() {
        let mut buffer = MemoryBuffer::from_bytes(b"abcdef".to_vec());
        let mut cmd = EditCommand::remove(4, 10, ChangeSet::new());

        let change = cmd.redo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abcd");
        assert_eq!(change.data, b"ef");

        let change = cmd.undo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abcdef");
        assert_eq!(change.kind, EditKind::Insert);
    }

    #[test]
    fn test_replace_restores_prior_bytes() {
        let mut buffer = MemoryBuffer::from_bytes(b"abcdef".to_vec());
        let mut cmd = EditCommand::replace(1, b"XYZ".to_vec(), ChangeSet::new());

        cmd.redo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"aXYZef");

        let change = cmd.undo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abcdef");
        assert_eq!(change.kind, EditKind::Replace);
        assert_eq!(change.data, b"bcd");
    }

    #[test]
    fn test_replace_past_end_undo_truncates() {
        let mut buffer = MemoryBuffer::from_bytes(b"abc".to_vec());
        let mut cmd = EditCommand::replace(2, b"XYZ".to_vec(), ChangeSet::new());

        cmd.redo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abXYZ");

        cmd.undo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"abc");
    }
}
