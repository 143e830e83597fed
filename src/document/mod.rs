use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crossbeam::channel::{unbounded, Receiver, Sender};
use tempfile::NamedTempFile;

use crate::buffer::{BufferKind, ByteBuffer, MappedFileBuffer, MemoryBuffer, StreamedBuffer};
use crate::changes::{ChangeSet, EditKind};
use crate::config::EngineConfig;
use crate::edit::undo::UndoStack;
use crate::edit::{DataChange, EditCommand};
use crate::error::{EngineError, Result};
use crate::search::{self, CancelToken, FindOptions, FindValue, Match};

/// Notification sent to subscribers after the document changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Bytes at `offset` were inserted, removed or overwritten
    DataChanged(DataChange),
    /// Something changed; redraw
    Changed,
    /// The backing buffer was swapped; everything is new
    Reset,
    ModifiedChanged(bool),
    CanUndoChanged(bool),
    CanRedoChanged(bool),
    TrackChangesChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flags {
    modified: bool,
    can_undo: bool,
    can_redo: bool,
}

pub struct Document {
    buffer: Box<dyn ByteBuffer>,
    undo: UndoStack,
    changes: ChangeSet,
    track_changes: bool,
    config: EngineConfig,
    subscribers: Vec<Sender<DocumentEvent>>,
}

impl Document {
    pub fn with_config(buffer: Box<dyn ByteBuffer>, config: EngineConfig) -> Self {
        tracing::debug!(kind = ?buffer.kind(), len = buffer.len(), "document created");
        Self {
            buffer,
            undo: UndoStack::with_limit(config.undo_limit),
            changes: ChangeSet::new(),
            track_changes: config.track_changes,
            config,
            subscribers: Vec::new(),
        }
    }

    pub fn from_buffer(buffer: Box<dyn ByteBuffer>) -> Self {
        Self::with_config(buffer, EngineConfig::default())
    }

    /// Empty resident document
    pub fn create() -> Self {
        Self::from_resident(Vec::new())
    }

    pub fn from_resident(data: impl Into<Vec<u8>>) -> Self {
        Self::from_buffer(Box::new(MemoryBuffer::from_bytes(data)))
    }

    pub fn from_mapped_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_buffer(Box::new(MappedFileBuffer::open(path)?)))
    }

    pub fn from_streamed_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_streamed(path, EngineConfig::default())
    }

    pub fn open_streamed(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let buffer = StreamedBuffer::open(path, config.stream_chunk_size)?;
        Ok(Self::with_config(Box::new(buffer), config))
    }

    /// Open `path`, reading small files into memory and mapping large ones.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, EngineConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)
            .map_err(|e| EngineError::open(path, e))?
            .len();

        let buffer: Box<dyn ByteBuffer> = if size < config.mapped_threshold {
            let data = std::fs::read(path).map_err(|e| EngineError::open(path, e))?;
            Box::new(MemoryBuffer::from_bytes(data))
        } else {
            Box::new(MappedFileBuffer::open(path)?)
        };
        Ok(Self::with_config(buffer, config))
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<DocumentEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: DocumentEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn flags(&self) -> Flags {
        Flags {
            modified: self.is_modified(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    fn emit_flag_changes(&mut self, before: Flags) {
        let after = self.flags();
        if before.modified != after.modified {
            self.emit(DocumentEvent::ModifiedChanged(after.modified));
        }
        if before.can_undo != after.can_undo {
            self.emit(DocumentEvent::CanUndoChanged(after.can_undo));
        }
        if before.can_redo != after.can_redo {
            self.emit(DocumentEvent::CanRedoChanged(after.can_redo));
        }
    }

    fn commit(&mut self, command: EditCommand) {
        let before = self.flags();
        let change = self.undo.push(command, self.buffer.as_mut());
        self.emit(DocumentEvent::Changed);
        self.emit(DocumentEvent::DataChanged(change));
        self.emit_flag_changes(before);
    }

    // --- Reading ---

    pub fn buffer(&self) -> &dyn ByteBuffer {
        self.buffer.as_ref()
    }

    pub fn buffer_kind(&self) -> BufferKind {
        self.buffer.kind()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        self.buffer.read(offset, len)
    }

    pub fn at(&self, offset: usize) -> Option<u8> {
        self.buffer.at(offset)
    }

    pub fn accept(&self, offset: usize) -> bool {
        self.buffer.accept(offset)
    }

    pub fn index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
        self.buffer.index_of(needle, from)
    }

    pub fn last_index_of(&self, needle: &[u8], from: usize) -> Option<usize> {
        self.buffer.last_index_of(needle, from)
    }

    // --- Editing ---

    /// Insert `data` at `offset`. Offsets past the end are rejected.
    pub fn insert(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let len = self.buffer.len();
        if offset > len {
            tracing::warn!(offset, len, "insert past end rejected");
            return Err(EngineError::OffsetOutOfRange { offset, len });
        }
        if data.is_empty() {
            return Ok(());
        }

        if self.track_changes {
            self.changes.record_insert(offset, data.len());
        }
        self.commit(EditCommand::insert(offset, data.to_vec(), self.changes.clone()));
        Ok(())
    }

    pub fn insert_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        self.insert(offset, &[byte])
    }

    /// Overwrite bytes at `offset`, growing the document if the write runs
    /// past the end. Offsets past the end are clamped to it.
    pub fn replace(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let offset = offset.min(self.buffer.len());

        if self.track_changes {
            self.changes.record_replace(offset, data.len());
        }
        self.commit(EditCommand::replace(offset, data.to_vec(), self.changes.clone()));
    }

    pub fn replace_byte(&mut self, offset: usize, byte: u8) {
        self.replace(offset, &[byte]);
    }

    /// Remove up to `len` bytes at `offset`; the span is clamped to the data.
    pub fn remove(&mut self, offset: usize, len: usize) {
        let len = len.min(self.buffer.len().saturating_sub(offset));
        if len == 0 {
            return;
        }

        if self.track_changes {
            self.changes.record_remove(offset, len);
        }
        self.commit(EditCommand::remove(offset, len, self.changes.clone()));
    }

    /// Collect the following edits into one undo step
    pub fn begin_group(&mut self) {
        self.undo.begin_group();
    }

    pub fn end_group(&mut self) {
        let before = self.flags();
        self.undo.end_group();
        self.emit_flag_changes(before);
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        let before = self.flags();
        let Some(changes) = self.undo.undo(self.buffer.as_mut()) else {
            return false;
        };
        self.changes = self.undo.current_changes().clone();
        tracing::debug!(steps = self.undo.undo_count(), "undo");

        self.emit(DocumentEvent::Changed);
        for change in changes {
            self.emit(DocumentEvent::DataChanged(change));
        }
        self.emit_flag_changes(before);
        true
    }

    pub fn redo(&mut self) -> bool {
        let before = self.flags();
        let Some(changes) = self.undo.redo(self.buffer.as_mut()) else {
            return false;
        };
        self.changes = self.undo.current_changes().clone();
        tracing::debug!(steps = self.undo.undo_count(), "redo");

        self.emit(DocumentEvent::Changed);
        for change in changes {
            self.emit(DocumentEvent::DataChanged(change));
        }
        self.emit_flag_changes(before);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.undo_count()
    }

    /// Unsaved changes exist
    pub fn is_modified(&self) -> bool {
        !self.undo.is_clean()
    }

    /// Mark the current content as saved
    pub fn clear_modified(&mut self) {
        let before = self.flags();
        self.undo.set_clean();
        self.emit_flag_changes(before);
    }

    // --- Change tracking ---

    pub fn track_changes(&self) -> bool {
        self.track_changes
    }

    pub fn set_track_changes(&mut self, track: bool) {
        if track == self.track_changes {
            return;
        }
        self.track_changes = track;
        self.emit(DocumentEvent::TrackChangesChanged(track));
    }

    /// Index of the annotated range containing `offset`
    pub fn find_change(&self, offset: usize) -> Option<usize> {
        if !self.track_changes {
            return None;
        }
        self.changes.find(offset)
    }

    pub fn change_reason(&self, offset: usize) -> EditKind {
        if !self.track_changes {
            return EditKind::None;
        }
        self.changes.reason_at(offset)
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Drop the current annotations; history is kept
    pub fn clear_changes(&mut self) {
        if !self.track_changes || self.changes.is_empty() {
            return;
        }
        self.changes.clear();
        self.emit(DocumentEvent::Changed);
    }

    // --- Buffer replacement ---

    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.set_buffer(Box::new(MemoryBuffer::from_bytes(data)));
    }

    /// Swap the backing buffer, discarding history and annotations.
    pub fn set_buffer(&mut self, buffer: Box<dyn ByteBuffer>) {
        let before = self.flags();
        self.buffer = buffer;
        self.changes.clear();
        self.undo.clear();
        tracing::debug!(kind = ?self.buffer.kind(), len = self.buffer.len(), "buffer reset");

        self.emit_flag_changes(before);
        self.emit(DocumentEvent::Changed);
        self.emit(DocumentEvent::Reset);
    }

    // --- Saving ---

    /// Write the current content to `sink`. Does not clear the modified flag.
    pub fn save_to(&self, sink: &mut dyn Write) -> Result<()> {
        self.buffer.write(sink)?;
        Ok(())
    }

    /// Write the current content to the file at `path`.
    ///
    /// An unedited file-backed document is cloned from its source with a
    /// copy-on-write reflink where the filesystem supports it.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(source) = self.buffer.pristine_source() {
            if same_file(source, path) {
                return Ok(());
            }
            reflink_copy::reflink_or_copy(source, path)?;
            tracing::debug!(from = %source.display(), to = %path.display(), "cloned source");
            return Ok(());
        }

        if self.buffer.kind() != BufferKind::Memory {
            // The target may be the file backing our own pieces; write
            // beside it and rename over it. The temp file is removed if
            // anything fails before the rename.
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EngineError::open(dir, e))?;
            {
                let mut writer = BufWriter::new(tmp.as_file_mut());
                self.buffer.write(&mut writer)?;
                writer.flush()?;
            }
            tmp.persist(path).map_err(|e| e.error)?;
            return Ok(());
        }

        self.write_file(path)
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| EngineError::open(path, e))?;
        let mut writer = BufWriter::new(file);
        self.buffer.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    // --- Search ---

    pub fn find(&self, value: &FindValue, from: usize, options: &FindOptions) -> Option<Match> {
        search::find(self.buffer(), value, from, options, None)
    }

    pub fn find_cancellable(
        &self,
        value: &FindValue,
        from: usize,
        options: &FindOptions,
        cancel: &CancelToken,
    ) -> Option<Match> {
        search::find(self.buffer(), value, from, options, Some(cancel))
    }

    /// Replace the next match of `old` with `new` as one undo step
    pub fn find_replace(
        &mut self,
        old: &FindValue,
        new: &FindValue,
        from: usize,
        options: &FindOptions,
    ) -> Option<Match> {
        search::replace(self, old, new, from, options, None)
    }

    pub fn find_replace_cancellable(
        &mut self,
        old: &FindValue,
        new: &FindValue,
        from: usize,
        options: &FindOptions,
        cancel: &CancelToken,
    ) -> Option<Match> {
        search::replace(self, old, new, from, options, Some(cancel))
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::create()
    }
}
