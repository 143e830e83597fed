use super::{DataChange, EditCommand};
use crate::buffer::ByteBuffer;
use crate::changes::ChangeSet;

/// A group of commands that are undone/redone together
#[derive(Debug, Clone)]
pub struct EditGroup {
    commands: Vec<EditCommand>,
}

impl EditGroup {
    fn new(commands: Vec<EditCommand>) -> Self {
        Self { commands }
    }

    fn changes_after(&self) -> Option<&ChangeSet> {
        self.commands.last().map(EditCommand::changes_after)
    }

    fn apply(&mut self, buffer: &mut dyn ByteBuffer) -> Vec<DataChange> {
        self.commands
            .iter_mut()
            .map(|cmd| cmd.redo(buffer))
            .collect()
    }

    fn apply_reverse(&mut self, buffer: &mut dyn ByteBuffer) -> Vec<DataChange> {
        self.commands
            .iter_mut()
            .rev()
            .map(|cmd| cmd.undo(buffer))
            .collect()
    }
}

/// Linear undo/redo history.
///
/// `groups[..cursor]` are applied, `groups[cursor..]` are redoable. Pushing
/// while redoable groups exist discards them. The clean marker remembers the
/// cursor position of the last save.
#[derive(Debug)]
pub struct UndoStack {
    groups: Vec<EditGroup>,
    cursor: usize,
    /// Cursor position matching the saved file, if still reachable
    clean: Option<usize>,
    /// Annotations in effect at cursor 0 (non-empty once old groups are dropped)
    base: ChangeSet,
    /// Commands collected between `begin_group` and `end_group`
    open_group: Option<Vec<EditCommand>>,
    /// Maximum number of undo levels
    max_size: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_limit(1000)
    }

    pub fn with_limit(max_size: usize) -> Self {
        Self {
            groups: Vec::new(),
            cursor: 0,
            clean: Some(0),
            base: ChangeSet::new(),
            open_group: None,
            max_size: max_size.max(1),
        }
    }

    /// Apply `command` to `buffer` and record it.
    pub fn push(&mut self, mut command: EditCommand, buffer: &mut dyn ByteBuffer) -> DataChange {
        let change = command.redo(buffer);
        self.truncate_redo();

        if let Some(open) = self.open_group.as_mut() {
            open.push(command);
            return change;
        }

        self.groups.push(EditGroup::new(vec![command]));
        self.cursor += 1;
        self.enforce_limit();
        change
    }

    /// Start collecting commands into a single undo step
    pub fn begin_group(&mut self) {
        if self.open_group.is_none() {
            self.open_group = Some(Vec::new());
        }
    }

    /// Commit the commands collected since `begin_group`
    pub fn end_group(&mut self) {
        let Some(commands) = self.open_group.take() else {
            return;
        };
        if commands.is_empty() {
            return;
        }

        self.truncate_redo();
        self.groups.push(EditGroup::new(commands));
        self.cursor += 1;
        self.enforce_limit();
    }

    fn truncate_redo(&mut self) {
        if self.cursor < self.groups.len() {
            self.groups.truncate(self.cursor);
            if self.clean.is_some_and(|c| c > self.cursor) {
                self.clean = None;
            }
        }
    }

    fn enforce_limit(&mut self) {
        while self.groups.len() > self.max_size {
            let dropped = self.groups.remove(0);
            if let Some(changes) = dropped.changes_after() {
                self.base = changes.clone();
            }
            self.cursor -= 1;
            self.clean = match self.clean {
                Some(0) | None => None,
                Some(c) => Some(c - 1),
            };
        }
    }

    /// Undo the last applied group
    pub fn undo(&mut self, buffer: &mut dyn ByteBuffer) -> Option<Vec<DataChange>> {
        self.end_group();
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.groups[self.cursor].apply_reverse(buffer))
    }

    /// Redo the next undone group
    pub fn redo(&mut self, buffer: &mut dyn ByteBuffer) -> Option<Vec<DataChange>> {
        self.end_group();
        if self.cursor >= self.groups.len() {
            return None;
        }
        let changes = self.groups[self.cursor].apply(buffer);
        self.cursor += 1;
        Some(changes)
    }

    /// Annotations that belong to the current cursor position
    pub fn current_changes(&self) -> &ChangeSet {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.groups[idx].changes_after())
            .unwrap_or(&self.base)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 || self.open_group.as_ref().is_some_and(|g| !g.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.groups.len()
    }

    /// Get the number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    pub fn is_clean(&self) -> bool {
        self.clean == Some(self.cursor) && self.open_group.as_ref().map_or(true, Vec::is_empty)
    }

    /// Mark the current position as matching the saved state
    pub fn set_clean(&mut self) {
        self.end_group();
        self.clean = Some(self.cursor);
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.groups.clear();
        self.cursor = 0;
        self.clean = Some(0);
        self.base = ChangeSet::new();
        self.open_group = None;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    fn insert(offset: usize, data: &[u8]) -> EditCommand {
        EditCommand::insert(offset, data.to_vec(), ChangeSet::new())
    }

    #[test]
    fn test_undo_redo_cursor() {
        let mut buffer = MemoryBuffer::new();
        let mut stack = UndoStack::new();
        stack.push(insert(0, b"ab"), &mut buffer);
        stack.push(insert(2, b"cd"), &mut buffer);
        assert_eq!(buffer.as_bytes(), b"abcd");

        assert!(stack.undo(&mut buffer).is_some());
        assert_eq!(buffer.as_bytes(), b"ab");
        assert!(stack.can_undo());
        assert!(stack.can_redo());

        assert!(stack.redo(&mut buffer).is_some());
        assert_eq!(buffer.as_bytes(), b"abcd");
        assert!(!stack.can_redo());
        assert!(stack.redo(&mut buffer).is_none());
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut buffer = MemoryBuffer::new();
        let mut stack = UndoStack::new();
        stack.push(insert(0, b"ab"), &mut buffer);
        stack.push(insert(2, b"cd"), &mut buffer);
        stack.undo(&mut buffer);
        stack.push(insert(2, b"XY"), &mut buffer);

        assert!(!stack.can_redo());
        assert_eq!(stack.undo_count(), 2);
        assert_eq!(buffer.as_bytes(), b"abXY");
    }

    #[test]
    fn test_group_undoes_in_one_step() {
        let mut buffer = MemoryBuffer::from_bytes(b"hello".to_vec());
        let mut stack = UndoStack::new();
        stack.begin_group();
        stack.push(EditCommand::remove(0, 5, ChangeSet::new()), &mut buffer);
        stack.push(insert(0, b"world!"), &mut buffer);
        stack.end_group();

        assert_eq!(buffer.as_bytes(), b"world!");
        assert_eq!(stack.undo_count(), 1);
        stack.undo(&mut buffer);
        assert_eq!(buffer.as_bytes(), b"hello");
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_clean_marker() {
        let mut buffer = MemoryBuffer::new();
        let mut stack = UndoStack::new();
        assert!(stack.is_clean());

        stack.push(insert(0, b"a"), &mut buffer);
        assert!(!stack.is_clean());
        stack.set_clean();
        assert!(stack.is_clean());

        stack.undo(&mut buffer);
        assert!(!stack.is_clean());
        stack.redo(&mut buffer);
        assert!(stack.is_clean());

        // Branching away from the saved state makes it unreachable.
        stack.undo(&mut buffer);
        stack.push(insert(0, b"b"), &mut buffer);
        stack.undo(&mut buffer);
        stack.redo(&mut buffer);
        assert!(!stack.is_clean());
    }

    #[test]
    fn test_limit_moves_snapshot_into_base() {
        let mut buffer = MemoryBuffer::new();
        let mut stack = UndoStack::with_limit(2);
        let mut marked = ChangeSet::new();
        marked.record_insert(0, 1);

        stack.push(EditCommand::insert(0, b"a".to_vec(), marked.clone()), &mut buffer);
        stack.push(insert(1, b"b"), &mut buffer);
        stack.push(insert(2, b"c"), &mut buffer);
        assert_eq!(stack.undo_count(), 2);

        stack.undo(&mut buffer);
        stack.undo(&mut buffer);
        assert!(stack.undo(&mut buffer).is_none());
        assert_eq!(buffer.as_bytes(), b"a");
        assert_eq!(stack.current_changes(), &marked);
    }
}
