//! Row edit log for goods table synthesis
//!
//! Every structural mutation of a table is recorded here in order, so the final
//! position of any pre-mutation row can be recomputed by replaying the log.

use serde::{Deserialize, Serialize};

pub type EditId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RowEdit {
    /// Rows `start..start + count` removed.
    DeleteRange { id: EditId, start: usize, count: usize },
    /// A row inserted so that it now sits at index `at`.
    InsertBefore { id: EditId, at: usize },
    /// A row appended at index `at`, after every existing row.
    Append { id: EditId, at: usize },
    /// A single row removed.
    Delete { id: EditId, row: usize },
}

impl RowEdit {
    pub fn id(&self) -> EditId {
        match self {
            RowEdit::DeleteRange { id, .. } => *id,
            RowEdit::InsertBefore { id, .. } => *id,
            RowEdit::Append { id, .. } => *id,
            RowEdit::Delete { id, .. } => *id,
        }
    }

    /// Change in row count caused by this edit.
    pub fn delta(&self) -> isize {
        match self {
            RowEdit::DeleteRange { count, .. } => -(*count as isize),
            RowEdit::InsertBefore { .. } | RowEdit::Append { .. } => 1,
            RowEdit::Delete { .. } => -1,
        }
    }

    /// Where a row at `pos` before this edit ends up after it. `None` when removed.
    fn apply(&self, pos: usize) -> Option<usize> {
        match *self {
            RowEdit::DeleteRange { start, count, .. } => {
                if pos < start {
                    Some(pos)
                } else if pos < start + count {
                    None
                } else {
                    Some(pos - count)
                }
            }
            RowEdit::InsertBefore { at, .. } => Some(if pos >= at { pos + 1 } else { pos }),
            RowEdit::Append { .. } => Some(pos),
            RowEdit::Delete { row, .. } => match pos.cmp(&row) {
                std::cmp::Ordering::Less => Some(pos),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(pos - 1),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowEditLog {
    next_id: EditId,
    edits: Vec<RowEdit>,
}

impl RowEditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut edit: RowEdit) -> EditId {
        let id = self.next_id;
        self.next_id += 1;

        match &mut edit {
            RowEdit::DeleteRange { id: edit_id, .. } => *edit_id = id,
            RowEdit::InsertBefore { id: edit_id, .. } => *edit_id = id,
            RowEdit::Append { id: edit_id, .. } => *edit_id = id,
            RowEdit::Delete { id: edit_id, .. } => *edit_id = id,
        }

        self.edits.push(edit);
        id
    }

    pub fn edits(&self) -> &[RowEdit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn inserted(&self) -> usize {
        self.edits
            .iter()
            .filter(|e| matches!(e, RowEdit::InsertBefore { .. } | RowEdit::Append { .. }))
            .count()
    }

    pub fn deleted(&self) -> usize {
        self.edits
            .iter()
            .map(|e| match e {
                RowEdit::DeleteRange { count, .. } => *count,
                RowEdit::Delete { .. } => 1,
                _ => 0,
            })
            .sum()
    }

    /// Total change in row count: inserted minus deleted.
    pub fn net_shift(&self) -> isize {
        self.edits.iter().map(RowEdit::delta).sum()
    }

    /// Position after every logged edit of the row originally at `original`.
    pub fn translate(&self, original: usize) -> Option<usize> {
        self.edits
            .iter()
            .try_fold(original, |pos, edit| edit.apply(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_row_edit_log_new_is_empty() {
        let log = RowEditLog::new();
        assert!(log.is_empty());
        assert_eq!(log.net_shift(), 0);
        assert_eq!(log.translate(4), Some(4));
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut log = RowEditLog::new();
        let first = log.add(RowEdit::InsertBefore { id: 99, at: 2 });
        let second = log.add(RowEdit::Delete { id: 99, row: 1 });
        assert_eq!((first, second), (0, 1));
        assert_eq!(log.edits()[1].id(), 1);
    }

    #[test]
    fn test_synthesis_sequence_shift() {
        // header 0, sample 1, stale rows 2..=3, totals at 4 and 5
        let mut log = RowEditLog::new();
        log.add(RowEdit::DeleteRange { id: 0, start: 2, count: 2 });
        for at in 2..5 {
            log.add(RowEdit::InsertBefore { id: 0, at });
        }
        log.add(RowEdit::Delete { id: 0, row: 1 });

        assert_eq!(log.inserted(), 3);
        assert_eq!(log.deleted(), 3);
        assert_eq!(log.net_shift(), 0);
        assert_eq!(log.translate(4), Some(4));
        assert_eq!(log.translate(5), Some(5));
        assert_eq!(log.translate(0), Some(0));
        assert_eq!(log.translate(1), None);
        assert_eq!(log.translate(3), None);
    }

    #[test]
    fn test_append_leaves_existing_rows() {
        let mut log = RowEditLog::new();
        log.add(RowEdit::Append { id: 0, at: 3 });
        log.add(RowEdit::Append { id: 0, at: 4 });
        log.add(RowEdit::Delete { id: 0, row: 2 });
        assert_eq!(log.translate(1), Some(1));
        assert_eq!(log.net_shift(), 1);
    }

    #[test]
    fn test_json_tagged_format() {
        let mut log = RowEditLog::new();
        log.add(RowEdit::Delete { id: 0, row: 7 });
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains(r#""type":"Delete""#));
        let restored: RowEditLog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, log);
    }
}
