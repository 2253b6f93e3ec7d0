//! Bounded snapshot history with an undo/redo cursor.

use crate::cell::Cell;
use crate::connection::Connection;

/// Maximum number of history snapshots to keep.
pub const MAX_HISTORY: usize = 100;

/// An immutable deep copy of cells and connections at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub cells: Vec<Cell>,
    pub connections: Vec<Connection>,
}

/// Ordered snapshot list plus a cursor pointing at the current state.
///
/// The cursor always addresses a valid snapshot; pushing past the cap
/// evicts the oldest entry, pushing while undone truncates the redo branch.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: usize,
}

impl History {
    /// Start a history at the given initial state.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// Push a snapshot at the transaction boundary of a completed gesture.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > MAX_HISTORY {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Move the cursor back one snapshot. No-op at the start.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Move the cursor forward one snapshot. No-op at the end.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Drop everything and restart at a new initial state.
    pub fn reset(&mut self, initial: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn snapshot(cell_count: usize) -> Snapshot {
        Snapshot {
            cells: (0..cell_count)
                .map(|i| Cell::new(Point::new(i as f64 * 10.0, 0.0), 100.0, 50.0))
                .collect(),
            connections: Vec::new(),
        }
    }

    #[test]
    fn test_empty_history_has_no_undo() {
        let mut history = History::new(snapshot(0));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_cursor() {
        let mut history = History::new(snapshot(0));
        history.push(snapshot(1));
        history.push(snapshot(2));

        assert_eq!(history.undo().unwrap().cells.len(), 1);
        assert_eq!(history.undo().unwrap().cells.len(), 0);
        assert!(history.undo().is_none());

        assert_eq!(history.redo().unwrap().cells.len(), 1);
        assert_eq!(history.redo().unwrap().cells.len(), 2);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_push_truncates_redo_branch() {
        let mut history = History::new(snapshot(0));
        history.push(snapshot(1));
        history.push(snapshot(2));
        history.undo();
        history.undo();
        assert!(history.can_redo());

        history.push(snapshot(3));
        assert!(!history.can_redo());
        assert_eq!(history.undo().unwrap().cells.len(), 0);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = History::new(snapshot(0));
        for i in 1..=MAX_HISTORY + 10 {
            history.push(snapshot(i));
        }
        assert_eq!(history.len(), MAX_HISTORY);

        // Walk all the way back: the oldest surviving snapshot is not the
        // initial one.
        let mut last = 0;
        while let Some(s) = history.undo() {
            last = s.cells.len();
        }
        assert_eq!(last, 11);
    }
}
