//! Submitted command history and the recall cursor.
//!
//! The log mirrors whatever list the backend reports after each execution.
//! The cursor lives in `[0, len]`; `len` means the operator is editing fresh
//! text rather than a recalled entry.

/// Append-only command history with a recall cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<String>,
    cursor: usize,
}

/// Result of a recall: the line to show (if any) and the new history state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recall {
    pub line: Option<String>,
    pub history: HistoryLog,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log holding `entries` with the cursor at `cursor`, clamped to the
    /// valid range.
    pub fn with_cursor(entries: Vec<String>, cursor: usize) -> Self {
        let cursor = cursor.min(entries.len());
        Self { entries, cursor }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push `line` onto the end of the log. The cursor is left where it is.
    pub fn append(mut self, line: impl Into<String>) -> Self {
        self.entries.push(line.into());
        self
    }

    /// Replace the whole log with the backend's authoritative list and step
    /// the cursor forward by one, clamped to the new length.
    pub fn replaced(self, entries: Vec<String>) -> Self {
        let cursor = self.cursor + 1;
        Self::with_cursor(entries, cursor)
    }

    /// Step back to the older entry. At the oldest entry this is a no-op.
    pub fn recall_previous(self) -> Recall {
        if self.cursor == 0 {
            return Recall {
                line: None,
                history: self,
            };
        }
        let cursor = self.cursor - 1;
        Recall {
            line: Some(self.entries[cursor].clone()),
            history: Self { cursor, ..self },
        }
    }

    /// Show the entry under the cursor, then step forward if a newer entry
    /// exists.
    ///
    /// The line is read before the cursor moves, so the first Down after an
    /// Up shows the same entry again. At `cursor == len` the newest entry is
    /// shown and the cursor stays put.
    pub fn recall_next(self) -> Recall {
        let Some(last) = self.entries.len().checked_sub(1) else {
            return Recall {
                line: None,
                history: self,
            };
        };
        let line = self.entries[self.cursor.min(last)].clone();
        let cursor = if self.cursor < last {
            self.cursor + 1
        } else {
            self.cursor
        };
        Recall {
            line: Some(line),
            history: Self { cursor, ..self },
        }
    }
}
