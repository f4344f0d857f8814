//! Append-only transcript of executed commands and their results.

use serde::{Deserialize, Serialize};

/// One executed command and its serialized result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Equals the transcript length at the time of insertion.
    pub id: usize,
    pub command: String,
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; its id is the number of entries already present.
    pub fn push(
        &mut self,
        command: impl Into<String>,
        result: impl Into<String>,
    ) -> &TranscriptEntry {
        let id = self.entries.len();
        self.entries.push(TranscriptEntry {
            id,
            command: command.into(),
            result: result.into(),
        });
        &self.entries[id]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
