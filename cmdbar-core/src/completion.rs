//! Prefix completion over command names, with Tab cycling.

use crate::registry::CommandRegistry;

/// Every registry name starting with `prefix`, in registry order.
///
/// An empty prefix yields every command name.
pub fn candidates_for(registry: &CommandRegistry, prefix: &str) -> Vec<String> {
    registry
        .names()
        .filter(|name| name.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

/// Candidate list plus the cycling cursor.
///
/// `cursor` is always a valid index while `candidates` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionState {
    candidates: Vec<String>,
    cursor: usize,
}

impl CompletionState {
    /// Start cycling `candidates` from the first entry.
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            cursor: 0,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Rewind the cursor without touching the candidate list.
    pub fn rewound(self) -> Self {
        Self { cursor: 0, ..self }
    }

    /// Return the candidate under the cursor and move the cursor forward,
    /// wrapping at the end. An empty list yields `None` and is left as is.
    pub fn advance(self) -> (Option<String>, Self) {
        if self.candidates.is_empty() {
            return (None, self);
        }
        let picked = self.candidates[self.cursor].clone();
        let cursor = (self.cursor + 1) % self.candidates.len();
        (Some(picked), Self { cursor, ..self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandSpec;

    fn registry() -> CommandRegistry {
        ["view.focus", "set", "save.file", "view.order", "save.har"]
            .into_iter()
            .map(CommandSpec::new)
            .collect()
    }

    #[test]
    fn test_empty_prefix_lists_everything_in_order() {
        assert_eq!(
            candidates_for(&registry(), ""),
            vec!["view.focus", "set", "save.file", "view.order", "save.har"]
        );
    }

    #[test]
    fn test_prefix_filter_keeps_registry_order() {
        assert_eq!(
            candidates_for(&registry(), "sa"),
            vec!["save.file", "save.har"]
        );
        assert_eq!(
            candidates_for(&registry(), "view."),
            vec!["view.focus", "view.order"]
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(candidates_for(&registry(), "zzz").is_empty());
    }

    #[test]
    fn test_advance_empty_is_none() {
        let (picked, state) = CompletionState::default().advance();
        assert!(picked.is_none());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_advance_cycles_and_wraps() {
        let state = CompletionState::new(candidates_for(&registry(), "save"));
        let (first, state) = state.advance();
        let (second, state) = state.advance();
        let (third, state) = state.advance();
        assert_eq!(first.as_deref(), Some("save.file"));
        assert_eq!(second.as_deref(), Some("save.har"));
        assert_eq!(third.as_deref(), Some("save.file"));
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn test_rewound_keeps_candidates() {
        let (_, state) = CompletionState::new(vec!["a".into(), "b".into()]).advance();
        let state = state.rewound();
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.candidates().len(), 2);
    }
}
