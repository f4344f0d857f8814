//! Console state machine.
//!
//! [`ConsoleState`] is a plain value; [`ConsoleController::apply`] consumes it
//! together with one [`ConsoleEvent`] and returns the next state plus any
//! command that must be dispatched to the backend. Nothing here performs I/O,
//! so every transition can be tested without a terminal or a network.

use std::sync::Arc;
use tracing::debug;

use crate::backend::ExecuteResponse;
use crate::completion::{CompletionState, candidates_for};
use crate::history::{HistoryLog, Recall};
use crate::registry::CommandRegistry;
use crate::tokenizer::Tokenizer;
use crate::transcript::TranscriptLog;

/// Input events the console reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// The operator changed the input text.
    TextEdited(String),
    /// A key was released; refresh help and the displayed candidates.
    KeyRelease,
    /// Enter.
    Submit,
    /// Up arrow.
    RecallUp,
    /// Down arrow.
    RecallDown,
    /// Tab.
    CycleCompletion,
}

/// Whether the input holds typed text or a recalled history entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Editing,
    Recalling,
}

/// Everything the console shows and remembers between events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleState {
    input: String,
    /// Input as of the last genuine edit; completion filters on this.
    anchor: String,
    mode: InputMode,
    /// Candidates Tab cycles through, captured from the anchor.
    completion: CompletionState,
    /// Candidates filtered by the live first token, for display.
    available: Vec<String>,
    /// `[command, declared args...]` for the command being typed.
    declared_args: Vec<String>,
    current_arg: usize,
    signature_help: Option<String>,
    description: Option<String>,
    history: HistoryLog,
    transcript: TranscriptLog,
}

impl ConsoleState {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// The list Tab cycles through.
    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    /// Candidate names currently shown to the operator.
    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn declared_args(&self) -> &[String] {
        &self.declared_args
    }

    /// Index into [`declared_args`](Self::declared_args) of the token being typed.
    pub fn current_arg(&self) -> usize {
        self.current_arg
    }

    pub fn signature_help(&self) -> Option<&str> {
        self.signature_help.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    fn set_input(&mut self, text: String) {
        self.anchor.clone_from(&text);
        self.input = text;
    }
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConsoleState,
    /// Command line to send to the backend, set only by `Submit`.
    pub dispatch: Option<String>,
    /// The key's default platform behaviour should be suppressed (Tab).
    pub suppress_default: bool,
}

impl Transition {
    fn stay(state: ConsoleState) -> Self {
        Self {
            state,
            dispatch: None,
            suppress_default: false,
        }
    }
}

/// Applies events to [`ConsoleState`] against a fixed registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct ConsoleController {
    registry: Arc<CommandRegistry>,
    tokenizer: Tokenizer,
}

impl ConsoleController {
    pub fn new(registry: Arc<CommandRegistry>, tokenizer: Tokenizer) -> Self {
        Self {
            registry,
            tokenizer,
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Swap in a freshly fetched registry and re-derive both candidate lists
    /// from the current input.
    pub fn install_registry(
        &mut self,
        registry: Arc<CommandRegistry>,
        mut state: ConsoleState,
    ) -> ConsoleState {
        self.registry = registry;
        state.available = self.candidates_for_line(&state.input);
        state.completion = CompletionState::new(self.candidates_for_line(&state.anchor));
        state
    }

    /// A fresh state seeded with every command name.
    pub fn initial_state(&self) -> ConsoleState {
        let all = candidates_for(&self.registry, "");
        ConsoleState {
            available: all.clone(),
            completion: CompletionState::new(all),
            ..Default::default()
        }
    }

    /// Apply one event.
    pub fn apply(&self, mut state: ConsoleState, event: ConsoleEvent) -> Transition {
        debug!(?event, input = %state.input, "Applying console event");
        match event {
            ConsoleEvent::TextEdited(text) => Transition::stay(self.text_edited(state, text)),
            ConsoleEvent::KeyRelease => Transition::stay(self.key_release(state)),
            ConsoleEvent::Submit => self.submit(state),
            ConsoleEvent::RecallUp => {
                let recall = std::mem::take(&mut state.history).recall_previous();
                Transition::stay(Self::recalled(state, recall))
            }
            ConsoleEvent::RecallDown => {
                let recall = std::mem::take(&mut state.history).recall_next();
                Transition::stay(Self::recalled(state, recall))
            }
            ConsoleEvent::CycleCompletion => {
                let (picked, completion) = std::mem::take(&mut state.completion).advance();
                state.completion = completion;
                if let Some(name) = picked {
                    state.input = name;
                }
                Transition {
                    state,
                    dispatch: None,
                    suppress_default: true,
                }
            }
        }
    }

    /// Merge a backend reply for `command` into the state.
    pub fn merge_response(
        &self,
        mut state: ConsoleState,
        command: &str,
        response: ExecuteResponse,
    ) -> ConsoleState {
        let entry = state
            .transcript
            .push(command, response.serialized_result());
        debug!(id = entry.id, command, "Recorded transcript entry");
        state.history = std::mem::take(&mut state.history).replaced(response.history);
        state.declared_args.clear();
        state.current_arg = 0;
        state
    }

    fn text_edited(&self, mut state: ConsoleState, text: String) -> ConsoleState {
        state.set_input(text);
        state.mode = InputMode::Editing;
        state.completion = CompletionState::new(self.candidates_for_line(&state.anchor));
        state.available = self.candidates_for_line(&state.input);
        state
    }

    fn key_release(&self, mut state: ConsoleState) -> ConsoleState {
        let tokens = self.tokenizer.tokenize(&state.input);
        let name = tokens.first().map(String::as_str).unwrap_or("");
        let spec = self.registry.spec(name);

        state.signature_help = spec.and_then(|s| s.signature_help.clone());
        state.description = spec.and_then(|s| s.description.clone());
        state.available = candidates_for(&self.registry, name);

        let fallback = self.candidates_for_line(&state.anchor);
        if fallback != state.completion.candidates() {
            state.completion = CompletionState::new(fallback);
        }

        match spec {
            Some(spec) => {
                state.declared_args = std::iter::once(name.to_string())
                    .chain(spec.argument_names.iter().cloned())
                    .collect();
                state.current_arg = tokens.len().saturating_sub(1);
            }
            None => {
                state.declared_args.clear();
                state.current_arg = 0;
            }
        }
        state
    }

    fn submit(&self, mut state: ConsoleState) -> Transition {
        let command = std::mem::take(&mut state.input);
        debug!(command = %command, "Submitting command");
        state.anchor.clear();
        state.mode = InputMode::Editing;
        state.signature_help = None;
        state.description = None;
        let all = candidates_for(&self.registry, "");
        state.available = all.clone();
        state.completion = CompletionState::new(all);
        Transition {
            state,
            dispatch: Some(command),
            suppress_default: false,
        }
    }

    fn recalled(mut state: ConsoleState, recall: Recall) -> ConsoleState {
        state.history = recall.history;
        if let Some(line) = recall.line {
            state.set_input(line);
            state.mode = InputMode::Recalling;
        }
        state
    }

    fn candidates_for_line(&self, line: &str) -> Vec<String> {
        candidates_for(&self.registry, &self.tokenizer.command_name(line))
    }
}
