//! Async console session.
//!
//! Owns the [`ConsoleState`] and drives it from one task. Key events are
//! applied synchronously; each submission is spawned as its own request and
//! its reply comes back over a channel. Replies are merged one at a time in
//! the order they arrive, which is not necessarily submission order. Nothing
//! is cancelled unless [`ConsoleSession::cancel_pending`] is called. Every
//! dispatched command reports back exactly once, even when its task panics.
//!
//! Dispatching spawns onto the ambient tokio runtime, so [`ConsoleSession::handle`]
//! must be called from within one.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{CommandBackend, ExecuteResponse};
use crate::controller::{ConsoleController, ConsoleEvent, ConsoleState};
use crate::error::BackendError;
use crate::registry::CommandRegistry;
use crate::tokenizer::Tokenizer;
use crate::transcript::TranscriptEntry;

/// What the caller should do with the key that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Suppress the key's default platform behaviour (focus change on Tab).
    pub suppress_default: bool,
    /// A command was handed to the backend.
    pub dispatched: bool,
}

/// A finished backend request waiting to be merged.
#[derive(Debug)]
struct Completed {
    command: String,
    outcome: Result<ExecuteResponse, BackendError>,
}

/// Reports exactly once per dispatched command. If the request task dies
/// before replying, dropping the guard reports [`BackendError::Aborted`].
struct ReplyGuard {
    command: String,
    tx: mpsc::UnboundedSender<Completed>,
    replied: bool,
}

impl ReplyGuard {
    fn reply(mut self, outcome: Result<ExecuteResponse, BackendError>) {
        self.replied = true;
        let command = std::mem::take(&mut self.command);
        // The receiver only goes away with the session itself.
        let _ = self.tx.send(Completed { command, outcome });
    }
}

impl Drop for ReplyGuard {
    fn drop(&mut self) {
        if self.replied {
            return;
        }
        let command = std::mem::take(&mut self.command);
        warn!(command = %command, "Command task ended without a reply");
        let _ = self.tx.send(Completed {
            outcome: Err(BackendError::Aborted {
                command: command.clone(),
            }),
            command,
        });
    }
}

pub struct ConsoleSession {
    backend: Arc<dyn CommandBackend>,
    controller: ConsoleController,
    state: ConsoleState,
    completed_tx: mpsc::UnboundedSender<Completed>,
    completed_rx: mpsc::UnboundedReceiver<Completed>,
    cancellation: CancellationToken,
    in_flight: usize,
}

impl ConsoleSession {
    /// Create a session with an empty registry. Call [`activate`](Self::activate)
    /// to fetch the real one.
    pub fn new(backend: Arc<dyn CommandBackend>, tokenizer: Tokenizer) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        let controller = ConsoleController::new(Arc::new(CommandRegistry::new()), tokenizer);
        let state = controller.initial_state();
        Self {
            backend,
            controller,
            state,
            completed_tx,
            completed_rx,
            cancellation: CancellationToken::new(),
            in_flight: 0,
        }
    }

    /// Fetch the command registry and seed the candidate lists with it.
    ///
    /// On failure the previous registry stays in place and the error is
    /// returned to the caller.
    pub async fn activate(&mut self) -> Result<(), BackendError> {
        let registry = self.backend.list_commands().await.inspect_err(|e| {
            warn!(error = %e, "Failed to fetch command registry");
        })?;
        info!(commands = registry.len(), "Command registry loaded");
        self.install_registry(Arc::new(registry));
        Ok(())
    }

    /// Replace the registry wholesale. Readers holding the old `Arc` keep a
    /// consistent snapshot.
    pub fn install_registry(&mut self, registry: Arc<CommandRegistry>) {
        let state = std::mem::take(&mut self.state);
        self.state = self.controller.install_registry(registry, state);
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(self.controller.registry())
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.controller.tokenizer()
    }

    /// Number of submissions still waiting to be merged.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply one key event. A submission is spawned before this returns.
    pub fn handle(&mut self, event: ConsoleEvent) -> KeyOutcome {
        let state = std::mem::take(&mut self.state);
        let transition = self.controller.apply(state, event);
        self.state = transition.state;

        let dispatched = match transition.dispatch {
            Some(command) => {
                self.dispatch(command);
                true
            }
            None => false,
        };
        KeyOutcome {
            suppress_default: transition.suppress_default,
            dispatched,
        }
    }

    fn dispatch(&mut self, command: String) {
        debug!(command = %command, in_flight = self.in_flight, "Dispatching command");
        let backend = Arc::clone(&self.backend);
        let token = self.cancellation.clone();
        let guard = ReplyGuard {
            command,
            tx: self.completed_tx.clone(),
            replied: false,
        };
        self.in_flight += 1;

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(BackendError::Cancelled {
                    command: guard.command.clone(),
                }),
                result = backend.execute(&guard.command) => result,
            };
            guard.reply(outcome);
        });
    }

    /// Wait for the next reply and merge it.
    ///
    /// Returns `None` when nothing is in flight. A transport failure is
    /// returned as `Some(Err(_))`; the input field is not restored.
    pub async fn next_response(&mut self) -> Option<Result<TranscriptEntry, BackendError>> {
        if self.in_flight == 0 {
            return None;
        }
        let completed = self.completed_rx.recv().await?;
        Some(self.merge(completed))
    }

    /// Abort every outstanding request. Each one still reports back, as
    /// [`BackendError::Cancelled`]. Later submissions are unaffected.
    pub fn cancel_pending(&mut self) {
        if self.in_flight > 0 {
            info!(in_flight = self.in_flight, "Cancelling pending commands");
        }
        self.cancellation.cancel();
        self.cancellation = CancellationToken::new();
    }

    fn merge(&mut self, completed: Completed) -> Result<TranscriptEntry, BackendError> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completed { command, outcome } = completed;
        match outcome {
            Ok(response) => {
                let state = std::mem::take(&mut self.state);
                self.state = self.controller.merge_response(state, &command, response);
                let entry = self
                    .state
                    .transcript()
                    .last()
                    .cloned()
                    .ok_or(BackendError::ResponseParse {
                        message: "transcript entry missing after merge".into(),
                    })?;
                debug!(id = entry.id, command = %entry.command, "Merged command result");
                Ok(entry)
            }
            Err(e) => {
                warn!(command = %command, error = %e, "Command execution failed");
                Err(e)
            }
        }
    }
}
