//! # cmdbar Core
//!
//! Core library for the cmdbar interactive command console.
//! Provides the tokenizer, command registry, completion engine, history
//! navigation, transcript, the console state machine, and the backend
//! capability the console submits commands through.
//!
//! ## Architecture
//!
//! ```text
//! key events -> ConsoleSession -> ConsoleController::apply -> ConsoleState
//!                    |                    |-- Tokenizer
//!                    |                    |-- CompletionState
//!                    |                    +-- HistoryLog / TranscriptLog
//!                    +-- CommandBackend (HttpBackend | MockBackend)
//! ```

pub mod backend;
pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod registry;
pub mod session;
pub mod tokenizer;
pub mod transcript;

// Re-export commonly used types at the crate root.
pub use backend::{CommandBackend, ExecuteRequest, ExecuteResponse, HttpBackend, MockBackend};
pub use completion::{CompletionState, candidates_for};
pub use config::{ConsoleConfig, load_config, load_config_file};
pub use controller::{ConsoleController, ConsoleEvent, ConsoleState, InputMode, Transition};
pub use error::{BackendError, CmdbarError, ConfigError, Result};
pub use history::{HistoryLog, Recall};
pub use registry::{CommandListing, CommandRegistry, CommandSpec};
pub use session::{ConsoleSession, KeyOutcome};
pub use tokenizer::{Tokenizer, tokenize};
pub use transcript::{TranscriptEntry, TranscriptLog};
