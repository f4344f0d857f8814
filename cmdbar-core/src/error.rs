//! Error types for the cmdbar console core.
//!
//! Uses `thiserror` for public API error types. Lookup misses, empty candidate
//! sets and malformed quoting are not errors at all: they degrade to "no help"
//! or "no completion". Only the backend transport and configuration can fail.

use std::path::PathBuf;

/// Top-level error type for the cmdbar core library.
#[derive(Debug, thiserror::Error)]
pub enum CmdbarError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the command backend (registry fetch and command execution).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("Backend returned HTTP {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Backend connection failed: {message}")]
    Connection { message: String },

    #[error("Request for '{command}' was cancelled")]
    Cancelled { command: String },

    #[error("Request for '{command}' ended without a reply")]
    Aborted { command: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `CmdbarError`.
pub type Result<T> = std::result::Result<T, CmdbarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_backend_status() {
        let err = CmdbarError::Backend(BackendError::Status {
            endpoint: "POST /commands".into(),
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(
            err.to_string(),
            "Backend error: Backend returned HTTP 500 for POST /commands: boom"
        );
    }

    #[test]
    fn test_error_display_cancelled() {
        let err = BackendError::Cancelled {
            command: "set x y".into(),
        };
        assert_eq!(err.to_string(), "Request for 'set x y' was cancelled");
    }

    #[test]
    fn test_error_display_config() {
        let err = CmdbarError::Config(ConfigError::Invalid {
            message: "backend.base_url must not be empty".into(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration: backend.base_url must not be empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CmdbarError = io_err.into();
        assert!(matches!(err, CmdbarError::Io(_)));
    }

    #[test]
    fn test_error_display_aborted() {
        let err = CmdbarError::from(BackendError::Aborted {
            command: "help".into(),
        });
        assert_eq!(
            err.to_string(),
            "Backend error: Request for 'help' ended without a reply"
        );
    }
}
