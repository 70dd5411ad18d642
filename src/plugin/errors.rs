//! Error types for plugin runs

use thiserror::Error;

/// Errors that can occur while preparing or running a build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// Preparing a file or directory on disk failed
    #[error("{context}: {error}")]
    Setup {
        /// What was being written or created when the failure happened.
        context: String,
        /// Error message describing the failure.
        error: String,
    },

    /// User configuration directory could not be resolved
    #[error("Could not resolve the user configuration directory")]
    NoConfigDir,

    /// Registry auth config is not valid JSON
    #[error("Invalid registry auth config: {0}")]
    InvalidAuthConfig(String),

    /// Registry login was rejected
    #[error("Error authenticating against {registry} (exit code {code})")]
    AuthFailed {
        /// Registry the login was attempted against.
        registry: String,
        /// Exit code returned by the login command.
        code: i32,
    },

    /// Step binary could not be started
    #[error("Could not start {step}: {error}")]
    Spawn {
        /// Label of the step that failed to start.
        step: String,
        /// Error message describing the failure.
        error: String,
    },

    /// Step exited with a non-zero status
    #[error("{step} failed with exit code {code}")]
    CommandFailed {
        /// Label of the step that failed.
        step: String,
        /// Exit code returned by the command.
        code: i32,
    },
}

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidAuthConfig(err.to_string())
    }
}

/// Result alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
