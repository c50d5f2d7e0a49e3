//! Error types for recipe operations.
//!
//! Errors never cross [`Provisioner::run`](crate::Provisioner::run). The run
//! loop turns them into printed diagnostics and a [`StepOutcome`](crate::StepOutcome).

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for recipe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while executing a step.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command could not be started at all.
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// Display form of the command.
        command: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The metadata endpoint did not answer in time.
    #[error("metadata request timed out after {}s", after.as_secs())]
    Timeout {
        /// Configured timeout.
        after: Duration,
    },

    /// The metadata endpoint answered with an error or could not be reached.
    #[error("metadata request failed: {message}")]
    Metadata {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// A response or input that does not have the expected shape.
    #[error("{0}")]
    Invalid(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a spawn error for a command.
    pub fn spawn(command: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a metadata error.
    pub fn metadata(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Metadata {
            message: message.into(),
            status,
        }
    }

    /// Whether the underlying cause is a permission problem.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Spawn { source, .. } | Self::Io { source, .. } => {
                source.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}
