/// Error types for the playground compilation pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlaygroundError>;

/// Request-level failures.
///
/// A module that fails to compile is not one of these: compiler diagnostics
/// travel as `BuildOutcome::Failed` and end up as a displayable diagnostic.
#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("Workspace I/O error on {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start compiler '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiling {module} timed out after {timeout_ms} ms")]
    Timeout { module: String, timeout_ms: u64 },

    #[error("Compile request was superseded by a newer one")]
    Superseded,

    #[error("Compile task failed: {0}")]
    Task(String),

    #[error("Invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl PlaygroundError {
    pub fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlaygroundError::Workspace {
            path: path.into(),
            source,
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PlaygroundError::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the request was dropped in favour of a newer one.
    pub fn is_superseded(&self) -> bool {
        matches!(self, PlaygroundError::Superseded)
    }
}
