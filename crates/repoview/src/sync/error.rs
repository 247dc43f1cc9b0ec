//! Errors from cloning or updating a single repository.

use std::path::PathBuf;
use thiserror::Error;

/// A per-repository sync failure. These are logged and reported, never
/// propagated past the repository they belong to.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to run git: {0}")]
    Spawn(String),

    #[error("Git {operation} failed: {message}")]
    GitOperation {
        operation: &'static str,
        message: String,
    },

    #[error("Git network error during {operation}: {message}")]
    Network {
        operation: &'static str,
        message: String,
    },

    #[error("Git authentication failed during {operation}: {message}")]
    AuthFailed {
        operation: &'static str,
        message: String,
    },

    #[error("Git {operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("Git {operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("Failed to prepare local storage '{path}': {source}")]
    LocalStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set up git credentials: {0}")]
    Askpass(String),
}

impl SyncError {
    /// True for failures caused by shutdown rather than by the repository.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled { .. })
    }
}

/// Classifies git's stderr into a more specific error variant.
pub fn classify_git_error(operation: &'static str, stderr: &str) -> SyncError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    if lower.contains("could not resolve host")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("network is unreachable")
        || lower.contains("unable to access")
        || lower.contains("failed to connect")
        || lower.contains("couldn't connect to server")
        || lower.contains("the remote end hung up unexpectedly")
    {
        return SyncError::Network { operation, message };
    }

    if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("invalid credentials")
        || lower.contains("could not read username")
        || lower.contains("could not read password")
    {
        return SyncError::AuthFailed { operation, message };
    }

    SyncError::GitOperation { operation, message }
}
