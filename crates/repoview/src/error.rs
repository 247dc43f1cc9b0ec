use std::path::PathBuf;
use thiserror::Error;

use crate::secrets::SecretError;
use crate::sync::SyncError;

#[derive(Error, Debug)]
pub enum RepoviewError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Language table error: {0}")]
    Languages(#[from] LanguageError),
}

/// Errors raised while loading the repository registry. Any of these aborts
/// the whole load; the caller keeps serving its previous registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Invalid repository name '{name}': {reason}")]
    InvalidRepoName { name: String, reason: String },

    #[error("Repository '{repo}' uses a bare name but no credential is configured for default host '{host}'")]
    MissingDefaultCredential { repo: String, host: String },

    #[error("Repository '{repo}' has an invalid URL '{url}': {source}")]
    InvalidUrl {
        repo: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Repository '{repo}' URL path cannot be mapped to local storage: {url}")]
    InvalidUrlPath { repo: String, url: String },

    #[error("Repository '{repo}' has an invalid subdirectory '{dir}'")]
    InvalidSubdirectory { repo: String, dir: String },

    #[error("Credential for host '{host}': {source}")]
    Secret {
        host: String,
        #[source]
        source: SecretError,
    },
}

/// Errors raised while resolving a request path.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Unknown repository, nonexistent path, or a path outside the confined root.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to access '{path}': {source}")]
    Internal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum LanguageError {
    #[error("Failed to read language table '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse language table JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RepoviewError>;
