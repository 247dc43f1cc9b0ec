//! Password resolution for host credentials.
//!
//! A credential's password can be given in three ways, checked in this order:
//!
//! 1. **Direct value** - `password: "hunter2"` in the config file
//! 2. **File reference** - `passwordFile: /run/secrets/github` (Docker secrets)
//! 3. **Env var reference** - `passwordEnvVar: GITHUB_TOKEN`

use secrecy::SecretString;
use std::fs;

/// Error type for password resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No password source provided (need one of: password, passwordFile, passwordEnvVar)")]
    NoSourceProvided,

    #[error("Failed to read password from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Result type for password resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a credential's password comes from. Empty strings count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordSource<'a> {
    pub direct: Option<&'a str>,
    pub file: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl PasswordSource<'_> {
    /// True when no source is configured at all.
    pub fn is_empty(&self) -> bool {
        [self.direct, self.file, self.env_var]
            .iter()
            .all(|s| s.is_none_or(str::is_empty))
    }
}

/// Resolves a password from the first configured source.
///
/// File contents and env var values are trimmed, since both tend to carry a
/// trailing newline.
pub fn resolve_password(source: PasswordSource<'_>) -> Result<SecretString> {
    if let Some(value) = source.direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = source.file.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return match fs::read_to_string(&expanded) {
            Ok(content) => Ok(SecretString::from(content.trim().to_string())),
            Err(e) => Err(SecretError::FileReadError {
                path: expanded,
                source: e,
            }),
        };
    }

    if let Some(name) = source.env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Like [`resolve_password`], but a credential with no password at all is
/// allowed and resolves to an empty secret. Some forges accept a token as the
/// username with an empty password.
pub fn resolve_password_or_empty(source: PasswordSource<'_>) -> Result<SecretString> {
    match resolve_password(source) {
        Err(SecretError::NoSourceProvided) => Ok(SecretString::from(String::new())),
        other => other,
    }
}

/// Expands a leading `~` to the home directory (`HOME`, then `USERPROFILE`).
///
/// `~user/path` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
