//! Helpers for keeping credentials out of log lines.
//!
//! Configured URLs are used verbatim when fully qualified, so a user may well
//! write `https://token@host/owner/repo`. Everything that logs a remote goes
//! through here first.

use url::Url;

/// Masks the userinfo part of a remote URL.
///
/// - `https://ghp_token@github.com/user/repo` → `https://****@github.com/user/repo`
/// - `https://github.com/user/repo` → unchanged
pub fn redact_url(url: &Url) -> String {
    if url.username().is_empty() && url.password().is_none() {
        return url.to_string();
    }

    let mut masked = url.clone();
    // Only fails for cannot-be-a-base URLs, which carry no userinfo anyway.
    if masked.set_password(None).is_err() || masked.set_username("****").is_err() {
        return url.to_string();
    }
    masked.to_string()
}

/// String form of [`redact_url`] for values that may not parse.
///
/// Only `scheme://` remotes are touched. In SSH-style `git@host:path` remotes
/// the `git@` user is not a secret.
pub fn redact_repo_url(raw: &str) -> String {
    let Some((scheme, rest)) = raw.split_once("://") else {
        return raw.to_string();
    };

    let authority = rest.split('/').next().unwrap_or_default();
    match authority.rfind('@') {
        Some(at) => format!("{}://****@{}", scheme, &rest[at + 1..]),
        None => raw.to_string(),
    }
}
