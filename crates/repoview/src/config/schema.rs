use std::collections::BTreeMap;

use serde::Deserialize;

use crate::secrets::PasswordSource;

/// On-disk shape of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Forge used to expand `owner/name` and bare `name` shorthands.
    #[serde(default)]
    pub default_host: Option<String>,

    /// Credentials keyed by host (`host` or `host:port`).
    #[serde(default)]
    pub auth: BTreeMap<String, AuthEntry>,

    /// Repositories keyed by their unique name.
    #[serde(default)]
    pub repos: BTreeMap<String, RepoEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEntry {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_file: Option<String>,
    #[serde(default)]
    pub password_env_var: Option<String>,
}

impl AuthEntry {
    pub fn password_source(&self) -> PasswordSource<'_> {
        PasswordSource {
            direct: self.password.as_deref(),
            file: self.password_file.as_deref(),
            env_var: self.password_env_var.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoEntry {
    /// Bare name, `owner/name`, or a full URL.
    pub url: String,
    /// Browsable subtree of the clone.
    #[serde(default, alias = "subdirectory")]
    pub dir: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}
