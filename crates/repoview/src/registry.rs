//! The repository registry and its shared, swappable snapshot.
//!
//! A [`Registry`] is built in one go by the config loader and never mutated
//! afterwards. [`SharedRegistry`] publishes a new one by swapping an `Arc`, so
//! request handlers keep whatever snapshot they grabbed for the whole request.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use secrecy::SecretString;
use url::Url;

use crate::path::CanonicalPath;

/// Login for one remote host.
#[derive(Debug)]
pub struct Credential {
    /// Host key, `host` or `host:port`, matched exactly against remote URLs.
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

/// One configured repository.
#[derive(Debug, Clone)]
pub struct RepositoryDefinition {
    /// Unique name, also the first segment of every browse URL.
    pub name: String,
    /// URL as written in the config file.
    pub raw_url: String,
    /// Normalized remote URL.
    pub url: Url,
    /// Browsable subtree of the clone.
    pub subdirectory: CanonicalPath,
    /// Tracked ref; `None` follows the remote's default branch.
    pub branch: Option<String>,
    /// `<host>/<url path>` segments under the storage root.
    pub(crate) storage_path: CanonicalPath,
}

impl RepositoryDefinition {
    /// Host key used for credential lookup and as the first storage directory.
    pub fn host_key(&self) -> String {
        host_key(&self.url)
    }

    /// Where the clone lives: `storage_root/<host>/<url path>`.
    pub fn local_root(&self, storage_root: &Path) -> PathBuf {
        self.storage_path.to_path_under(storage_root)
    }

    /// The confined root requests are resolved against.
    pub fn browse_root(&self, storage_root: &Path) -> PathBuf {
        self.subdirectory.to_path_under(&self.local_root(storage_root))
    }

    /// True once the clone's `.git` metadata exists.
    pub fn is_cloned(&self, storage_root: &Path) -> bool {
        self.local_root(storage_root).join(".git").exists()
    }
}

/// `host` or `host:port` of a URL; empty for host-less URLs such as `file:///`.
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Immutable result of one config load.
#[derive(Debug, Default)]
pub struct Registry {
    pub default_host: String,
    repositories: BTreeMap<String, RepositoryDefinition>,
    credentials: HashMap<String, Credential>,
}

impl Registry {
    pub fn new(
        default_host: impl Into<String>,
        repositories: impl IntoIterator<Item = RepositoryDefinition>,
        credentials: impl IntoIterator<Item = Credential>,
    ) -> Self {
        Self {
            default_host: default_host.into(),
            repositories: repositories
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
            credentials: credentials
                .into_iter()
                .map(|c| (c.host.clone(), c))
                .collect(),
        }
    }

    pub fn repository(&self, name: &str) -> Option<&RepositoryDefinition> {
        self.repositories.get(name)
    }

    /// Repositories in name order.
    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryDefinition> {
        self.repositories.values()
    }

    pub fn credential(&self, host: &str) -> Option<&Credential> {
        self.credentials.get(host)
    }

    /// Credential for a repository's host, if one is configured.
    pub fn credential_for(&self, repo: &RepositoryDefinition) -> Option<&Credential> {
        self.credential(&repo.host_key())
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// The registry currently being served.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The current snapshot. The lock is held only to clone the `Arc`.
    pub fn snapshot(&self) -> Arc<Registry> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the current snapshot wholesale.
    pub fn publish(&self, registry: Registry) {
        let next = Arc::new(registry);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
