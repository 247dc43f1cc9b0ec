use std::path::Path;

use url::Url;

use crate::config::schema::{ConfigFile, RepoEntry};
use crate::error::ConfigError;
use crate::path::{canonicalize, CanonicalPath};
use crate::registry::{host_key, Credential, Registry, RepositoryDefinition};
use crate::secrets::resolve_password_or_empty;

/// Forge assumed for shorthand URLs when the config does not name one.
pub const DEFAULT_HOST: &str = "github.com";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Registry, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Registry, ConfigError> {
    // An empty document is a valid, empty config.
    let file: ConfigFile = if content.trim().is_empty() {
        ConfigFile::default()
    } else {
        serde_yaml::from_str(content)?
    };

    build_registry(file)
}

fn build_registry(file: ConfigFile) -> Result<Registry, ConfigError> {
    let default_host = file
        .default_host
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let mut credentials = Vec::with_capacity(file.auth.len());
    for (host, entry) in &file.auth {
        let password = resolve_password_or_empty(entry.password_source()).map_err(|e| {
            ConfigError::Secret {
                host: host.clone(),
                source: e,
            }
        })?;
        credentials.push(Credential {
            host: host.clone(),
            username: entry.username.clone(),
            password,
        });
    }

    let default_username = file.auth.get(&default_host).map(|a| a.username.as_str());

    let mut repositories = Vec::with_capacity(file.repos.len());
    for (name, entry) in &file.repos {
        repositories.push(build_repository(name, entry, &default_host, default_username)?);
    }

    Ok(Registry::new(default_host, repositories, credentials))
}

fn build_repository(
    name: &str,
    entry: &RepoEntry,
    default_host: &str,
    default_username: Option<&str>,
) -> Result<RepositoryDefinition, ConfigError> {
    validate_repo_name(name)?;

    let normalized = normalize_url(name, &entry.url, default_host, default_username)?;
    let url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidUrl {
        repo: name.to_string(),
        url: crate::sanitize::redact_repo_url(&normalized),
        source: e,
    })?;

    let storage_path = storage_path(&url).ok_or_else(|| ConfigError::InvalidUrlPath {
        repo: name.to_string(),
        url: crate::sanitize::redact_url(&url),
    })?;

    let dir = entry.dir.as_deref().unwrap_or_default();
    let subdirectory = canonicalize(dir)
        .ok()
        .filter(|p| !p.contains_segment(".git"))
        .ok_or_else(|| ConfigError::InvalidSubdirectory {
            repo: name.to_string(),
            dir: dir.to_string(),
        })?;

    Ok(RepositoryDefinition {
        name: name.to_string(),
        raw_url: entry.url.clone(),
        url,
        subdirectory,
        branch: entry.branch.clone().filter(|b| !b.is_empty()),
        storage_path,
    })
}

/// Expands shorthand repository URLs, in this order:
///
/// 1. no `/`: a bare name owned by the default host's user, `name` → `user/name`
/// 2. exactly one `/`: `owner/name` → `https://<default host>/owner/name`
/// 3. anything else is taken verbatim
///
/// Step 1 feeds into step 2.
pub fn normalize_url(
    repo: &str,
    raw: &str,
    default_host: &str,
    default_username: Option<&str>,
) -> Result<String, ConfigError> {
    let mut url = raw.to_string();

    if !url.contains('/') {
        let username = default_username.ok_or_else(|| ConfigError::MissingDefaultCredential {
            repo: repo.to_string(),
            host: default_host.to_string(),
        })?;
        url = format!("{}/{}", username, url);
    }

    if url.matches('/').count() == 1 {
        url = format!("https://{}/{}", default_host, url);
    }

    Ok(url)
}

/// `<host>/<url path>` as a canonical path; `None` if the URL path climbs out.
fn storage_path(url: &Url) -> Option<CanonicalPath> {
    let host = canonicalize(&host_key(url)).ok()?;
    let path = canonicalize(url.path()).ok()?;
    Some(host.join(&path)).filter(|p| !p.is_root())
}

fn validate_repo_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidRepoName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
