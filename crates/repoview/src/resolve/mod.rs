//! Maps `(repository, untrusted path)` to a confined, classified location.
//!
//! Resolution is lexical first ([`canonicalize`]), so traversal attempts are
//! rejected before the filesystem is touched. A second check after `stat`
//! compares real paths, which catches symlinks inside a clone that point out
//! of it.

pub mod breadcrumb;
pub mod listing;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::classify::{classify, Presentation};
use crate::error::ResolveError;
use crate::languages::LanguageTable;
use crate::path::{canonicalize, CanonicalPath};
use crate::registry::Registry;

pub use breadcrumb::{build_breadcrumbs, Breadcrumb};
pub use listing::{is_metadata_name, read_entries, sort_entries, DirectoryEntry, METADATA_NAMES};

/// Where a request path landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolution {
    pub repository_name: String,
    pub canonical_relative_path: CanonicalPath,
    /// Always under the repository's browse root.
    pub absolute_path: PathBuf,
    pub is_directory: bool,
}

/// What to show for a resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum View {
    Directory(Vec<DirectoryEntry>),
    File(Presentation),
}

/// Everything a renderer needs for one request.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub resolution: PathResolution,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub view: View,
}

impl Resolved {
    /// `repo/path` as shown in page titles.
    pub fn display_path(&self) -> String {
        let path = &self.resolution.canonical_relative_path;
        if path.is_root() {
            self.resolution.repository_name.clone()
        } else {
            format!("{}/{}", self.resolution.repository_name, path.as_url_path())
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    storage_root: PathBuf,
    languages: Arc<LanguageTable>,
}

impl PathResolver {
    pub fn new(storage_root: impl Into<PathBuf>, languages: Arc<LanguageTable>) -> Self {
        Self {
            storage_root: storage_root.into(),
            languages,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Resolves `raw_path` inside repository `repo_name`.
    ///
    /// Unknown repositories, missing paths, paths that climb above the browse
    /// root and paths into `.git` are all [`ResolveError::NotFound`]. Other I/O
    /// failures are [`ResolveError::Internal`].
    pub fn resolve(
        &self,
        registry: &Registry,
        repo_name: &str,
        raw_path: &str,
        force_raw: bool,
    ) -> Result<Resolved, ResolveError> {
        let repo = registry
            .repository(repo_name)
            .ok_or_else(|| ResolveError::NotFound(format!("repository '{}'", repo_name)))?;

        let relative = canonicalize(raw_path)
            .map_err(|e| ResolveError::NotFound(format!("{}: {}", repo_name, e)))?;
        if relative.segments().iter().any(|s| is_metadata_name(s)) {
            return Err(ResolveError::NotFound(format!(
                "{}/{}",
                repo_name,
                relative.as_url_path()
            )));
        }

        let root = repo.browse_root(&self.storage_root);
        let absolute = relative.to_path_under(&root);

        let metadata = std::fs::metadata(&absolute).map_err(|e| io_error(&absolute, e))?;
        ensure_confined(&root, &absolute)?;

        let is_directory = metadata.is_dir();
        let view = if is_directory {
            let entries = read_entries(&absolute, repo_name, &relative)
                .map_err(|e| io_error(&absolute, e))?;
            View::Directory(entries)
        } else {
            View::File(classify(relative.extension(), force_raw, &self.languages))
        };

        tracing::debug!(
            repo = repo_name,
            path = %relative,
            is_directory,
            "Resolved path"
        );

        Ok(Resolved {
            breadcrumbs: build_breadcrumbs(repo_name, &relative, is_directory),
            resolution: PathResolution {
                repository_name: repo_name.to_string(),
                canonical_relative_path: relative,
                absolute_path: absolute,
                is_directory,
            },
            view,
        })
    }
}

/// Real-path check: `absolute` must still be under `root` once symlinks are
/// followed, and must not land inside metadata.
fn ensure_confined(root: &Path, absolute: &Path) -> Result<(), ResolveError> {
    let real_root = std::fs::canonicalize(root).map_err(|e| io_error(root, e))?;
    let real_target = std::fs::canonicalize(absolute).map_err(|e| io_error(absolute, e))?;

    let escaped = match real_target.strip_prefix(&real_root) {
        Ok(rest) => rest
            .components()
            .any(|c| is_metadata_name(&c.as_os_str().to_string_lossy())),
        Err(_) => true,
    };

    if escaped {
        tracing::warn!(
            path = %absolute.display(),
            "Refusing path that resolves outside its repository"
        );
        return Err(ResolveError::NotFound(absolute.display().to_string()));
    }
    Ok(())
}

fn io_error(path: &Path, error: std::io::Error) -> ResolveError {
    match error.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => {
            ResolveError::NotFound(path.display().to_string())
        }
        _ => ResolveError::Internal {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
