//! Clone-or-update for every configured repository.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::auth::build_auth_env;
use super::cancel::CancelToken;
use super::error::SyncError;
use super::repository::{GitRepository, GitRunner};
use super::types::{RepoSyncResult, SyncOutcome, SyncReport};
use crate::registry::{Credential, Registry, RepositoryDefinition};
use crate::sanitize::redact_url;

/// Default budget for one repository's clone or update.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(300);
/// Default number of repositories synced at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Root under which `<host>/<path>` clones live.
    pub storage_root: PathBuf,
    /// Deadline for all git commands of one repository's sync.
    pub timeout: Duration,
    /// Upper bound on repositories synced in parallel.
    pub max_concurrent: usize,
}

impl SyncSettings {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            timeout: DEFAULT_SYNC_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncEngine {
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn storage_root(&self) -> &Path {
        &self.settings.storage_root
    }

    /// Syncs every repository in `registry`, at most `max_concurrent` local
    /// clones at once.
    ///
    /// Repositories that map to the same local root (same remote, different
    /// `dir`) are synced once and share the outcome. Failures are logged and
    /// recorded per repository; one failing clone never stops the others.
    pub async fn sync_all(&self, registry: &Registry, cancel: &CancelToken) -> SyncReport {
        let started_at = Utc::now();
        let limit = self.settings.max_concurrent.max(1);
        let groups = group_by_local_root(registry, &self.settings.storage_root);

        let synced: Vec<(Vec<String>, Result<SyncOutcome, Arc<SyncError>>)> =
            stream::iter(groups)
                .map(|group| async move {
                    let credential = registry.credential_for(&group.repo);
                    let result = self
                        .sync_one(&group.repo, credential, cancel)
                        .await
                        .map_err(Arc::new);
                    (group.names, result)
                })
                .buffer_unordered(limit)
                .collect()
                .await;

        let mut results: Vec<RepoSyncResult> = synced
            .into_iter()
            .flat_map(|(names, result)| {
                names.into_iter().map(move |repo| RepoSyncResult {
                    repo,
                    result: result.clone(),
                })
            })
            .collect();
        results.sort_by(|a, b| a.repo.cmp(&b.repo));

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Repository sync finished"
        );
        report
    }

    /// Clones `repo` if it has no local copy yet, otherwise updates it.
    pub async fn sync_one(
        &self,
        repo: &RepositoryDefinition,
        credential: Option<&Credential>,
        cancel: &CancelToken,
    ) -> Result<SyncOutcome, SyncError> {
        let span = info_span!("sync.repo", repo = %repo.name);
        async move {
            let started = Instant::now();
            let result = self.sync_one_inner(repo, credential, cancel).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(SyncOutcome::Cloned { head }) => {
                    info!(%head, elapsed_ms, "Cloned repository")
                }
                Ok(SyncOutcome::Updated {
                    from,
                    to,
                    files_changed,
                }) => info!(%from, %to, files_changed, elapsed_ms, "Updated repository"),
                Ok(SyncOutcome::UpToDate { .. }) => debug!(elapsed_ms, "Repository up to date"),
                Err(e) if e.is_cancelled() => warn!("Sync cancelled: {}", e),
                Err(e) => error!(url = %redact_url(&repo.url), "Sync failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn sync_one_inner(
        &self,
        repo: &RepositoryDefinition,
        credential: Option<&Credential>,
        cancel: &CancelToken,
    ) -> Result<SyncOutcome, SyncError> {
        let auth = build_auth_env(credential)?;
        let runner = GitRunner::new(auth, self.settings.timeout, cancel.clone());
        let git = GitRepository::new(repo.local_root(&self.settings.storage_root));
        let branch = repo.branch.as_deref();

        if !git.is_git_repo() {
            debug!(
                operation = "clone",
                anonymous = credential.is_none(),
                "No local copy, cloning"
            );
            clear_partial_clone(git.repo_path()).await?;

            return match git.clone_shallow(&runner, repo.url.as_str(), branch).await {
                Ok(head) => Ok(SyncOutcome::Cloned { head }),
                Err(e) => {
                    if let Err(cleanup) = clear_partial_clone(git.repo_path()).await {
                        warn!("Failed to remove partial clone: {}", cleanup);
                    }
                    Err(e)
                }
            };
        }

        debug!(operation = "update", "Updating local copy");
        let (from, to) = git.update(&runner, branch).await?;
        if from == to {
            return Ok(SyncOutcome::UpToDate { head: to });
        }

        let files_changed = git.changed_files(&runner, &from, &to).await;
        Ok(SyncOutcome::Updated {
            from,
            to,
            files_changed,
        })
    }
}

/// Repositories sharing one local clone. `repo` is the first by name and
/// decides the tracked branch.
#[derive(Debug)]
struct CloneGroup {
    repo: RepositoryDefinition,
    names: Vec<String>,
}

fn group_by_local_root(registry: &Registry, storage_root: &Path) -> Vec<CloneGroup> {
    let mut groups: BTreeMap<PathBuf, CloneGroup> = BTreeMap::new();

    for repo in registry.repositories() {
        match groups.entry(repo.local_root(storage_root)) {
            Entry::Vacant(slot) => {
                slot.insert(CloneGroup {
                    repo: repo.clone(),
                    names: vec![repo.name.clone()],
                });
            }
            Entry::Occupied(mut slot) => {
                let group = slot.get_mut();
                if group.repo.branch != repo.branch {
                    warn!(
                        repo = %repo.name,
                        shared_with = %group.repo.name,
                        "Repositories share a clone but name different branches; tracking {}",
                        group.repo.branch.as_deref().unwrap_or("the default branch")
                    );
                }
                group.names.push(repo.name.clone());
            }
        }
    }

    groups.into_values().collect()
}

/// Removes a clone directory that has no `.git`, left behind by an
/// interrupted clone. Git refuses to clone into a non-empty directory.
async fn clear_partial_clone(path: &Path) -> Result<(), SyncError> {
    if !path.exists() || path.join(".git").exists() {
        return Ok(());
    }

    warn!(path = %path.display(), "Removing leftover directory without git metadata");
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|e| SyncError::LocalStorage {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unreachable_repository_fails_in_isolation() {
        let storage = TempDir::new().unwrap();
        let registry = load_config_from_str(
            r#"
repos:
  missing:
    url: file:///nonexistent/repoview/upstream.git
"#,
        )
        .unwrap();

        let engine = SyncEngine::new(SyncSettings::new(storage.path()));
        let report = engine.sync_all(&registry, &CancelToken::never()).await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.get("missing").unwrap().is_err());
        // The failed clone leaves nothing behind.
        let repo = registry.repository("missing").unwrap();
        assert!(!repo.local_root(storage.path()).exists());
    }

    #[tokio::test]
    async fn test_sync_all_runs_on_a_spawned_task() {
        let storage = TempDir::new().unwrap();
        let registry = Arc::new(
            load_config_from_str(
                r#"
repos:
  one:
    url: file:///nonexistent/repoview/one.git
  two:
    url: file:///nonexistent/repoview/two.git
"#,
            )
            .unwrap(),
        );
        let engine = Arc::new(SyncEngine::new(SyncSettings::new(storage.path())));

        let task = {
            let registry = Arc::clone(&registry);
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.sync_all(&registry, &CancelToken::never()).await })
        };
        let report = task.await.unwrap();

        let names: Vec<&str> = report.results.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_repositories_sharing_a_remote_share_a_clone() {
        let registry = load_config_from_str(
            r#"
repos:
  site:
    url: octocat/hello
  docs:
    url: octocat/hello
    dir: docs
  other:
    url: octocat/world
"#,
        )
        .unwrap();

        let groups = group_by_local_root(&registry, Path::new("repos"));

        let grouped: Vec<(&str, Vec<&str>)> = groups
            .iter()
            .map(|g| {
                (
                    g.repo.name.as_str(),
                    g.names.iter().map(String::as_str).collect(),
                )
            })
            .collect();
        assert_eq!(
            grouped,
            vec![("docs", vec!["docs", "site"]), ("other", vec!["other"])]
        );
    }

    #[tokio::test]
    async fn test_partial_clone_directory_is_cleared() {
        let dir = TempDir::new().unwrap();
        let leftover = dir.path().join("half");
        std::fs::create_dir_all(leftover.join("objects")).unwrap();

        clear_partial_clone(&leftover).await.unwrap();
        assert!(!leftover.exists());
    }

    #[tokio::test]
    async fn test_existing_clone_is_not_cleared() {
        let dir = TempDir::new().unwrap();
        let clone = dir.path().join("full");
        std::fs::create_dir_all(clone.join(".git")).unwrap();

        clear_partial_clone(&clone).await.unwrap();
        assert!(clone.join(".git").exists());
    }
}
