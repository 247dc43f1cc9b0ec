//! Git operations on one local clone.
//!
//! Every command goes through [`GitRunner`], which applies the credential
//! environment, the sync deadline and the cancellation signal. A command that
//! outlives either is killed.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command as TokioCommand;
use tokio::time::Instant;

use super::auth::AuthEnv;
use super::cancel::CancelToken;
use super::error::{classify_git_error, SyncError};
use super::parse::{count_changed_files, first_line, format_git_error};

/// Runs git commands for one sync operation.
#[derive(Debug)]
pub struct GitRunner {
    auth: AuthEnv,
    deadline: Instant,
    budget: Duration,
    cancel: CancelToken,
}

impl GitRunner {
    /// All commands run through this runner share one deadline, `budget` from now.
    pub fn new(auth: AuthEnv, budget: Duration, cancel: CancelToken) -> Self {
        Self {
            auth,
            deadline: Instant::now() + budget,
            budget,
            cancel,
        }
    }

    /// Runs `git <args>` in `cwd` and returns its output, whatever the exit status.
    pub async fn run(
        &self,
        operation: &'static str,
        cwd: &Path,
        args: &[&str],
    ) -> Result<Output, SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled { operation });
        }
        if Instant::now() >= self.deadline {
            return Err(SyncError::Timeout {
                operation,
                secs: self.budget.as_secs(),
            });
        }

        let mut cmd = TokioCommand::new("git");
        cmd.current_dir(cwd)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &self.auth.env_vars {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|e| SyncError::Spawn(e.to_string()))?;
        let mut cancel = self.cancel.clone();

        tokio::select! {
            result = tokio::time::timeout_at(self.deadline, child.wait_with_output()) => match result {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(SyncError::GitOperation {
                    operation,
                    message: e.to_string(),
                }),
                Err(_) => Err(SyncError::Timeout {
                    operation,
                    secs: self.budget.as_secs(),
                }),
            },
            _ = cancel.cancelled() => Err(SyncError::Cancelled { operation }),
        }
    }

    /// Like [`run`](Self::run), but a non-zero exit becomes a classified error.
    pub async fn run_checked(
        &self,
        operation: &'static str,
        cwd: &Path,
        args: &[&str],
    ) -> Result<Output, SyncError> {
        let output = self.run(operation, cwd, args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(classify_git_error(operation, &format_git_error(&output)))
        }
    }
}

/// A local clone at a fixed path.
#[derive(Debug, Clone)]
pub struct GitRepository {
    repo_path: PathBuf,
}

impl GitRepository {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Checks if the directory holds git metadata.
    pub fn is_git_repo(&self) -> bool {
        self.repo_path.join(".git").exists()
    }

    /// Shallow (depth 1) clone of `url` into this repository's path.
    ///
    /// The parent directory is created if needed. The target must not exist
    /// or must be empty.
    pub async fn clone_shallow(
        &self,
        runner: &GitRunner,
        url: &str,
        branch: Option<&str>,
    ) -> Result<String, SyncError> {
        let parent = self
            .repo_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::LocalStorage {
                path: parent.to_path_buf(),
                source: e,
            })?;

        // Relative to `parent`, which is also the working directory.
        let target = self
            .repo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.repo_path.to_string_lossy().into_owned());
        let mut args = vec!["clone", "--quiet", "--depth", "1"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend(["--", url, target.as_str()]);

        runner.run_checked("clone", parent, &args).await?;
        self.head(runner).await
    }

    /// Fetches the tracked branch at depth 1 and moves the worktree to it.
    ///
    /// Returns `(before, after)` commit ids; equal ids mean nothing changed and
    /// the worktree was not touched.
    pub async fn update(
        &self,
        runner: &GitRunner,
        branch: Option<&str>,
    ) -> Result<(String, String), SyncError> {
        let branch = match branch {
            Some(branch) => branch.to_string(),
            None => self.current_branch(runner).await?,
        };

        let before = self.head(runner).await?;

        runner
            .run_checked(
                "fetch",
                &self.repo_path,
                &["fetch", "--quiet", "--depth", "1", "origin", &branch],
            )
            .await?;

        let fetched = first_line(
            &runner
                .run_checked("fetch", &self.repo_path, &["rev-parse", "FETCH_HEAD"])
                .await?,
        );

        if fetched == before {
            return Ok((before, fetched));
        }

        runner
            .run_checked(
                "reset",
                &self.repo_path,
                &["reset", "--quiet", "--hard", "FETCH_HEAD"],
            )
            .await?;

        Ok((before, fetched))
    }

    /// Number of files that differ between two commits, or 0 if git can't tell.
    pub async fn changed_files(&self, runner: &GitRunner, from: &str, to: &str) -> u32 {
        match runner
            .run_checked("diff", &self.repo_path, &["diff", "--shortstat", from, to])
            .await
        {
            Ok(output) => count_changed_files(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                tracing::debug!(error = %e, "Could not count changed files");
                0
            }
        }
    }

    /// Commit id of `HEAD`.
    pub async fn head(&self, runner: &GitRunner) -> Result<String, SyncError> {
        let output = runner
            .run_checked("rev-parse", &self.repo_path, &["rev-parse", "HEAD"])
            .await?;
        Ok(first_line(&output))
    }

    /// Name of the checked-out branch.
    pub async fn current_branch(&self, runner: &GitRunner) -> Result<String, SyncError> {
        let output = runner
            .run_checked(
                "rev-parse",
                &self.repo_path,
                &["rev-parse", "--abbrev-ref", "HEAD"],
            )
            .await?;
        let branch = first_line(&output);
        if branch.is_empty() || branch == "HEAD" {
            return Err(SyncError::GitOperation {
                operation: "rev-parse",
                message: "HEAD is detached and no branch is configured".to_string(),
            });
        }
        Ok(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::auth::AuthEnv;
    use crate::sync::cancel::CancelHandle;
    use tempfile::TempDir;

    fn runner() -> GitRunner {
        GitRunner::new(
            AuthEnv::anonymous(),
            Duration::from_secs(30),
            CancelToken::never(),
        )
    }

    #[test]
    fn test_is_git_repo_false() {
        let dir = TempDir::new().unwrap();
        assert!(!GitRepository::new(dir.path()).is_git_repo());
    }

    #[tokio::test]
    async fn test_head_outside_repo_fails() {
        let dir = TempDir::new().unwrap();
        let repo = GitRepository::new(dir.path());
        let err = repo.head(&runner()).await.unwrap_err();
        assert!(matches!(err, SyncError::GitOperation { operation: "rev-parse", .. }));
    }

    #[tokio::test]
    async fn test_cancelled_runner_refuses_to_start() {
        let dir = TempDir::new().unwrap();
        let handle = CancelHandle::new();
        let runner = GitRunner::new(AuthEnv::anonymous(), Duration::from_secs(30), handle.token());
        handle.cancel();

        let err = runner.run("status", dir.path(), &["status"]).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_expired_deadline_times_out() {
        let dir = TempDir::new().unwrap();
        let runner = GitRunner::new(AuthEnv::anonymous(), Duration::ZERO, CancelToken::never());
        tokio::time::sleep(Duration::from_millis(5)).await;

        let err = runner
            .run("version", dir.path(), &["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Timeout { operation: "version", .. }));
    }
}
