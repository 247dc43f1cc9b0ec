//! Result types for repository synchronization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::SyncError;

/// What a successful sync did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// No local copy existed; a shallow clone was made.
    Cloned { head: String },
    /// New upstream commits were applied.
    #[serde(rename_all = "camelCase")]
    Updated {
        from: String,
        to: String,
        files_changed: u32,
    },
    /// Upstream had nothing new.
    UpToDate { head: String },
}

impl SyncOutcome {
    pub fn head(&self) -> &str {
        match self {
            SyncOutcome::Cloned { head } | SyncOutcome::UpToDate { head } => head,
            SyncOutcome::Updated { to, .. } => to,
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, SyncOutcome::UpToDate { .. })
    }
}

/// Result for one repository within a [`SyncReport`].
///
/// Repositories that share a local clone share one result, hence the `Arc`.
#[derive(Debug, Clone)]
pub struct RepoSyncResult {
    pub repo: String,
    pub result: Result<SyncOutcome, Arc<SyncError>>,
}

/// Results of one `sync_all` pass, ordered by repository name.
#[derive(Debug)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<RepoSyncResult>,
}

impl SyncReport {
    pub fn get(&self, repo: &str) -> Option<&Result<SyncOutcome, Arc<SyncError>>> {
        self.results
            .iter()
            .find(|r| r.repo == repo)
            .map(|r| &r.result)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SyncError)> {
        self.results.iter().filter_map(|r| match &r.result {
            Err(e) => Some((r.repo.as_str(), e.as_ref())),
            Ok(_) => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}
