//! Repository synchronization: shallow clone on first sight, depth-1 fetch
//! and reset afterwards, all through the git CLI.

pub mod auth;
pub mod cancel;
pub mod engine;
pub mod error;
pub mod parse;
pub mod repository;
pub mod scheduler;
pub mod types;

pub use cancel::{CancelHandle, CancelToken};
pub use engine::{SyncEngine, SyncSettings, DEFAULT_MAX_CONCURRENT, DEFAULT_SYNC_TIMEOUT};
pub use error::SyncError;
pub use repository::{GitRepository, GitRunner};
pub use scheduler::{RefreshScheduler, DEFAULT_REFRESH_INTERVAL};
pub use types::{RepoSyncResult, SyncOutcome, SyncReport};
