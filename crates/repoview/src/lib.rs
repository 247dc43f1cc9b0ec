//! Mirror remote git repositories locally and browse them read-only.
//!
//! - [`config`] loads the repository registry and normalizes remote URLs
//! - [`sync`] clones or updates each repository on a schedule
//! - [`resolve`] confines untrusted request paths to a repository and
//!   classifies what it finds there via [`classify`]

pub mod classify;
pub mod config;
pub mod error;
pub mod languages;
pub mod path;
mod path_proptest;
pub mod registry;
pub mod resolve;
pub mod sanitize;
pub mod secrets;
pub mod sync;

pub use classify::{classify, Presentation, IMAGE_EXTENSIONS};
pub use config::{load_config, load_config_from_str, normalize_url, DEFAULT_HOST};
pub use error::{ConfigError, LanguageError, RepoviewError, ResolveError, Result};
pub use languages::LanguageTable;
pub use path::{canonicalize, CanonicalPath, PathEscape};
pub use registry::{Credential, Registry, RepositoryDefinition, SharedRegistry};
pub use resolve::{Breadcrumb, DirectoryEntry, PathResolution, PathResolver, Resolved, View};
pub use sync::{
    CancelHandle, CancelToken, RefreshScheduler, SyncEngine, SyncError, SyncOutcome, SyncReport,
    SyncSettings,
};
