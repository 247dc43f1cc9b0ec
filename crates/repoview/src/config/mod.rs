pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, normalize_url, DEFAULT_HOST};
pub use schema::{AuthEntry, ConfigFile, RepoEntry};
