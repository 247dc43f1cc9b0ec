//! Static asset lookup, confined to the assets directory the same way
//! repository paths are confined to their browse root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use repoview::canonicalize;

use crate::error::ServerError;

/// Maps a request path to a file under `assets_root`.
///
/// Paths that climb out lexically, or through a symlink, are not found.
pub fn locate_asset(assets_root: &Path, raw: &str) -> Result<PathBuf, ServerError> {
    let relative = canonicalize(raw).map_err(|e| ServerError::AssetNotFound(e.to_string()))?;
    if relative.is_root() {
        return Err(ServerError::AssetNotFound(raw.to_string()));
    }

    let absolute = relative.to_path_under(assets_root);
    let real_root = real_path(assets_root)?;
    let real_target = real_path(&absolute)?;
    if !real_target.starts_with(&real_root) || !real_target.is_file() {
        log::warn!("Refusing asset outside {}: {}", assets_root.display(), raw);
        return Err(ServerError::AssetNotFound(raw.to_string()));
    }

    Ok(real_target)
}

fn real_path(path: &Path) -> Result<PathBuf, ServerError> {
    std::fs::canonicalize(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => {
            ServerError::AssetNotFound(path.display().to_string())
        }
        _ => ServerError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        },
    })
}
