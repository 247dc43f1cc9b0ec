//! Lexical path canonicalization.
//!
//! Untrusted request paths (and the path parts of configured URLs) are turned
//! into a list of plain segments before anything touches the filesystem. The
//! only way out of the root is a `..` with nothing left to pop, and that is an
//! error rather than being clamped to the root.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a path could not be canonicalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathEscape {
    #[error("path climbs above its root: {0}")]
    AboveRoot(String),

    #[error("path contains a NUL byte")]
    NulByte,
}

/// A relative path with `.`, `..` and empty segments resolved away.
///
/// Every segment is a plain name: never empty, never `.` or `..`, and free of
/// `/`, `\` and NUL. Joining it onto a directory therefore always yields a
/// descendant of that directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    segments: Vec<String>,
}

impl CanonicalPath {
    /// The empty path, naming the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Extension of the last segment: the text after its final `.`, unless the
    /// dot is the first character (`.gitignore` has no extension).
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]).filter(|ext| !ext.is_empty()),
        }
    }

    /// True if any segment equals `name`.
    pub fn contains_segment(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s == name)
    }

    /// Appends the segments of `other`.
    pub fn join(&self, other: &CanonicalPath) -> CanonicalPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        CanonicalPath { segments }
    }

    /// Joins the segments onto `base`.
    pub fn to_path_under(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }

    /// `/`-joined form; empty for the root.
    pub fn as_url_path(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.as_url_path())
        }
    }
}

/// Canonicalizes `raw` without touching the filesystem.
///
/// Both `/` and `\` separate segments, so a Windows-style `..\..\` is treated
/// the same as `../../`. Leading separators are ignored: `/a/b` and `a/b` are
/// the same relative path.
pub fn canonicalize(raw: &str) -> Result<CanonicalPath, PathEscape> {
    if raw.contains('\0') {
        return Err(PathEscape::NulByte);
    }

    let mut segments: Vec<String> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathEscape::AboveRoot(raw.to_string()));
                }
            }
            name => segments.push(name.to_string()),
        }
    }

    Ok(CanonicalPath { segments })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_collapses_dots() {
        let path = canonicalize("./src/../src/./lib.rs").unwrap();
        assert_eq!(path.as_url_path(), "src/lib.rs");
    }

    #[test]
    fn test_canonicalize_root_forms() {
        for raw in ["", ".", "/", "./", "a/..", "//./"] {
            assert!(canonicalize(raw).unwrap().is_root(), "{raw:?} should be root");
        }
    }

    #[test]
    fn test_canonicalize_rejects_escape() {
        assert!(matches!(
            canonicalize("../etc/passwd"),
            Err(PathEscape::AboveRoot(_))
        ));
        assert!(matches!(
            canonicalize("a/../../b"),
            Err(PathEscape::AboveRoot(_))
        ));
        assert!(matches!(
            canonicalize("a\\..\\..\\b"),
            Err(PathEscape::AboveRoot(_))
        ));
    }

    #[test]
    fn test_canonicalize_does_not_clamp() {
        // `../a` must not silently become `a`.
        assert!(canonicalize("../a").is_err());
    }

    #[test]
    fn test_canonicalize_rejects_nul() {
        assert_eq!(canonicalize("a\0b"), Err(PathEscape::NulByte));
    }

    #[test]
    fn test_canonicalize_keeps_dotted_names() {
        let path = canonicalize("...//..foo/.bar").unwrap();
        assert_eq!(path.segments(), &["...", "..foo", ".bar"]);
    }

    #[test]
    fn test_extension() {
        assert_eq!(canonicalize("src/app.py").unwrap().extension(), Some("py"));
        assert_eq!(canonicalize("a.tar.gz").unwrap().extension(), Some("gz"));
        assert_eq!(canonicalize("README").unwrap().extension(), None);
        assert_eq!(canonicalize(".gitignore").unwrap().extension(), None);
        assert_eq!(canonicalize("trailing.").unwrap().extension(), None);
        assert_eq!(CanonicalPath::root().extension(), None);
    }

    #[test]
    fn test_to_path_under() {
        let path = canonicalize("docs/guide.md").unwrap();
        assert_eq!(
            path.to_path_under(Path::new("/srv/repos")),
            PathBuf::from("/srv/repos/docs/guide.md")
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CanonicalPath::root().to_string(), ".");
        assert_eq!(canonicalize("a/b").unwrap().to_string(), "a/b");
    }
}
