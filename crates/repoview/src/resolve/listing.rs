use std::path::Path;

use serde::Serialize;

use crate::path::CanonicalPath;

/// Names hidden from listings and refused by the resolver.
pub const METADATA_NAMES: &[&str] = &[".git"];

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub url: String,
    pub dir: bool,
}

pub fn is_metadata_name(name: &str) -> bool {
    METADATA_NAMES.contains(&name)
}

/// Reads the immediate children of `dir`, minus version-control metadata,
/// sorted with [`sort_entries`]. Entry types follow symlinks; a dangling link
/// is listed as a file.
pub fn read_entries(
    dir: &Path,
    repo: &str,
    path: &CanonicalPath,
) -> std::io::Result<Vec<DirectoryEntry>> {
    let base = if path.is_root() {
        format!("/{}", repo)
    } else {
        format!("/{}/{}", repo, path.as_url_path())
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_metadata_name(&name) {
            continue;
        }
        let is_dir = std::fs::metadata(entry.path())
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push(DirectoryEntry {
            url: format!("{}/{}", base, name),
            name,
            dir: is_dir,
        });
    }

    sort_entries(&mut entries);
    Ok(entries)
}

/// Directories first, then by name in byte order.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| b.dir.cmp(&a.dir).then_with(|| a.name.cmp(&b.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::canonicalize;
    use tempfile::TempDir;

    fn entry(name: &str, dir: bool) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            url: String::new(),
            dir,
        }
    }

    #[test]
    fn test_sort_directories_first() {
        let mut entries = vec![
            entry("b.txt", false),
            entry("a", true),
            entry("c", true),
            entry("a.txt", false),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.dir)).collect();
        assert_eq!(
            names,
            vec![("a", true), ("c", true), ("a.txt", false), ("b.txt", false)]
        );
    }

    #[test]
    fn test_sort_is_case_sensitive() {
        let mut entries = vec![entry("b", false), entry("B", false), entry("a", false)];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_read_entries_hides_git_and_builds_urls() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("README.md"), "hi").unwrap();

        let root = read_entries(dir.path(), "demo", &CanonicalPath::root()).unwrap();
        assert_eq!(
            root,
            vec![
                DirectoryEntry {
                    name: "src".to_string(),
                    url: "/demo/src".to_string(),
                    dir: true,
                },
                DirectoryEntry {
                    name: "README.md".to_string(),
                    url: "/demo/README.md".to_string(),
                    dir: false,
                },
            ]
        );

        std::fs::write(dir.path().join("src/app.py"), "print()").unwrap();
        let nested = read_entries(
            &dir.path().join("src"),
            "demo",
            &canonicalize("src").unwrap(),
        )
        .unwrap();
        assert_eq!(nested[0].url, "/demo/src/app.py");
    }
}
