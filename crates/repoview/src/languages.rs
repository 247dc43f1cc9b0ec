//! Extension to language lookup for syntax-highlighted previews.
//!
//! The table is a JSON list in the shape used by syntax highlighters:
//!
//! ```json
//! [
//!   { "name": "python", "extensions": ["py", "pyw"] },
//!   { "name": "rust", "extensions": "rs" },
//!   { "name": "lua" }
//! ]
//! ```
//!
//! An entry without `extensions` maps its own name.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::LanguageError;

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    name: String,
    #[serde(default)]
    extensions: Option<Extensions>,
}

/// The `extensions` field as it appears on disk.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extensions {
    One(String),
    Many(Vec<String>),
}

impl LanguageEntry {
    fn into_extensions(self) -> (String, Vec<String>) {
        let extensions = match self.extensions {
            None => vec![self.name.clone()],
            Some(Extensions::One(ext)) => vec![ext],
            Some(Extensions::Many(exts)) => exts,
        };
        (self.name, extensions)
    }
}

/// Flat `extension -> language name` map.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    by_extension: HashMap<String, String>,
}

impl LanguageTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LanguageError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LanguageError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Later entries win when two languages claim the same extension.
    pub fn from_json_str(content: &str) -> Result<Self, LanguageError> {
        let entries: Vec<LanguageEntry> = serde_json::from_str(content)?;

        let mut by_extension = HashMap::new();
        for entry in entries {
            let (name, extensions) = entry.into_extensions();
            for ext in extensions {
                let ext = ext.trim_start_matches('.').to_string();
                if !ext.is_empty() {
                    by_extension.insert(ext, name.clone());
                }
            }
        }

        tracing::debug!(extensions = by_extension.len(), "Loaded language table");
        Ok(Self { by_extension })
    }

    pub fn from_pairs<I, E, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, L)>,
        E: Into<String>,
        L: Into<String>,
    {
        Self {
            by_extension: pairs
                .into_iter()
                .map(|(e, l)| (e.into(), l.into()))
                .collect(),
        }
    }

    /// Language for an extension: exact match first, then lowercased.
    pub fn language_for(&self, extension: &str) -> Option<&str> {
        self.by_extension
            .get(extension)
            .or_else(|| self.by_extension.get(&extension.to_ascii_lowercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}
