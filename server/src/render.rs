//! Page rendering for directory, text and image views.
//!
//! Raw files bypass the renderer and are streamed as bytes. Everything else is
//! handed to a [`PageRenderer`] along with the resolved path.

use serde::Serialize;
use thiserror::Error;

use repoview::{Breadcrumb, DirectoryEntry, Presentation, Resolved, View};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to encode page: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything a renderer needs for one response.
pub struct Page<'a> {
    pub resolved: &'a Resolved,
    /// File text for [`Presentation::Text`] views, decoded lossily.
    pub content: Option<&'a str>,
}

impl Page<'_> {
    pub fn repository(&self) -> &str {
        &self.resolved.resolution.repository_name
    }

    /// URL fetching the current file's bytes.
    pub fn raw_url(&self) -> String {
        format!(
            "/{}/{}?raw=true",
            self.repository(),
            self.resolved.resolution.canonical_relative_path.as_url_path()
        )
    }
}

/// A rendered response body.
pub struct RenderedPage {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &Page<'_>) -> Result<RenderedPage, RenderError>;
}

/// Renders pages as JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonPage<'a> {
    repository: &'a str,
    path: String,
    breadcrumbs: &'a [Breadcrumb],
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [DirectoryEntry]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl PageRenderer for JsonRenderer {
    fn render(&self, page: &Page<'_>) -> Result<RenderedPage, RenderError> {
        let resolved = page.resolved;
        let mut doc = JsonPage {
            repository: page.repository(),
            path: resolved.display_path(),
            breadcrumbs: &resolved.breadcrumbs,
            files: None,
            content: None,
            language: None,
            image: None,
        };

        match &resolved.view {
            View::Directory(entries) => doc.files = Some(entries.as_slice()),
            View::File(Presentation::Text { language }) => {
                doc.content = page.content;
                doc.language = Some(language.as_str());
            }
            View::File(Presentation::Image) => doc.image = Some(page.raw_url()),
            View::File(Presentation::Raw) => {}
        }

        Ok(RenderedPage {
            content_type: "application/json",
            body: serde_json::to_vec(&doc)?,
        })
    }
}
