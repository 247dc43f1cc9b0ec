//! Decides how a file is presented.

use serde::Serialize;

use crate::languages::LanguageTable;

/// Extensions shown inline as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "gif"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Presentation {
    /// Embedded image, fetched again with `raw=true`.
    Image,
    /// Syntax-highlighted preview.
    Text { language: String },
    /// Bytes served as-is.
    Raw,
}

/// Classifies a file by extension. Unknown or missing extensions fall back to
/// [`Presentation::Raw`]; this never fails.
pub fn classify(extension: Option<&str>, force_raw: bool, languages: &LanguageTable) -> Presentation {
    if force_raw {
        return Presentation::Raw;
    }

    let Some(extension) = extension else {
        return Presentation::Raw;
    };

    if is_image_extension(extension) {
        return Presentation::Image;
    }

    match languages.language_for(extension) {
        Some(language) => Presentation::Text {
            language: language.to_string(),
        },
        None => Presentation::Raw,
    }
}

pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|img| img.eq_ignore_ascii_case(extension))
}
