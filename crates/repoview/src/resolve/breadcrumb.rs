use serde::Serialize;

use crate::path::CanonicalPath;

/// One link in the trail from the repository root to the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    /// Empty when the crumb is not a link.
    pub url: String,
    pub bold: bool,
    pub dir: bool,
}

/// Builds the breadcrumb trail for `path` inside `repo`.
///
/// The repository crumb comes first and is always bold. At the root it is the
/// only crumb and is inert; otherwise every segment links to its cumulative
/// path except the last, which is inert and bold. All segments but the last
/// are directories; the last one's flag is `is_dir`.
pub fn build_breadcrumbs(repo: &str, path: &CanonicalPath, is_dir: bool) -> Vec<Breadcrumb> {
    let mut cumulative = format!("/{}", repo);
    let mut crumbs = Vec::with_capacity(path.segments().len() + 1);

    crumbs.push(Breadcrumb {
        name: repo.to_string(),
        url: if path.is_root() {
            String::new()
        } else {
            cumulative.clone()
        },
        bold: true,
        dir: true,
    });

    let count = path.segments().len();
    for (i, segment) in path.segments().iter().enumerate() {
        let is_last = i + 1 == count;
        cumulative.push('/');
        cumulative.push_str(segment);

        crumbs.push(Breadcrumb {
            name: segment.clone(),
            url: if is_last {
                String::new()
            } else {
                cumulative.clone()
            },
            bold: is_last,
            dir: !is_last || is_dir,
        });
    }

    crumbs
}
