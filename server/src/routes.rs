//! HTTP routes.
//!
//! - `GET /{repo}` lists the repository root
//! - `GET /{repo}/{*path}?raw=true|false` shows a directory or file
//! - `GET /static/{*path}` serves assets
//!
//! A repository named `static` is shadowed by the asset route.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use repoview::{Presentation, View};

use crate::assets::locate_asset;
use crate::error::ServerError;
use crate::render::{Page, RenderedPage};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    raw: Option<String>,
}

impl BrowseQuery {
    fn force_raw(&self) -> bool {
        self.raw.as_deref() == Some("true")
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/static/{*path}", get(static_asset))
        .route("/{repo}", get(repo_root))
        .route("/{repo}/{*path}", get(browse))
        .with_state(state)
}

async fn repo_root(
    State(state): State<Arc<AppState>>,
    Path(repo): Path<String>,
    Query(query): Query<BrowseQuery>,
) -> Result<Response, ServerError> {
    serve(state, repo, String::new(), query.force_raw()).await
}

async fn browse(
    State(state): State<Arc<AppState>>,
    Path((repo, path)): Path<(String, String)>,
    Query(query): Query<BrowseQuery>,
) -> Result<Response, ServerError> {
    serve(state, repo, path, query.force_raw()).await
}

async fn static_asset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    tokio::task::spawn_blocking(move || {
        let root = state
            .assets
            .as_deref()
            .ok_or_else(|| ServerError::AssetNotFound(path.clone()))?;
        let file = locate_asset(root, &path)?;
        raw_response(&file)
    })
    .await?
}

/// Resolution and file reads hit the filesystem, so they run off the
/// async workers.
async fn serve(
    state: Arc<AppState>,
    repo: String,
    path: String,
    force_raw: bool,
) -> Result<Response, ServerError> {
    tokio::task::spawn_blocking(move || render_path(&state, &repo, &path, force_raw)).await?
}

fn render_path(
    state: &AppState,
    repo: &str,
    path: &str,
    force_raw: bool,
) -> Result<Response, ServerError> {
    let registry = state.registry.snapshot();
    let resolved = state.resolver.resolve(&registry, repo, path, force_raw)?;
    let absolute = &resolved.resolution.absolute_path;

    let rendered = match &resolved.view {
        View::File(Presentation::Raw) => return raw_response(absolute),
        View::File(Presentation::Text { .. }) => {
            let bytes = read_file(absolute)?;
            let text = String::from_utf8_lossy(&bytes);
            state.renderer.render(&Page {
                resolved: &resolved,
                content: Some(&text),
            })?
        }
        View::File(Presentation::Image) | View::Directory(_) => state.renderer.render(&Page {
            resolved: &resolved,
            content: None,
        })?,
    };

    Ok(page_response(rendered))
}

fn raw_response(path: &FsPath) -> Result<Response, ServerError> {
    let bytes = read_file(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}

fn page_response(page: RenderedPage) -> Response {
    ([(header::CONTENT_TYPE, page.content_type)], page.body).into_response()
}

fn read_file(path: &FsPath) -> Result<Vec<u8>, ServerError> {
    std::fs::read(path).map_err(|e| ServerError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}
