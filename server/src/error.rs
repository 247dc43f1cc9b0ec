//! Server errors and their HTTP mapping.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use repoview::{ConfigError, LanguageError, ResolveError};

use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not found: {0}")]
    AssetNotFound(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Request task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load language table: {0}")]
    Languages(#[from] LanguageError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Resolve(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ServerError::ReadFile { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            ServerError::AssetNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{}", self);
            (status, "Not found").into_response()
        } else {
            tracing::error!("{}", self);
            (status, self.to_string()).into_response()
        }
    }
}
