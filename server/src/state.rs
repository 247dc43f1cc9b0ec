use std::path::PathBuf;
use std::sync::Arc;

use repoview::{PathResolver, SharedRegistry};

use crate::render::{JsonRenderer, PageRenderer};

/// Shared state behind every request handler.
pub struct AppState {
    pub registry: Arc<SharedRegistry>,
    pub resolver: PathResolver,
    pub renderer: Arc<dyn PageRenderer>,
    /// Directory served under `/static`; `None` disables the route.
    pub assets: Option<PathBuf>,
}

impl AppState {
    pub fn new(registry: Arc<SharedRegistry>, resolver: PathResolver) -> Self {
        Self {
            registry,
            resolver,
            renderer: Arc::new(JsonRenderer),
            assets: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_assets(mut self, assets: Option<PathBuf>) -> Self {
        self.assets = assets;
        self
    }
}
