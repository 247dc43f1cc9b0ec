//! HTTP front end for browsing mirrored repositories.

pub mod app;
pub mod assets;
pub mod cli;
pub mod error;
pub mod logging;
pub mod render;
pub mod routes;
pub mod state;

pub use app::run;
pub use cli::Args;
pub use error::ServerError;
pub use render::{JsonRenderer, PageRenderer};
pub use routes::router;
pub use state::AppState;
