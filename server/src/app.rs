//! Process wiring: config, background refresh, HTTP server, shutdown.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use repoview::sync::{CancelHandle, RefreshScheduler, SyncEngine, SyncSettings};
use repoview::{load_config, LanguageError, LanguageTable, PathResolver, SharedRegistry};

use crate::cli::Args;
use crate::error::ServerError;
use crate::routes::router;
use crate::state::AppState;

/// Runs the server until Ctrl-C.
///
/// The config is loaded once up front so a broken file fails startup. The
/// scheduler's first cycle syncs that registry; later cycles reload the file,
/// and a bad config then only skips that cycle.
pub async fn run(args: Args) -> Result<(), ServerError> {
    let config_path = args.config_path();
    let languages = load_languages(&args.languages)?;
    let registry = Arc::new(SharedRegistry::new(load_config(&config_path)?));
    info!(
        repositories = registry.snapshot().len(),
        config = %config_path.display(),
        "Loaded repository config"
    );

    let engine = Arc::new(SyncEngine::new(SyncSettings {
        storage_root: args.storage_root.clone(),
        timeout: args.sync_timeout(),
        max_concurrent: usize::from(args.sync_concurrency),
    }));
    let scheduler = RefreshScheduler::new(
        &config_path,
        Arc::clone(&registry),
        engine,
        args.refresh_interval(),
    )
    .seeded();

    let cancel = CancelHandle::new();
    let (trigger_tx, trigger_rx) = broadcast::channel(4);
    let refresh = scheduler.start(trigger_rx, cancel.token());
    spawn_reload_on_hangup(trigger_tx);

    let resolver = PathResolver::new(&args.storage_root, Arc::new(languages));
    let state = Arc::new(AppState::new(registry, resolver).with_assets(args.assets.clone()));

    let listener = TcpListener::bind(args.listen)
        .await
        .map_err(|e| ServerError::Bind {
            addr: args.listen,
            source: e,
        })?;
    info!(addr = %args.listen, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .map_err(ServerError::Serve)?;

    if let Err(e) = refresh.await {
        warn!("Refresh task ended abnormally: {}", e);
    }
    info!("Shut down");
    Ok(())
}

/// A missing table only disables syntax highlighting; a malformed one is an
/// error.
fn load_languages(path: &Path) -> Result<LanguageTable, ServerError> {
    match LanguageTable::load(path) {
        Ok(table) => Ok(table),
        Err(LanguageError::ReadFile { source, .. }) if source.kind() == ErrorKind::NotFound => {
            warn!(
                path = %path.display(),
                "Language table not found, every file will be served raw"
            );
            Ok(LanguageTable::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn shutdown_signal(cancel: CancelHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C, shutting down: {}", e);
    }
    info!("Shutdown requested, cancelling running syncs");
    cancel.cancel();
}

/// SIGHUP starts a refresh cycle right away.
#[cfg(unix)]
fn spawn_reload_on_hangup(trigger: broadcast::Sender<()>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!("SIGHUP reload unavailable: {}", e);
            return;
        }
    };
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            if trigger.send(()).is_err() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_trigger: broadcast::Sender<()>) {}
