//! Periodic config reload and repository sync.
//!
//! Each cycle reloads the config file, publishes the new registry, then syncs
//! every repository in it. A config that fails to load leaves the previous
//! registry in place and skips that cycle's sync.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::cancel::CancelToken;
use super::engine::SyncEngine;
use super::types::SyncReport;
use crate::config::load_config;
use crate::error::ConfigError;
use crate::registry::SharedRegistry;

/// Default time between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub struct RefreshScheduler {
    config_path: PathBuf,
    registry: Arc<SharedRegistry>,
    engine: Arc<SyncEngine>,
    interval: Duration,
    seeded: bool,
}

impl RefreshScheduler {
    pub fn new(
        config_path: impl Into<PathBuf>,
        registry: Arc<SharedRegistry>,
        engine: Arc<SyncEngine>,
        interval: Duration,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            registry,
            engine,
            interval,
            seeded: false,
        }
    }

    /// Marks the shared registry as already holding a fresh load, so the first
    /// cycle started by [`start`](Self::start) only syncs it.
    pub fn seeded(mut self) -> Self {
        self.seeded = true;
        self
    }

    /// Runs one load + publish + sync cycle.
    pub async fn run_cycle(&self, cancel: &CancelToken) -> Result<SyncReport, ConfigError> {
        refresh_once(&self.config_path, &self.registry, &self.engine, cancel).await
    }

    /// Starts the refresh loop on the current tokio runtime.
    ///
    /// The first cycle runs immediately; for a [`seeded`](Self::seeded)
    /// scheduler it syncs without reloading. Later cycles run every `interval`, or
    /// early when `trigger_rx` receives a message. The loop ends once `cancel`
    /// fires; a cycle in progress is interrupted through the same token.
    pub fn start(
        &self,
        mut trigger_rx: broadcast::Receiver<()>,
        cancel: CancelToken,
    ) -> JoinHandle<()> {
        let config_path = self.config_path.clone();
        let registry = Arc::clone(&self.registry);
        let engine = Arc::clone(&self.engine);
        let interval = self.interval;
        let mut reload = !self.seeded;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut shutdown = cancel.clone();

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {},
                    Ok(()) = trigger_rx.recv() => {
                        tracing::info!("Manual refresh triggered");
                    },
                    _ = shutdown.cancelled() => break,
                }

                if cancel.is_cancelled() {
                    break;
                }

                if !reload {
                    reload = true;
                    engine.sync_all(&registry.snapshot(), &cancel).await;
                } else if let Err(e) = refresh_once(&config_path, &registry, &engine, &cancel).await {
                    tracing::error!("Config reload failed, keeping previous registry: {}", e);
                }
            }

            tracing::info!("Refresh scheduler stopped");
        })
    }
}

async fn refresh_once(
    config_path: &std::path::Path,
    registry: &SharedRegistry,
    engine: &SyncEngine,
    cancel: &CancelToken,
) -> Result<SyncReport, ConfigError> {
    let loaded = load_config(config_path)?;
    tracing::info!(
        repositories = loaded.len(),
        config = %config_path.display(),
        "Loaded repository config"
    );
    registry.publish(loaded);

    let snapshot = registry.snapshot();
    Ok(engine.sync_all(&snapshot, cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::sync::cancel::CancelHandle;
    use crate::sync::engine::SyncSettings;
    use tempfile::TempDir;

    fn scheduler(dir: &TempDir, registry: Arc<SharedRegistry>) -> RefreshScheduler {
        RefreshScheduler::new(
            dir.path().join("config.yml"),
            registry,
            Arc::new(SyncEngine::new(SyncSettings::new(dir.path().join("repos")))),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_bad_config_keeps_previous_registry() {
        let dir = TempDir::new().unwrap();
        let previous = load_config_from_str("repos:\n  keep:\n    url: a/b\n").unwrap();
        let registry = Arc::new(SharedRegistry::new(previous));
        std::fs::write(dir.path().join("config.yml"), "repos: [broken").unwrap();

        let result = scheduler(&dir, Arc::clone(&registry))
            .run_cycle(&CancelToken::never())
            .await;

        assert!(matches!(result, Err(ConfigError::ParseYaml(_))));
        assert!(registry.snapshot().repository("keep").is_some());
    }

    #[tokio::test]
    async fn test_cycle_publishes_new_registry() {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(SharedRegistry::default());
        std::fs::write(dir.path().join("config.yml"), "repos: {}\n").unwrap();

        let report = scheduler(&dir, Arc::clone(&registry))
            .run_cycle(&CancelToken::never())
            .await
            .unwrap();

        assert!(report.results.is_empty());
        assert_eq!(registry.snapshot().default_host, "github.com");
    }

    #[tokio::test]
    async fn test_seeded_scheduler_reads_config_only_on_later_cycles() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.yml"), "defaultHost: file.example\n").unwrap();
        let seed = load_config_from_str("defaultHost: seed.example\n").unwrap();
        let registry = Arc::new(SharedRegistry::new(seed));
        let scheduler = scheduler(&dir, Arc::clone(&registry)).seeded();

        let handle = CancelHandle::new();
        let (trigger_tx, trigger_rx) = broadcast::channel(4);
        let task = scheduler.start(trigger_rx, handle.token());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(registry.snapshot().default_host, "seed.example");

        trigger_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while registry.snapshot().default_host != "file.example" {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("manual trigger should reload the config");

        handle.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("scheduler should stop")
            .expect("scheduler task panicked");
    }

    #[tokio::test]
    async fn test_loop_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.yml"), "").unwrap();
        let registry = Arc::new(SharedRegistry::default());
        let scheduler = scheduler(&dir, registry);

        let handle = CancelHandle::new();
        let (_trigger_tx, trigger_rx) = broadcast::channel(4);
        let task = scheduler.start(trigger_rx, handle.token());

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("scheduler should stop")
            .expect("scheduler task panicked");
    }
}
