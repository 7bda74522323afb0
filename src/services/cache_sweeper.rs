//! Periodic expired-entry sweep for the expiring store.
//!
//! The sweeper is an owned background task: [`CacheSweeper::start`] spawns it
//! and returns a [`SweeperHandle`]. Stopping the handle ends the task
//! gracefully; dropping it aborts the task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::CacheConfig;
use crate::domain::ports::KeyValueStorage;
use crate::services::expiring_store::{ExpiringStore, SweepReport};

/// Configuration for the cache sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between sweeps.
    pub interval: Duration,
    /// Whether to sweep immediately on start.
    pub run_on_startup: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            run_on_startup: true,
        }
    }
}

impl SweeperConfig {
    /// Create config with custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }
}

impl From<&CacheConfig> for SweeperConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            interval: config.sweep_interval(),
            run_on_startup: config.sweep_on_startup,
        }
    }
}

/// Status of the sweeper task.
#[derive(Debug, Clone, Default)]
pub struct SweeperStatus {
    /// Whether the task is running.
    pub running: bool,
    /// Sweeps attempted.
    pub total_runs: u64,
    /// Sweeps that completed.
    pub successful_runs: u64,
    /// Sweeps that hit a storage error.
    pub failed_runs: u64,
    /// Entries removed across all runs.
    pub total_removed: u64,
    /// When the latest sweep finished.
    pub last_run: Option<Instant>,
    /// Counts from the latest successful sweep.
    pub last_report: Option<SweepReport>,
}

/// Handle owning a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    status: Arc<RwLock<SweeperStatus>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Get current sweeper status.
    pub async fn status(&self) -> SweeperStatus {
        self.status.read().await.clone()
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "cache sweeper task ended abnormally");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Background sweeper removing expired cache entries on a fixed interval.
pub struct CacheSweeper<S>
where
    S: KeyValueStorage + 'static,
{
    store: Arc<ExpiringStore<S>>,
    config: SweeperConfig,
}

impl<S> CacheSweeper<S>
where
    S: KeyValueStorage + 'static,
{
    /// Sweeper over `store`; call `start` to spawn it.
    pub const fn new(store: Arc<ExpiringStore<S>>, config: SweeperConfig) -> Self {
        Self { store, config }
    }

    /// Create with default configuration.
    pub fn with_defaults(store: Arc<ExpiringStore<S>>) -> Self {
        Self::new(store, SweeperConfig::default())
    }

    /// Get configuration.
    pub const fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Sweep once (for manual invocation).
    pub async fn run_once(&self) -> DomainResult<SweepReport> {
        self.store.clear_expired().await
    }

    /// Spawn the sweep loop on the current tokio runtime.
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status = Arc::new(RwLock::new(SweeperStatus::default()));
        let task = tokio::spawn(self.run_loop(status.clone(), shutdown_rx));

        SweeperHandle {
            shutdown: shutdown_tx,
            status,
            task: Some(task),
        }
    }

    async fn run_loop(self, status: Arc<RwLock<SweeperStatus>>, mut shutdown: watch::Receiver<bool>) {
        status.write().await.running = true;
        info!(
            interval_secs = self.config.interval.as_secs(),
            run_on_startup = self.config.run_on_startup,
            "cache sweeper started"
        );

        let mut timer = interval(self.config.interval.max(Duration::from_millis(1)));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        if !self.config.run_on_startup {
            timer.tick().await;
        }

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.sweep_cycle(&status).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        status.write().await.running = false;
        info!("cache sweeper stopped");
    }

    async fn sweep_cycle(&self, status: &RwLock<SweeperStatus>) {
        let result = self.store.clear_expired().await;

        let mut status = status.write().await;
        status.total_runs += 1;
        status.last_run = Some(Instant::now());

        match result {
            Ok(report) => {
                status.successful_runs += 1;
                status.total_removed += report.total_removed() as u64;
                status.last_report = Some(report);
            }
            Err(e) => {
                status.failed_runs += 1;
                warn!(error = %e, run = status.total_runs, "cache sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKeyValueStorage;
    use crate::domain::ports::ManualClock;

    fn store_with_clock() -> (Arc<ExpiringStore<InMemoryKeyValueStorage>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_millis(0));
        let store = ExpiringStore::new(Arc::new(InMemoryKeyValueStorage::new()), clock.clone());
        (Arc::new(store), clock)
    }

    #[test]
    fn test_config_default() {
        let config = SweeperConfig::default();
        assert_eq!(config.interval, Duration::from_secs(300));
        assert!(config.run_on_startup);
    }

    #[test]
    fn test_config_from_cache_config() {
        let cache = CacheConfig {
            sweep_interval_secs: 60,
            sweep_on_startup: false,
            ..Default::default()
        };
        let config = SweeperConfig::from(&cache);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert!(!config.run_on_startup);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_on_startup_and_on_interval() {
        let (store, clock) = store_with_clock();
        store.set("old", &1, Duration::from_millis(10)).await.unwrap();
        clock.advance_millis(20);

        let handle = CacheSweeper::new(store.clone(), SweeperConfig::with_interval(Duration::from_secs(300))).start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let status = handle.status().await;
        assert!(status.running);
        assert_eq!(status.total_runs, 1);
        assert_eq!(status.total_removed, 1);
        assert!(store.keys().await.unwrap().is_empty());

        store.set("next", &2, Duration::from_millis(10)).await.unwrap();
        clock.advance_millis(20);
        tokio::time::sleep(Duration::from_secs(301)).await;

        let status = handle.status().await;
        assert_eq!(status.total_runs, 2);
        assert_eq!(status.total_removed, 2);
        assert!(store.keys().await.unwrap().is_empty());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_startup_sweep_when_disabled() {
        let (store, _) = store_with_clock();
        let config = SweeperConfig {
            interval: Duration::from_secs(300),
            run_on_startup: false,
        };

        let handle = CacheSweeper::new(store, config).start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.status().await.total_runs, 0);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_stop_marks_not_running() {
        let (store, _) = store_with_clock();
        let handle = CacheSweeper::with_defaults(store).start();
        let status = handle.status.clone();

        handle.stop().await;
        assert!(!status.read().await.running);
    }
}
