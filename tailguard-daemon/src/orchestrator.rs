//! Orchestrator -- assembles the scan engine and drives the daemon lifecycle.
//!
//! The [`Orchestrator`] is the central coordinator that:
//! 1. Loads configuration and compiles the pattern registry
//! 2. Opens the checkpoint/event store and the alert channels
//! 3. Runs one scan cycle per interval tick, never two at once
//! 4. Evaluates thresholds and dispatches alerts after each cycle
//! 5. Runs periodic store maintenance
//! 6. Handles graceful shutdown on SIGTERM/SIGINT

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use tailguard_core::config::TailguardConfig;
use tailguard_core::error::StorageError;
use tailguard_core::event::CycleReport;
use tailguard_core::metrics as m;
use tailguard_core::pipeline::{CheckpointStore, EventStore};
use tailguard_scanner::notify::LogNotifier;
use tailguard_scanner::{
    Alert, AlertEvaluator, CycleAggregator, DispatchReport, MemoryStore, NotifierSet,
    PatternLoader, ScannerConfig, SessionPool, SqliteStore,
};

use crate::metrics_server;

/// Checkpoint and event persistence backing the daemon.
pub enum StoreBackend {
    /// Durable SQLite store with optional CSV mirror.
    Sqlite(SqliteStore),
    /// In-memory store used by `--dry-run`.
    Memory(MemoryStore),
}

impl StoreBackend {
    pub fn checkpoints(&self) -> &dyn CheckpointStore {
        match self {
            Self::Sqlite(store) => store,
            Self::Memory(store) => store,
        }
    }

    pub fn events(&self) -> &dyn EventStore {
        match self {
            Self::Sqlite(store) => store,
            Self::Memory(store) => store,
        }
    }

    /// Backend name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Memory(_) => "memory",
        }
    }

    /// Compact the store. No-op for the in-memory backend.
    pub fn maintenance(&self) -> Result<(), StorageError> {
        match self {
            Self::Sqlite(store) => store.maintenance(),
            Self::Memory(_) => Ok(()),
        }
    }
}

/// Result of one scheduled cycle: the report plus whatever alerting happened.
#[derive(Debug, Clone)]
pub struct CycleRun {
    pub report: CycleReport,
    pub alert: Option<Alert>,
    pub dispatch: Option<DispatchReport>,
}

/// Central coordinator for the tailguard daemon.
pub struct Orchestrator {
    config: TailguardConfig,
    aggregator: CycleAggregator,
    evaluator: AlertEvaluator,
    notifiers: NotifierSet,
    store: StoreBackend,
    pool: Option<SessionPool>,
    start_time: Instant,
}

impl Orchestrator {
    /// Build the orchestrator from a configuration file path.
    ///
    /// Loads the TOML file, applies environment overrides and validates.
    pub async fn build(config_path: &Path, dry_run: bool) -> Result<Self> {
        let config = TailguardConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config, dry_run).await
    }

    /// Build the orchestrator from an already-validated configuration.
    ///
    /// With `dry_run` set, checkpoints and events stay in memory and the only
    /// alert channel is the log channel.
    pub async fn build_from_config(config: TailguardConfig, dry_run: bool) -> Result<Self> {
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let scanner_config = ScannerConfig::from_core(&config);
        let registry = PatternLoader::registry_for(&scanner_config)
            .await
            .map_err(|e| anyhow::anyhow!("failed to build pattern registry: {}", e))?;
        let evaluator = AlertEvaluator::new(scanner_config.thresholds.clone());
        let pool = build_session_pool(&scanner_config)?;
        let aggregator = CycleAggregator::new(scanner_config, Arc::new(registry))
            .map_err(|e| anyhow::anyhow!("failed to build scan cycle: {}", e))?;

        let (store, notifiers) = if dry_run {
            let mut notifiers = NotifierSet::new();
            notifiers.push(LogNotifier::new());
            (StoreBackend::Memory(MemoryStore::new()), notifiers)
        } else {
            std::fs::create_dir_all(&config.general.data_dir).map_err(|e| {
                anyhow::anyhow!(
                    "failed to create data directory {}: {}",
                    config.general.data_dir,
                    e
                )
            })?;
            let store = SqliteStore::from_config(&config.storage)
                .map_err(|e| anyhow::anyhow!("failed to open event store: {}", e))?;
            let notifiers = NotifierSet::from_config(&config.alerts)
                .map_err(|e| anyhow::anyhow!("failed to build alert channels: {}", e))?;
            (StoreBackend::Sqlite(store), notifiers)
        };

        if notifiers.is_empty() {
            tracing::warn!("no alert channels enabled; threshold alerts will be dropped");
        }

        tracing::info!(
            mode = %config.scan.mode,
            interval_secs = config.scan.interval_secs,
            store = store.name(),
            channels = ?notifiers.channel_names(),
            remote_hosts = config.remote_hosts.len(),
            dry_run,
            "orchestrator built"
        );

        Ok(Self {
            config,
            aggregator,
            evaluator,
            notifiers,
            store,
            pool,
            start_time: Instant::now(),
        })
    }

    /// Run one full scan cycle, then evaluate thresholds and dispatch.
    ///
    /// The cycle itself is blocking file/SFTP I/O and runs on the current
    /// worker via `block_in_place`, so a multi-threaded runtime is required.
    pub async fn run_cycle(&self) -> CycleRun {
        let outcome = tokio::task::block_in_place(|| {
            self.aggregator.run_cycle(
                self.store.checkpoints(),
                self.store.events(),
                self.pool.as_ref(),
            )
        });

        let alert = self.evaluator.evaluate(&outcome.summary);
        let dispatch = match alert {
            Some(ref alert) => {
                tracing::info!(
                    cycle_id = %outcome.report.cycle_id,
                    triggered = alert.triggered.len(),
                    "threshold alert raised"
                );
                let dispatch = self.notifiers.dispatch(alert).await;
                if !dispatch.all_delivered() {
                    tracing::warn!(
                        cycle_id = %outcome.report.cycle_id,
                        failed = dispatch.failed.len(),
                        delivered = dispatch.delivered.len(),
                        "alert not delivered on every channel"
                    );
                }
                Some(dispatch)
            }
            None => None,
        };

        CycleRun {
            report: outcome.report,
            alert,
            dispatch,
        }
    }

    /// Run cycles on the configured interval until `cancel` fires.
    ///
    /// The first cycle starts immediately. A cycle that overruns the interval
    /// delays the next tick instead of queueing extra cycles. Cancellation is
    /// observed between cycles; an in-flight cycle always completes.
    ///
    /// Returns the number of cycles completed.
    pub async fn run_until(&self, cancel: CancellationToken) -> usize {
        let mut scan = tokio::time::interval(self.aggregator.config().interval());
        scan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut maintenance = self.maintenance_period().map(|period| {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval
        });

        let mut cycles = 0usize;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(cycles, "scan loop stopping");
                    break;
                }
                _ = scan.tick() => {
                    self.run_cycle().await;
                    cycles += 1;
                }
                _ = async {
                    match maintenance.as_mut() {
                        Some(interval) => interval.tick().await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.run_maintenance();
                }
            }
        }
        cycles
    }

    /// Start the daemon and block until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "tailguard-daemon starting");

        let pid_file = self.config.general.pid_file.clone();
        if !pid_file.is_empty() {
            write_pid_file(Path::new(&pid_file))?;
        }

        record_daemon_metrics();

        let cancel = CancellationToken::new();
        let uptime = spawn_uptime_updater(self.start_time, cancel.clone());

        let signal_cancel = cancel.clone();
        let signal_task = tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
            signal_cancel.cancel();
        });

        tracing::info!("tailguard-daemon running");
        let cycles = self.run_until(cancel.clone()).await;

        cancel.cancel();
        signal_task.abort();
        if let Err(e) = uptime.await {
            tracing::debug!(error = %e, "uptime updater did not stop cleanly");
        }

        self.shutdown();

        if !pid_file.is_empty() {
            remove_pid_file(Path::new(&pid_file));
        }

        tracing::info!(
            cycles,
            uptime_secs = self.start_time.elapsed().as_secs(),
            "tailguard-daemon shut down"
        );
        Ok(())
    }

    /// Release remote sessions. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(ref pool) = self.pool {
            let released = pool.release_all();
            tracing::info!(released, "remote sessions released");
        }
    }

    /// Run store maintenance now, recording the outcome.
    pub fn run_maintenance(&self) {
        let result = tokio::task::block_in_place(|| self.store.maintenance());
        let label = match result {
            Ok(()) => "ok",
            Err(ref e) => {
                tracing::warn!(store = self.store.name(), error = %e, "store maintenance failed");
                "error"
            }
        };
        metrics::counter!(m::STORE_MAINTENANCE_TOTAL, m::LABEL_RESULT => label).increment(1);
    }

    fn maintenance_period(&self) -> Option<Duration> {
        match self.config.storage.maintenance_interval_hours {
            0 => None,
            hours => Some(Duration::from_secs(hours.saturating_mul(3600))),
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &TailguardConfig {
        &self.config
    }

    /// Get a reference to the active store.
    pub fn store(&self) -> &StoreBackend {
        &self.store
    }

    /// Get a reference to the alert channels.
    pub fn notifiers(&self) -> &NotifierSet {
        &self.notifiers
    }

    /// Whether a remote session pool was created.
    pub fn has_session_pool(&self) -> bool {
        self.pool.is_some()
    }
}

/// Create the SFTP session pool when remote hosts are scanned.
fn build_session_pool(config: &ScannerConfig) -> Result<Option<SessionPool>> {
    if !config.scan_remote || config.remote_hosts.is_empty() {
        return Ok(None);
    }

    #[cfg(feature = "sftp")]
    {
        use tailguard_scanner::source::SftpConnector;
        Ok(Some(SessionPool::new(SftpConnector::new(
            config.remote_read_timeout(),
        ))))
    }
    #[cfg(not(feature = "sftp"))]
    {
        Err(anyhow::anyhow!(
            "scan mode '{}' needs remote hosts, but tailguard-daemon was built without the 'sftp' feature",
            if config.scan_local { "mixed" } else { "remote" }
        ))
    }
}

/// Wait for SIGTERM or SIGINT.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent two daemons from advancing the same checkpoints.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
pub fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if !file.metadata()?.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file",
            path.display()
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    writeln!(file, "{}", pid)?;

    tracing::info!(pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on shutdown. Failure is logged, not returned.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file");
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

fn record_daemon_metrics() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Periodically refresh the uptime gauge until `cancel` fires.
fn spawn_uptime_updater(
    start_time: Instant,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(start_time.elapsed().as_secs() as f64);
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_maintenance_is_noop() {
        let store = StoreBackend::Memory(MemoryStore::new());
        assert!(store.maintenance().is_ok());
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn sqlite_backend_maintenance_runs() {
        let store = StoreBackend::Sqlite(SqliteStore::open_in_memory().unwrap());
        assert!(store.maintenance().is_ok());
        assert_eq!(store.name(), "sqlite");
    }
}
