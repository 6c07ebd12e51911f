use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing::Subscriber;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "tracklog.log";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Files removed by the start-up retention sweep and the problems it hit.
#[derive(Debug, Default, Clone)]
pub struct RetentionReport {
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Keeps the non-blocking file writer alive; drop it to flush.
pub struct LoggingGuard {
    worker_guard: Option<WorkerGuard>,
    run_id: String,
    retention: RetentionReport,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn writes_to_file(&self) -> bool {
        self.worker_guard.is_some()
    }

    pub fn retention(&self) -> &RetentionReport {
        &self.retention
    }

    fn announce(&self, config: &LoggingConfig) {
        tracing::info!(
            target: "logging",
            run_id = %self.run_id,
            dir = ?config.dir,
            filter = %config.filter,
            rotation = ?config.rotation,
            retention_days = config.retention_days,
            expired_files_removed = self.retention.removed.len(),
            "logging_initialized"
        );
        for warning in &self.retention.warnings {
            tracing::warn!(target: "logging", warning = %warning, "logging_retention_warning");
        }
    }
}

/// Installs the process-wide subscriber. Meant for hosts that hand logging
/// over to this crate; it fails if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    subscriber
        .try_init()
        .context("failed to initialize tracing subscriber")?;
    guard.announce(config);
    Ok(guard)
}

/// Runs `scope` with the configured subscriber as the thread's default,
/// leaving any global subscriber untouched. File output is flushed before
/// this returns.
pub fn with_scoped_tracing<T>(
    config: &LoggingConfig,
    scope: impl FnOnce(&LoggingGuard) -> T,
) -> Result<T> {
    let (subscriber, guard) = build_subscriber(config)?;
    Ok(tracing::subscriber::with_default(subscriber, || {
        guard.announce(config);
        scope(&guard)
    }))
}

fn build_subscriber(
    config: &LoggingConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LoggingGuard)> {
    if config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    let filter = build_env_filter(&config.filter)?;

    let mut retention = RetentionReport::default();
    let mut worker_guard = None;
    let file_layer = match config.dir.as_deref() {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create logging directory {}", dir.display()))?;
            retention = sweep_expired(dir, config.retention_days, SystemTime::now());

            let appender = match config.rotation {
                LoggingRotation::Daily => rolling::daily(dir, LOG_FILE_PREFIX),
                LoggingRotation::Hourly => rolling::hourly(dir, LOG_FILE_PREFIX),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            worker_guard = Some(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_target(true)
                    .with_current_span(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    let stderr_layer = config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    let subscriber = tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer);
    let guard = LoggingGuard {
        worker_guard,
        run_id: Uuid::now_v7().to_string(),
        retention,
    };
    Ok((subscriber, guard))
}

fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter).with_context(|| format!("failed to parse logging.filter '{filter}'"))
}

/// Removes this crate's log files last modified `retention_days` or more
/// before `now`. Other files in the directory are never touched.
fn sweep_expired(dir: &Path, retention_days: usize, now: SystemTime) -> RetentionReport {
    let mut report = RetentionReport::default();
    let retention = Duration::from_secs((retention_days as u64).saturating_mul(SECONDS_PER_DAY));
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            report
                .warnings
                .push(format!("failed to scan {}: {err}", dir.display()));
            return report;
        }
    };

    for path in entries.flatten().map(|entry| entry.path()) {
        if !is_log_file(&path) {
            continue;
        }
        match last_modified(&path) {
            Ok(modified) if modified > cutoff => {}
            Ok(_) => match fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(err) => report
                    .warnings
                    .push(format!("failed to remove {}: {err}", path.display())),
            },
            Err(err) => report
                .warnings
                .push(format!("failed to read mtime of {}: {err}", path.display())),
        }
    }
    report
}

fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

fn last_modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}
