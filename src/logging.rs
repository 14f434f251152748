use std::{
    fs::{self, DirEntry},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing::Subscriber;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{self, RollingFileAppender},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{Config, LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "echos-gate.log";

/// Targets the gate emits on. Decisions and posts go to `gate`, log
/// persistence to `interaction_log`.
const GATE_TARGETS: [&str; 2] = ["gate", "interaction_log"];

pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Installs the global subscriber for one gate run and records the thresholds
/// it runs with, so every log file starts with the policy that produced it.
/// Keep the guard alive for the whole run.
pub fn init_tracing(config: &Config) -> Result<LoggingGuard> {
    let logging = &config.logging;
    if logging.dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }
    let env_filter = build_env_filter(&logging.filter)?;

    let log_dir = resolve_log_dir(&logging.dir)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;
    let purge_warnings =
        purge_expired_logs(&log_dir, LOG_FILE_PREFIX, logging.retention_days, SystemTime::now());

    let (writer, worker_guard) =
        tracing_appender::non_blocking(rolling_appender(&log_dir, &logging.rotation));

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(json_file_layer(writer, env_filter))
        .with(stderr_layer(logging))
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    let thresholds = &config.gate.thresholds;
    tracing::info!(
        target: "gate",
        run_id = %run_id,
        log_dir = %log_dir.display(),
        filter = %logging.filter,
        rotation = ?logging.rotation,
        retention_days = logging.retention_days,
        mentions_threshold = thresholds.mentions.value(),
        followers_threshold = thresholds.followers.value(),
        meme_threshold = thresholds.meme.value(),
        agent_handle = config.pipeline.agent_handle.as_deref().unwrap_or("-"),
        interaction_log = %config.interaction_log.state_path.display(),
        "gate_logging_initialized"
    );
    for warning in purge_warnings {
        tracing::warn!(target: "gate", warning = %warning, "log_retention_warning");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
        log_dir,
    })
}

fn json_file_layer<S>(writer: NonBlocking, filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter)
}

/// WARN and above from everything; with `stderr_decisions` also every gate
/// decision, since stdout carries the NDJSON stream.
fn stderr_layer<S>(logging: &LoggingConfig) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    logging.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(stderr_targets(logging.stderr_decisions))
    })
}

fn stderr_targets(decisions: bool) -> Targets {
    let targets = Targets::new().with_default(LevelFilter::WARN);
    if decisions {
        targets.with_target("gate", LevelFilter::INFO)
    } else {
        targets
    }
}

/// Parses `filter`. A filter that never names a gate target gets them at
/// `info`, so raising the global level to `warn` still keeps decisions.
fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    let filter = filter.trim();
    if filter.is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }

    let mut directives = filter.to_string();
    for target in GATE_TARGETS {
        let named = filter
            .split(',')
            .any(|directive| directive.trim().split(['=', '[']).next() == Some(target));
        if !named {
            directives.push_str(&format!(",{target}=info"));
        }
    }

    EnvFilter::try_new(&directives)
        .with_context(|| format!("failed to parse logging.filter '{filter}'"))
}

fn rolling_appender(log_dir: &Path, rotation: &LoggingRotation) -> RollingFileAppender {
    match rotation {
        LoggingRotation::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
    }
}

fn resolve_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }

    Ok(std::env::current_dir()
        .context("failed to read current working directory for logging.dir resolution")?
        .join(dir))
}

/// Removes prefixed log files last modified at or before `now - retention`.
/// Problems are returned as warnings; purging never blocks startup.
fn purge_expired_logs(
    log_dir: &Path,
    prefix: &str,
    retention_days: usize,
    now: SystemTime,
) -> Vec<String> {
    let retention = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60) as u64);
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            return vec![format!(
                "failed to scan logging directory {}: {err}",
                log_dir.display()
            )];
        }
    };

    entries
        .filter_map(|entry| {
            entry
                .map_err(|err| format!("failed to iterate logging directory entries: {err}"))
                .and_then(|entry| remove_if_expired(&entry, prefix, cutoff))
                .err()
        })
        .collect()
}

fn remove_if_expired(entry: &DirEntry, prefix: &str, cutoff: SystemTime) -> Result<(), String> {
    if !entry.file_name().to_string_lossy().starts_with(prefix) {
        return Ok(());
    }

    let path = entry.path();
    let metadata = entry
        .metadata()
        .map_err(|err| format!("failed to stat {}: {err}", path.display()))?;
    if !metadata.is_file() {
        return Ok(());
    }

    let modified = metadata
        .modified()
        .map_err(|err| format!("failed to read mtime for {}: {err}", path.display()))?;
    if modified > cutoff {
        return Ok(());
    }

    fs::remove_file(&path)
        .map_err(|err| format!("failed to remove expired log file {}: {err}", path.display()))
}
