use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{config::Config, errors::Error, Result};

/// When the log file rolls over to a new one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogRotation {
    #[default]
    Never,
    Daily,
    Hourly,
}

impl LogRotation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "never" | "none" | "" => Some(Self::Never),
            "daily" => Some(Self::Daily),
            "hourly" => Some(Self::Hourly),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "plain" | "" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging setup, built once at process start.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: Level,
    /// Optional log file; console output always goes to stderr.
    pub file: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Rotated files to keep; older ones are deleted on rollover.
    pub max_files: Option<usize>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: None,
            rotation: LogRotation::Never,
            max_files: None,
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            level: parse_level(&cfg.log_level).unwrap_or(Level::INFO),
            file: cfg.log_file.clone(),
            rotation: cfg.log_rotation,
            max_files: cfg.log_max_files,
            format: cfg.log_format,
        }
    }
}

/// Map a level name onto a tracing level.
///
/// Accepts the classic names too: `WARNING` is `WARN`, `CRITICAL` is `ERROR`.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" | "CRITICAL" => Some(Level::ERROR),
        _ => None,
    }
}

/// Keeps the file writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

impl LogGuard {
    /// Guard for a process that never initialised file logging.
    pub fn noop() -> Self {
        Self { _file: None }
    }
}

/// Initialize logging/tracing for the process.
///
/// `RUST_LOG` overrides the configured level. Call once; a second call fails
/// with [`Error::Config`].
pub fn init(service_name: &str, cfg: &LogConfig) -> Result<LogGuard> {
    let level = cfg.level.as_str().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},{service_name}={level},hb_core={level},hb_telegram={level},teloxide=warn,hyper=warn,reqwest=warn"
        ))
    });

    let console = match cfg.format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (file_layer, file_guard) = match &cfg.file {
        Some(path) => {
            let appender = file_appender(path, cfg.rotation, cfg.max_files)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            let layer = match cfg.format {
                LogFormat::Text => layer.boxed(),
                LogFormat::Json => layer.json().boxed(),
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialised: {e}")))?;

    Ok(LogGuard { _file: file_guard })
}

/// Open the log file, creating its directory.
///
/// Rotated files are named `<name>.<date>`; with `max_files` set, only the
/// newest ones survive a rollover.
fn file_appender(
    path: &Path,
    rotation: LogRotation,
    max_files: Option<usize>,
) -> Result<RollingFileAppender> {
    let (dir, name) = split_log_path(path)?;
    std::fs::create_dir_all(&dir)?;

    let mut builder = RollingFileAppender::builder()
        .rotation(match rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
        })
        .filename_prefix(name.to_string_lossy());
    if let Some(n) = max_files {
        builder = builder.max_log_files(n);
    }

    builder
        .build(&dir)
        .map_err(|e| Error::Config(format!("cannot open log file {}: {e}", path.display())))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let name = path.file_name().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "log file path has no file name".to_string(),
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}
