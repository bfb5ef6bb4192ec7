use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    errors::Error,
    logging::{parse_level, LogFormat, LogRotation},
    Result,
};

/// Log file used by the bot when `LOG_FILE` is not set.
pub const DEFAULT_BOT_LOG_FILE: &str = "logs/bot.log";

/// Typed configuration, read from the environment after loading `.env`.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: Option<String>,
    pub echo_max_chars: usize,

    // Logging
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub log_rotation: LogRotation,
    /// Rotated files kept on disk; older ones are deleted. `None` keeps all.
    pub log_max_files: Option<usize>,
    pub log_format: LogFormat,
    pub event_log_path: PathBuf,

    // Datetime conversion defaults
    pub default_src_tz: String,
    pub default_dst_tz: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            echo_max_chars: 4000,
            log_level: "INFO".to_string(),
            log_file: None,
            log_rotation: LogRotation::Never,
            log_max_files: None,
            log_format: LogFormat::Text,
            event_log_path: PathBuf::from("logs/events.jsonl"),
            default_src_tz: "Asia/Taipei".to_string(),
            default_dst_tz: "UTC".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_env()
    }

    /// Build from the current process environment only.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty);
        let echo_max_chars = env_usize("ECHO_MAX_CHARS")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.echo_max_chars);

        let log_level = match env_str("LOG_LEVEL").and_then(non_empty) {
            Some(v) => check_log_level(v)?,
            None => defaults.log_level,
        };
        let log_file = env_path("LOG_FILE");
        let log_max_files = match env_str("LOG_MAX_FILES").and_then(non_empty) {
            Some(v) => Some(parse_max_files(&v)?),
            None => defaults.log_max_files,
        };
        let log_rotation = match env_str("LOG_ROTATION") {
            Some(v) => LogRotation::parse(&v)
                .ok_or_else(|| Error::Config(format!("LOG_ROTATION has unknown value: {v}")))?,
            None => defaults.log_rotation,
        };
        let log_format = match env_str("LOG_FORMAT") {
            Some(v) => LogFormat::parse(&v)
                .ok_or_else(|| Error::Config(format!("LOG_FORMAT has unknown value: {v}")))?,
            None => defaults.log_format,
        };
        let event_log_path = env_path("EVENT_LOG_PATH").unwrap_or(defaults.event_log_path);

        let default_src_tz = env_str("DEFAULT_SRC_TZ")
            .and_then(non_empty)
            .unwrap_or(defaults.default_src_tz);
        let default_dst_tz = env_str("DEFAULT_DST_TZ")
            .and_then(non_empty)
            .unwrap_or(defaults.default_dst_tz);

        Ok(Self {
            telegram_bot_token,
            echo_max_chars,
            log_level,
            log_file,
            log_rotation,
            log_max_files,
            log_format,
            event_log_path,
            default_src_tz,
            default_dst_tz,
        })
    }

    /// Bot token, required only by the bot.
    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram_bot_token.as_deref().ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn check_log_level(value: String) -> Result<String> {
    match parse_level(&value) {
        Some(_) => Ok(value),
        None => Err(Error::Config(format!("LOG_LEVEL has unknown value: {value}"))),
    }
}

fn parse_max_files(value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Config(format!("LOG_MAX_FILES must be a positive integer: {value}")))
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_str(key).and_then(non_empty).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
