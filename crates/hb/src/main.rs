mod cli;
mod commands;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;

use hb_core::{
    config::{Config, DEFAULT_BOT_LOG_FILE},
    failure::{AppError, Failure},
    logging::{self, LogConfig, LogGuard, LogRotation},
    report,
};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (cfg, guard) = match setup(&cli) {
        Ok(v) => v,
        Err(failure) => report::report_and_exit(failure, LogGuard::noop()),
    };

    match report::run_until_interrupted(commands::run(cli, cfg)).await {
        Ok(()) => {
            drop(guard);
            ExitCode::SUCCESS
        }
        Err(failure) => report::report_and_exit(failure, guard),
    }
}

/// Load config and start logging. Runs before anything can be logged, so
/// failures here are reported with no log sink.
fn setup(cli: &Cli) -> Result<(Arc<Config>, LogGuard), Failure> {
    let cfg = Config::load().map_err(|e| {
        AppError::system(e.to_string()).with_hint("check the environment and the .env file")
    })?;

    let log_cfg = log_config(cli, &cfg)?;
    let guard = logging::init("hb", &log_cfg)
        .map_err(|e| AppError::system(format!("failed to start logging: {e}")))?;

    Ok((Arc::new(cfg), guard))
}

/// Command-line flags win over the environment.
fn log_config(cli: &Cli, cfg: &Config) -> Result<LogConfig, AppError> {
    let mut log_cfg = LogConfig::from_config(cfg);

    if let Some(name) = &cli.log_level {
        log_cfg.level = parse_level(name)?;
    }
    if let Some(path) = &cli.log_file {
        log_cfg.file = Some(path.clone());
    }

    match &cli.command {
        Command::Bot if log_cfg.file.is_none() => {
            log_cfg.file = Some(DEFAULT_BOT_LOG_FILE.into());
        }
        // The demo line is emitted at its own level and lands in its own file.
        // A bad level is reported by the command itself.
        Command::Log(args) => {
            if let Ok(level) = parse_level(&args.level) {
                log_cfg.level = log_cfg.level.max(level);
            }
            if args.file.is_some() {
                log_cfg.file = args.file.clone();
            }
            if let Some(name) = &args.rotation {
                log_cfg.rotation = LogRotation::parse(name).ok_or_else(|| {
                    AppError::user_input(format!("unknown rotation: {name}"))
                        .with_hint("use never, daily or hourly")
                })?;
            }
            if let Some(n) = args.backup_count {
                log_cfg.max_files = Some(usize::from(n));
            }
        }
        _ => {}
    }

    Ok(log_cfg)
}

pub(crate) fn parse_level(name: &str) -> Result<tracing::Level, AppError> {
    logging::parse_level(name).ok_or_else(|| {
        AppError::user_input(format!("unknown log level: {name}"))
            .with_hint("use DEBUG, INFO, WARNING, ERROR or CRITICAL")
    })
}

#[cfg(test)]
mod tests {
    use hb_core::failure::ErrorKind;

    use super::*;

    fn log_cfg_for(args: &[&str]) -> Result<LogConfig, AppError> {
        let cli = Cli::try_parse_from(args).unwrap();
        log_config(&cli, &Config::default())
    }

    #[test]
    fn log_command_sets_rotation_and_backup_count() {
        let cfg = log_cfg_for(&[
            "hb", "log", "--message", "m", "--file", "app.log", "--rotation", "daily",
            "--backup-count", "5",
        ])
        .unwrap();
        assert_eq!(cfg.file.as_deref(), Some(std::path::Path::new("app.log")));
        assert_eq!(cfg.rotation, LogRotation::Daily);
        assert_eq!(cfg.max_files, Some(5));
    }

    #[test]
    fn unknown_rotation_is_user_input() {
        let err = log_cfg_for(&["hb", "log", "--message", "m", "--rotation", "weekly"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserInput);
    }

    #[test]
    fn zero_backup_count_is_refused_by_the_parser() {
        assert!(Cli::try_parse_from(["hb", "log", "--message", "m", "--backup-count", "0"]).is_err());
    }

    #[test]
    fn bot_defaults_to_its_log_file() {
        let cfg = log_cfg_for(&["hb", "bot"]).unwrap();
        assert_eq!(cfg.file, Some(std::path::PathBuf::from(DEFAULT_BOT_LOG_FILE)));
    }
}
