//! CLI argument definitions for hb.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bot` | Run the Telegram echo bot (long polling) |
//! | `convert` | Convert a datetime between formats and timezones |
//! | `log` | Emit one log line at a level |
//! | `event` | Append one JSON event to the event log |
//! | `calc` | Basic arithmetic |
//! | `age` | Validate an age |
//! | `discount` | Apply a membership discount |
//! | `show-config` | Print a config file |
//!
//! Failures print a three-line message on stdout and exit with 2 (bad input),
//! 3 (business rule), 1 (system or unexpected) or 130 (Ctrl-C).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hb_core::timeconv::ConvertRequest;

/// hellobot: Telegram echo bot and small command-line tools
#[derive(Debug, Parser)]
#[command(name = "hb", version, about = "Telegram echo bot and small command-line tools")]
pub struct Cli {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL). Overrides LOG_LEVEL.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write logs to this file. Overrides LOG_FILE.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 🤖 Run the Telegram bot until Ctrl-C.
    ///
    /// Needs TELEGRAM_BOT_TOKEN. Logs go to logs/bot.log unless LOG_FILE or
    /// --log-file says otherwise.
    Bot,

    /// 🕒 Convert a datetime between formats and timezones.
    ///
    /// # Examples
    ///
    ///   hb convert --dt "2025-09-26 10:00" --src-fmt "%Y-%m-%d %H:%M" --dst-fmt "%Y-%m-%d %H:%M"
    ///   hb convert --dt 2025-03-30 --src-fmt %Y-%m-%d --dst-fmt "%d/%m %H:%M" --dst-tz Europe/Paris
    Convert(ConvertRequest),

    /// 📝 Emit one log line at the given level.
    Log(LogArgs),

    /// 📦 Append one JSON event to the event log.
    Event(EventArgs),

    /// 🧮 Basic arithmetic.
    ///
    /// # Examples
    ///
    ///   hb calc add 1 2
    ///   hb calc div 1 0
    ///   hb calc sum 1 2 3.5
    ///   hb calc even 42
    Calc(CalcArgs),

    /// 🎂 Validate an age typed by a user.
    Age(AgeArgs),

    /// 💸 Apply a membership-tier discount (vip, pro, normal).
    Discount(DiscountArgs),

    /// 📄 Print a config file.
    ShowConfig(ShowConfigArgs),
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, default_value = "INFO")]
    pub level: String,

    #[arg(long)]
    pub message: String,

    /// Write to this file as well as the console.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Roll the file over: never, daily or hourly. Overrides LOG_ROTATION.
    #[arg(long)]
    pub rotation: Option<String>,

    /// Rotated files to keep. Overrides LOG_MAX_FILES.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub backup_count: Option<u16>,
}

#[derive(Debug, Args)]
pub struct EventArgs {
    #[arg(long)]
    pub name: String,

    /// JSON payload, e.g. '{"user": 1}'
    #[arg(long, default_value = "{}")]
    pub payload: String,

    /// Event log path. Overrides EVENT_LOG_PATH.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CalcOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// Sum of any number of values.
    Sum,
    /// Whether one integer is even.
    Even,
}

#[derive(Debug, Args)]
pub struct CalcArgs {
    #[arg(value_enum)]
    pub op: CalcOp,

    /// Operands; negative numbers are accepted.
    #[arg(allow_negative_numbers = true)]
    pub values: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AgeArgs {
    pub text: String,
}

#[derive(Debug, Args)]
pub struct DiscountArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub price: f64,

    #[arg(long)]
    pub tier: String,
}

#[derive(Debug, Args)]
pub struct ShowConfigArgs {
    pub path: PathBuf,
}
