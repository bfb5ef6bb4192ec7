//! Datetime parsing, timezone conversion and formatting.
//!
//! Formats use strftime syntax (`%Y-%m-%d %H:%M`). All failures caused by the
//! caller's input come back as [`AppError::UserInput`].

use std::fmt::Write as _;

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::{config::Config, failure::AppError};

const TZ_HINT: &str = "use an IANA timezone name such as Asia/Taipei or UTC";
const FORMAT_HINT: &str = "make --dt match --src-fmt, e.g. 2025-09-26 10:00 with %Y-%m-%d %H:%M";

/// Arguments of a conversion, shared by the CLI and the bot's `/convert`.
#[derive(Clone, Debug, PartialEq, Eq, clap::Args)]
pub struct ConvertRequest {
    /// Datetime text to convert
    #[arg(long)]
    pub dt: String,

    /// Format of --dt (e.g. '%Y-%m-%d %H:%M')
    #[arg(long)]
    pub src_fmt: String,

    /// Output format (e.g. '%Y-%m-%d %H:%M')
    #[arg(long)]
    pub dst_fmt: String,

    /// Source timezone [default: DEFAULT_SRC_TZ or Asia/Taipei]
    #[arg(long)]
    pub src_tz: Option<String>,

    /// Target timezone [default: DEFAULT_DST_TZ or UTC]
    #[arg(long)]
    pub dst_tz: Option<String>,
}

impl ConvertRequest {
    /// Run the conversion, filling missing timezones from `cfg`.
    pub fn run(&self, cfg: &Config) -> Result<Converted, AppError> {
        convert(
            &self.dt,
            &self.src_fmt,
            &self.dst_fmt,
            self.src_tz.as_deref().unwrap_or(&cfg.default_src_tz),
            self.dst_tz.as_deref().unwrap_or(&cfg.default_dst_tz),
        )
    }
}

/// Result of [`convert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converted {
    /// Source instant in RFC 3339 with its offset.
    pub original: String,
    /// Target instant rendered with the requested format.
    pub converted: String,
}

impl Converted {
    pub fn to_lines(&self) -> String {
        format!("original: {}\nconverted: {}", self.original, self.converted)
    }
}

/// Parse `dt` in `src_tz` with `src_fmt`, move it to `dst_tz`, format with `dst_fmt`.
pub fn convert(
    dt: &str,
    src_fmt: &str,
    dst_fmt: &str,
    src_tz: &str,
    dst_tz: &str,
) -> Result<Converted, AppError> {
    let source_tz = parse_tz(src_tz)?;
    let dest_tz = parse_tz(dst_tz)?;

    let aware = parse_dt(dt, src_fmt, source_tz)?;
    let moved = to_timezone(&aware, dest_tz);

    Ok(Converted {
        original: aware.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        converted: format_dt(&moved, dst_fmt)?,
    })
}

/// Like [`convert`] but only returns the formatted string; `dst_tz = None`
/// keeps the source timezone.
pub fn convert_format(
    dt: &str,
    src_fmt: &str,
    dst_fmt: &str,
    src_tz: &str,
    dst_tz: Option<&str>,
) -> Result<String, AppError> {
    let source_tz = parse_tz(src_tz)?;
    let mut aware = parse_dt(dt, src_fmt, source_tz)?;
    if let Some(name) = dst_tz {
        aware = to_timezone(&aware, parse_tz(name)?);
    }
    format_dt(&aware, dst_fmt)
}

pub fn parse_tz(name: &str) -> Result<Tz, AppError> {
    name.trim().parse::<Tz>().map_err(|_| {
        AppError::user_input(format!("invalid timezone name: {name}")).with_hint(TZ_HINT)
    })
}

/// Parse text into a timezone-aware datetime.
///
/// Date-only formats give midnight. An ambiguous local time (DST fall-back)
/// resolves to the earlier instant; a local time skipped by DST is rejected.
pub fn parse_dt(text: &str, fmt: &str, tz: Tz) -> Result<DateTime<Tz>, AppError> {
    check_format(fmt)?;

    let naive = match NaiveDateTime::parse_from_str(text, fmt) {
        Ok(n) => n,
        Err(first) => NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| {
                AppError::user_input(format!("datetime does not match format: {first}"))
                    .with_hint(FORMAT_HINT)
            })?,
    };

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(AppError::user_input(format!(
            "local time {naive} does not exist in {tz}"
        ))),
    }
}

pub fn to_timezone<T: TimeZone>(dt: &DateTime<T>, tz: Tz) -> DateTime<Tz> {
    dt.with_timezone(&tz)
}

/// Render with a strftime format. Unknown specifiers are an input error.
pub fn format_dt(dt: &DateTime<Tz>, fmt: &str) -> Result<String, AppError> {
    check_format(fmt)?;
    let mut out = String::new();
    write!(out, "{}", dt.format(fmt))
        .map_err(|_| AppError::user_input(format!("cannot render datetime with format: {fmt}")))?;
    Ok(out)
}

pub fn now_tz(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn dt_to_unix<T: TimeZone>(dt: &DateTime<T>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}

pub fn unix_to_dt(ts: f64, tz: Tz) -> Result<DateTime<Tz>, AppError> {
    if !ts.is_finite() {
        return Err(AppError::user_input(format!("invalid unix timestamp: {ts}")));
    }
    let secs = ts.floor();
    let nanos = (((ts - secs) * 1e9).round() as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .map(|dt| dt.with_timezone(&tz))
        .ok_or_else(|| AppError::user_input(format!("unix timestamp out of range: {ts}")))
}

fn check_format(fmt: &str) -> Result<(), AppError> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(AppError::user_input(format!("invalid datetime format: {fmt}"))
            .with_hint("use strftime specifiers such as %Y-%m-%d %H:%M"));
    }
    Ok(())
}
