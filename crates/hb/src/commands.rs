use std::sync::Arc;

use tracing::{debug, error, info, trace, warn, Level};

use hb_core::{
    config::Config,
    event_log::EventLog,
    failure::{AppError, Failure},
    math::{self, parse_number, Operation},
    rules,
};

use crate::cli::{
    AgeArgs, CalcArgs, CalcOp, Cli, Command, DiscountArgs, EventArgs, LogArgs, ShowConfigArgs,
};

/// Run one invocation. Output goes to stdout; logs go to stderr and the log
/// file.
pub async fn run(cli: Cli, cfg: Arc<Config>) -> Result<(), Failure> {
    match cli.command {
        Command::Bot => bot(cfg).await,
        Command::Convert(req) => {
            let converted = req.run(&cfg)?;
            info!(dt = %req.dt, src_fmt = %req.src_fmt, dst_fmt = %req.dst_fmt, "converted datetime");
            println!("{}", converted.to_lines());
            Ok(())
        }
        Command::Log(args) => log_line(&args),
        Command::Event(args) => event(&cfg, &args),
        Command::Calc(args) => calc(&args),
        Command::Age(AgeArgs { text }) => {
            let age = rules::parse_age(&text)?;
            println!("age: {age}");
            Ok(())
        }
        Command::Discount(DiscountArgs { price, tier }) => {
            let total = rules::apply_discount(price, &tier)?;
            println!("final price: {total:.2}");
            Ok(())
        }
        Command::ShowConfig(ShowConfigArgs { path }) => {
            let text = rules::read_config_text(&path)?;
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

async fn bot(cfg: Arc<Config>) -> Result<(), Failure> {
    cfg.require_bot_token().map_err(|e| {
        AppError::system(e.to_string()).with_hint("set TELEGRAM_BOT_TOKEN in the environment or .env")
    })?;

    info!("starting bot");
    hb_telegram::router::run_polling(cfg)
        .await
        .map_err(Failure::from_anyhow)
}

fn log_line(args: &LogArgs) -> Result<(), Failure> {
    let level = crate::parse_level(&args.level)?;
    let critical = args.level.trim().eq_ignore_ascii_case("CRITICAL");
    let message = args.message.as_str();

    if level == Level::TRACE {
        trace!("{message}");
    } else if level == Level::DEBUG {
        debug!("{message}");
    } else if level == Level::INFO {
        info!("{message}");
    } else if level == Level::WARN {
        warn!("{message}");
    } else if critical {
        error!(critical = true, "{message}");
    } else {
        error!("{message}");
    }

    if let Some(path) = &args.file {
        println!("→ written to: {}", path.display());
    }
    Ok(())
}

fn event(cfg: &Config, args: &EventArgs) -> Result<(), Failure> {
    let payload: serde_json::Value = serde_json::from_str(&args.payload).map_err(|e| {
        AppError::user_input(format!("payload is not valid JSON: {e}"))
            .with_hint(r#"pass a JSON value, e.g. --payload '{"user": 1}'"#)
    })?;

    let log = EventLog::new(args.file.clone().unwrap_or_else(|| cfg.event_log_path.clone()));
    let record = log.write(&args.name, payload).map_err(|e| {
        AppError::system(format!("failed to write event log {}: {e}", log.path().display()))
    })?;

    info!(event = %record.event, path = %log.path().display(), "event written");
    println!("{}", serde_json::to_string(&record)?);
    println!("→ written to: {}", log.path().display());
    Ok(())
}

/// Magnitude at which an f64 no longer fits an i64 (2^63).
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn calc(args: &CalcArgs) -> Result<(), Failure> {
    let values = args
        .values
        .iter()
        .map(|v| parse_number(v))
        .collect::<Result<Vec<f64>, AppError>>()?;

    let binary = match args.op {
        CalcOp::Add => Some(Operation::Add),
        CalcOp::Sub => Some(Operation::Sub),
        CalcOp::Mul => Some(Operation::Mul),
        CalcOp::Div => Some(Operation::Div),
        CalcOp::Pow => Some(Operation::Pow),
        CalcOp::Sum | CalcOp::Even => None,
    };

    match (args.op, binary, values.as_slice()) {
        (_, Some(op), [a, b]) => {
            let result = op.apply(*a, *b).map_err(AppError::from)?;
            println!("{a} {op} {b} = {result}");
        }
        (_, Some(_), _) => {
            return Err(AppError::user_input(format!(
                "expected 2 numbers, got {}",
                values.len()
            ))
            .with_hint("e.g. hb calc add 1 2")
            .into())
        }
        (CalcOp::Sum, _, values) => println!("{}", math::sum(values)),
        (_, _, [n]) if n.fract() == 0.0 && n.abs() < I64_BOUND => {
            let n = *n as i64;
            let parity = if math::is_even(n) { "even" } else { "odd" };
            println!("{n} is {parity}");
        }
        (_, _, [n]) if n.fract() == 0.0 => {
            return Err(AppError::user_input(format!("integer out of range: {n}"))
                .with_hint("even takes an integer between -2^63 and 2^63")
                .into())
        }
        _ => {
            return Err(AppError::user_input("even takes exactly one integer")
                .with_hint("e.g. hb calc even 42")
                .into())
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hb_core::failure::ErrorKind;

    use super::*;

    fn calc_kind(op: CalcOp, values: &[&str]) -> Option<ErrorKind> {
        let args = CalcArgs {
            op,
            values: values.iter().map(|v| v.to_string()).collect(),
        };
        calc(&args)
            .err()
            .and_then(|f| f.app_error().map(AppError::kind))
    }

    #[test]
    fn calc_accepts_well_formed_input() {
        assert_eq!(calc_kind(CalcOp::Add, &["1", "2"]), None);
        assert_eq!(calc_kind(CalcOp::Pow, &["-2", "3"]), None);
        assert_eq!(calc_kind(CalcOp::Sum, &[]), None);
        assert_eq!(calc_kind(CalcOp::Sum, &["1", "2", "3.5"]), None);
        assert_eq!(calc_kind(CalcOp::Even, &["42"]), None);
    }

    #[test]
    fn calc_error_kinds() {
        assert_eq!(calc_kind(CalcOp::Div, &["1", "0"]), Some(ErrorKind::DomainRule));
        assert_eq!(calc_kind(CalcOp::Add, &["1"]), Some(ErrorKind::UserInput));
        assert_eq!(calc_kind(CalcOp::Add, &["1", "two"]), Some(ErrorKind::UserInput));
        assert_eq!(calc_kind(CalcOp::Even, &["1.5"]), Some(ErrorKind::UserInput));
        assert_eq!(calc_kind(CalcOp::Even, &["1", "2"]), Some(ErrorKind::UserInput));
    }

    #[test]
    fn even_rejects_integers_beyond_i64() {
        assert_eq!(calc_kind(CalcOp::Even, &["1e20"]), Some(ErrorKind::UserInput));
        assert_eq!(calc_kind(CalcOp::Even, &["-1e20"]), Some(ErrorKind::UserInput));
        assert_eq!(calc_kind(CalcOp::Even, &["4503599627370496"]), None);
    }

    #[test]
    fn log_rejects_unknown_level() {
        let args = LogArgs {
            level: "LOUD".to_string(),
            message: "hi".to_string(),
            file: None,
            rotation: None,
            backup_count: None,
        };
        let failure = log_line(&args).unwrap_err();
        assert_eq!(failure.app_error().map(AppError::kind), Some(ErrorKind::UserInput));
    }

    #[test]
    fn event_rejects_bad_json_and_writes_good_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let cfg = Config::default();

        let bad = EventArgs {
            name: "signup".to_string(),
            payload: "{not json".to_string(),
            file: Some(path.clone()),
        };
        let failure = event(&cfg, &bad).unwrap_err();
        assert_eq!(failure.app_error().map(AppError::kind), Some(ErrorKind::UserInput));
        assert!(!path.exists());

        let good = EventArgs {
            payload: r#"{"user": 1}"#.to_string(),
            ..bad
        };
        event(&cfg, &good).unwrap();
        let line = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(v["event"], "signup");
        assert_eq!(v["payload"]["user"], 1);
    }
}
