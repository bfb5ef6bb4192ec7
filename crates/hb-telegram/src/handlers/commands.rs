use clap::Parser;

use hb_core::{
    failure::{AppError, Failure},
    math::{parse_number, Operation},
    messaging::ReplyChannel,
    timeconv::ConvertRequest,
};

use crate::router::AppState;

const START_TEXT: &str = "👋 Hello! I am hellobot.\nSend me any text and I will echo it back.\nSend /help for the command list.";

const HELP_TEXT: &str = "📋 Commands:\n\
/start - Say hello\n\
/ping - Health check\n\
/help - Show this message\n\
/convert --dt <text> --src-fmt <fmt> --dst-fmt <fmt> [--src-tz <tz>] [--dst-tz <tz>] - Convert a datetime\n\
/calc <a> <op> <b> - Calculate (+ - * / ^)\n\n\
Any other text is echoed back.";

const CONVERT_USAGE: &str =
    "usage: /convert --dt \"2025-09-26 10:00\" --src-fmt \"%Y-%m-%d %H:%M\" --dst-fmt \"%Y-%m-%d %H:%M\" [--src-tz Asia/Taipei] [--dst-tz UTC]";

const CALC_USAGE: &str = "usage: /calc <a> <op> <b>, e.g. /calc 6 * 7";

/// Split `/cmd@botname rest` into the lowercase command name and the rest.
///
/// Returns `None` when `text` is not a command.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    Some((cmd, rest))
}

/// Split command arguments on whitespace, keeping quoted runs together.
///
/// Single and double quotes are both accepted; a backslash escapes the next
/// character inside double quotes.
pub fn split_args(text: &str) -> Result<Vec<String>, AppError> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => {
                if let Some(next) = chars.next() {
                    cur.push(next);
                }
            }
            Some(_) => cur.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    out.push(std::mem::take(&mut cur));
                    in_word = false;
                }
            }
            None => {
                cur.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(AppError::user_input("unterminated quote in arguments")
            .with_hint("close every opening quote"));
    }
    if in_word {
        out.push(cur);
    }
    Ok(out)
}

#[derive(Debug, Parser)]
#[command(
    name = "/convert",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct ConvertCommand {
    #[command(flatten)]
    request: ConvertRequest,
}

pub(super) async fn handle_command(
    state: &AppState,
    reply: &dyn ReplyChannel,
    cmd: &str,
    args: &str,
) -> Result<(), Failure> {
    match cmd {
        "start" => reply.reply(START_TEXT).await?,
        "ping" => reply.reply("Pong!").await?,
        "help" => reply.reply(HELP_TEXT).await?,
        "convert" => {
            let text = convert(state, args)?;
            reply.reply(&text).await?;
        }
        "calc" => {
            let text = calc(args)?;
            reply.reply(&text).await?;
        }
        other => {
            return Err(AppError::user_input(format!("unknown command: /{other}"))
                .with_hint("send /help for the command list")
                .into())
        }
    }
    Ok(())
}

fn convert(state: &AppState, args: &str) -> Result<String, AppError> {
    let argv = split_args(args)?;
    let parsed = ConvertCommand::try_parse_from(argv).map_err(|e| {
        let reason = e.kind().as_str().unwrap_or("invalid arguments");
        AppError::user_input(format!("/convert: {reason}")).with_hint(CONVERT_USAGE)
    })?;
    let converted = parsed.request.run(&state.cfg)?;
    Ok(format!("Result:\n{}", converted.to_lines()))
}

fn calc(args: &str) -> Result<String, AppError> {
    let argv = split_args(args)?;
    let [a, op, b] = argv.as_slice() else {
        return Err(AppError::user_input("/calc takes exactly three arguments").with_hint(CALC_USAGE));
    };

    let a = parse_number(a)?;
    let op: Operation = op.parse()?;
    let b = parse_number(b)?;
    let result = op.apply(a, b)?;
    Ok(format!("{a} {op} {b} = {result}"))
}
