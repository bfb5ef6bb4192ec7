//! Telegram update handlers.
//!
//! Every text update runs inside one reporting scope:
//! - a `[CALL]` log line with who sent what
//! - the command or echo handler, wrapped by `run_reported` so a failure is
//!   logged and replied to the chat instead of reaching the dispatcher
//! - a `[DONE]` log line with the outcome and latency

use std::{sync::Arc, time::Instant};

use teloxide::{prelude::*, types::Message};
use tracing::info;

use hb_core::{
    domain::{ChatId, UserId},
    failure::Failure,
    messaging::ReplyChannel,
    report::run_reported,
};

use crate::{router::AppState, TelegramReply};

mod commands;
mod text;

pub use commands::{parse_command, split_args};

/// One incoming text message, detached from teloxide types.
#[derive(Clone, Copy, Debug)]
pub struct Incoming<'a> {
    pub chat_id: i64,
    pub user_id: Option<UserId>,
    pub username: &'a str,
    pub text: &'a str,
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user = msg.from();
    let incoming = Incoming {
        chat_id: msg.chat.id.0,
        user_id: user.map(|u| UserId(u.id.0 as i64)),
        username: user.and_then(|u| u.username.as_deref()).unwrap_or(""),
        text,
    };

    let reply = TelegramReply::new(bot, ChatId(msg.chat.id.0));
    process(&state, &reply, incoming).await;
    Ok(())
}

/// Handle one message; returns whether the handler succeeded.
pub async fn process(state: &AppState, reply: &dyn ReplyChannel, incoming: Incoming<'_>) -> bool {
    let handler = handler_name(incoming.text);
    let started = Instant::now();
    info!(
        handler = %handler,
        user_id = incoming.user_id.map(|u| u.0),
        username = incoming.username,
        chat_id = incoming.chat_id,
        text = incoming.text,
        "[CALL]"
    );

    let ok = run_reported(route(state, reply, incoming.text), Some(reply))
        .await
        .is_some();

    info!(
        handler = %handler,
        ok,
        latency_ms = started.elapsed().as_secs_f64() * 1000.0,
        "[DONE]"
    );
    ok
}

async fn route(state: &AppState, reply: &dyn ReplyChannel, text: &str) -> Result<(), Failure> {
    match parse_command(text) {
        Some((cmd, args)) => commands::handle_command(state, reply, &cmd, &args).await,
        None => text::handle_text(state, reply, text).await,
    }
}

fn handler_name(text: &str) -> String {
    parse_command(text)
        .map(|(cmd, _)| cmd)
        .unwrap_or_else(|| "echo".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hb_core::{config::Config, messaging::RecordingReply};

    use super::*;

    fn state(echo_max_chars: usize) -> AppState {
        AppState::new(Arc::new(Config {
            echo_max_chars,
            ..Config::default()
        }))
    }

    fn incoming(text: &str) -> Incoming<'_> {
        Incoming {
            chat_id: 42,
            user_id: Some(UserId(7)),
            username: "ann",
            text,
        }
    }

    #[tokio::test]
    async fn echoes_plain_text() {
        let reply = RecordingReply::new();
        assert!(process(&state(100), &reply, incoming("hello there")).await);
        assert_eq!(reply.sent(), vec!["hello there".to_string()]);
    }

    #[tokio::test]
    async fn ping_pongs() {
        let reply = RecordingReply::new();
        assert!(process(&state(100), &reply, incoming("/ping@hello_bot")).await);
        assert_eq!(reply.sent(), vec!["Pong!".to_string()]);
    }

    #[tokio::test]
    async fn long_echo_is_a_domain_rule_reply() {
        let reply = RecordingReply::new();
        let text = "x".repeat(11);
        assert!(!process(&state(10), &reply, incoming(&text)).await);

        let sent = reply.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("❌ message too long to echo\n💡 keep it within 10 characters\n🔍 trace: "));
    }

    #[tokio::test]
    async fn unknown_command_is_reported_not_propagated() {
        let reply = RecordingReply::new();
        assert!(!process(&state(100), &reply, incoming("/frobnicate")).await);
        let sent = reply.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("❌ unknown command: /frobnicate\n💡 send /help"));
    }

    #[tokio::test]
    async fn failing_channel_does_not_escape() {
        let reply = RecordingReply::failing();
        assert!(!process(&state(100), &reply, incoming("/ping")).await);
        // The pong attempt and the error reply, each tried once.
        assert_eq!(reply.sent().len(), 2);
    }

    #[test]
    fn handler_names() {
        assert_eq!(handler_name("/Convert --dt x"), "convert");
        assert_eq!(handler_name("hi"), "echo");
    }
}
