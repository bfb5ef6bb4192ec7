use hb_core::{
    failure::{AppError, Failure},
    messaging::ReplyChannel,
};

use crate::router::AppState;

/// Echo plain text back to the chat.
pub(super) async fn handle_text(
    state: &AppState,
    reply: &dyn ReplyChannel,
    text: &str,
) -> Result<(), Failure> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let max = state.cfg.echo_max_chars;
    if text.chars().count() > max {
        return Err(AppError::domain_rule("message too long to echo")
            .with_hint(format!("keep it within {max} characters"))
            .into());
    }

    reply.reply(text).await?;
    Ok(())
}
