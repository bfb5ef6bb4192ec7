//! Telegram adapter (teloxide).
//!
//! This crate implements the `hb-core` ReplyChannel over the Telegram Bot API
//! and runs the update dispatcher.

use async_trait::async_trait;

use teloxide::prelude::*;

pub mod handlers;
pub mod router;

use hb_core::{domain::ChatId, errors::Error, messaging::ReplyChannel, Result};

/// Reply channel bound to one Telegram chat.
///
/// Messages are sent as plain text so user-provided content is never parsed
/// as markup. One attempt per call.
#[derive(Clone)]
pub struct TelegramReply {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReply {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    fn tg_chat(&self) -> teloxide::types::ChatId {
        teloxide::types::ChatId(self.chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

#[async_trait]
impl ReplyChannel for TelegramReply {
    fn chat_id(&self) -> Option<ChatId> {
        Some(self.chat_id)
    }

    async fn reply(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.tg_chat(), text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
