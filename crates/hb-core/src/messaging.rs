//! Reply-channel port.
//!
//! Telegram is the only implementation today (`hb-telegram`); the reporters in
//! [`crate::report`] only see this trait.

use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Destination for a single user-facing text message.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Chat this channel replies into, when it is bound to one.
    fn chat_id(&self) -> Option<ChatId> {
        None
    }

    async fn reply(&self, text: &str) -> Result<()>;
}

/// In-memory channel that records every reply. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingReply {
    sent: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingReply {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose every send fails after being recorded.
    pub fn failing() -> Self {
        Self {
            sent: Default::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReplyChannel for RecordingReply {
    async fn reply(&self, text: &str) -> Result<()> {
        if let Ok(mut v) = self.sent.lock() {
            v.push(text.to_string());
        }
        if self.fail {
            return Err(crate::Error::External("reply channel closed".to_string()));
        }
        Ok(())
    }
}
