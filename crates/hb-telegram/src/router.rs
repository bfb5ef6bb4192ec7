use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use hb_core::config::Config;

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>) -> Self {
        Self { cfg }
    }
}

/// Long-poll Telegram until the future is dropped.
pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.require_bot_token()?);

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "bot started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    info!(
        echo_max_chars = cfg.echo_max_chars,
        default_src_tz = %cfg.default_src_tz,
        default_dst_tz = %cfg.default_dst_tz,
        "handlers registered: /start /ping /help /convert /calc + echo"
    );

    let state = Arc::new(AppState::new(cfg));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    info!("bot stopped");
    Ok(())
}
