//! Telegram update handlers.
//!
//! Commands drive admin management and open the transfer setup; callbacks
//! and follow-up text messages drive the setup flow itself. The pipeline is
//! always launched in the background so handlers return immediately.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod commands;
mod transfer_setup;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    transfer_setup::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return commands::handle_command(bot, msg, state).await;
    }

    // Free text only matters while a setup is waiting for a chat id.
    transfer_setup::handle_setup_input(bot, msg, state).await
}
