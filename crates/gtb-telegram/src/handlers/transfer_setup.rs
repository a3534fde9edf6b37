//! Inline-keyboard flow that collects source/target ids and launches a run.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode},
};

use gtb_core::{
    domain::{ChatId as CoreChatId, GroupRef, UserId},
    events::ProgressSink,
    transfer::TransferRequest,
};

use crate::{
    router::{AppState, SetupField, TransferSetup},
    sink::ChatProgressSink,
};

fn setup_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📥 Fetch from", "fetch_from"),
            InlineKeyboardButton::callback("📤 Push to", "push_to"),
        ],
        vec![InlineKeyboardButton::callback("✅ Done", "done_setup")],
    ])
}

/// `/scrapemembers`: open a fresh setup for this chat.
pub async fn begin_setup(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    state.setups.lock().await.insert(
        msg.chat.id.0,
        TransferSetup {
            admin: UserId(user.id.0 as i64),
            source: None,
            target: None,
            awaiting: None,
        },
    );

    let text = "🔄 **Member Transfer Setup**\n\n\
         Click the buttons below to configure the transfer:\n\
         • **Fetch from**: Source group/channel\n\
         • **Push to**: Target group/channel\n\n\
         Then click **Done** to start the transfer.";
    let _ = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(setup_keyboard())
        .await;
    Ok(())
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let data = q.data.clone().unwrap_or_default();
    let Some(msg) = q.message.as_ref() else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let user_id = q.from.id.0 as i64;

    if !state.admins.is_admin(user_id) {
        let _ = bot
            .answer_callback_query(cb_id)
            .text("Unauthorized".to_string())
            .await;
        return Ok(());
    }

    match data.as_str() {
        "fetch_from" => {
            await_field(&state, chat_id.0, user_id, SetupField::Source).await;
            let _ = bot
                .edit_message_text(
                    chat_id,
                    msg.id,
                    "📥 **Set Source Group**\n\n\
                     Please send the chat ID of the group/channel you want to fetch members FROM.\n\
                     Example: `-1001234567890` or `@channelname`",
                )
                .parse_mode(ParseMode::Markdown)
                .await;
            let _ = bot.answer_callback_query(cb_id).await;
        }
        "push_to" => {
            await_field(&state, chat_id.0, user_id, SetupField::Target).await;
            let _ = bot
                .edit_message_text(
                    chat_id,
                    msg.id,
                    "📤 **Set Target Group**\n\n\
                     Please send the chat ID of the group/channel you want to push members TO.\n\
                     Example: `-1001234567890` or `@channelname`",
                )
                .parse_mode(ParseMode::Markdown)
                .await;
            let _ = bot.answer_callback_query(cb_id).await;
        }
        "done_setup" => {
            return finish_setup(bot, q, state).await;
        }
        _ => {
            let _ = bot.answer_callback_query(cb_id).await;
        }
    }
    Ok(())
}

/// Mark the setup of `chat_id` as waiting for the next text message.
async fn await_field(state: &Arc<AppState>, chat_id: i64, user_id: i64, field: SetupField) {
    let mut setups = state.setups.lock().await;
    let setup = setups.entry(chat_id).or_insert_with(|| TransferSetup {
        admin: UserId(user_id),
        source: None,
        target: None,
        awaiting: None,
    });
    setup.awaiting = Some(field);
}

/// A plain text message while a setup awaits an id.
pub async fn handle_setup_input(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !state.admins.is_admin(user.id.0 as i64) {
        return Ok(());
    }

    let value = text.trim().to_string();
    let confirmation = {
        let mut setups = state.setups.lock().await;
        let Some(setup) = setups.get_mut(&msg.chat.id.0) else {
            return Ok(());
        };
        let Some(field) = setup.awaiting.take() else {
            return Ok(());
        };
        match field {
            SetupField::Source => {
                setup.source = Some(value.clone());
                format!(
                    "✅ Source set to: `{value}`\n\nNow configure the target using the buttons below."
                )
            }
            SetupField::Target => {
                setup.target = Some(value.clone());
                format!("✅ Target set to: `{value}`\n\nClick Done when ready to start the transfer.")
            }
        }
    };

    let _ = bot
        .send_message(msg.chat.id, confirmation)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(setup_keyboard())
        .await;
    Ok(())
}

/// "Done": validate the setup and launch the run in the background so the
/// callback returns immediately.
async fn finish_setup(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let Some(msg) = q.message.as_ref() else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let setup = state.setups.lock().await.get(&chat_id.0).cloned();
    let (source, target, admin) = match setup {
        Some(TransferSetup {
            source: Some(source),
            target: Some(target),
            admin,
            ..
        }) => (source, target, admin),
        _ => {
            let _ = bot
                .answer_callback_query(cb_id)
                .text("❌ Please set both SOURCE and TARGET group IDs first!".to_string())
                .show_alert(true)
                .await;
            return Ok(());
        }
    };

    let _ = bot.answer_callback_query(cb_id).await;
    let _ = bot
        .edit_message_text(
            chat_id,
            msg.id,
            format!(
                "🚀 Starting Member Transfer...\n\n\
                 From: `{source}`\nTo: `{target}`\n\n\
                 Progress updates will follow in this chat."
            ),
        )
        .parse_mode(ParseMode::Markdown)
        .await;

    let request = TransferRequest {
        source: GroupRef(source),
        target: GroupRef(target),
        admin,
    };
    let sink: Arc<dyn ProgressSink> = Arc::new(ChatProgressSink::new(
        state.notifier.clone(),
        CoreChatId(chat_id.0),
    ));
    let handle = state.orchestrator.spawn(request, sink);

    {
        let mut runs = state.runs.lock().await;
        runs.retain(|_, h| !h.is_finished());
        runs.insert(chat_id.0, handle);
    }
    state.setups.lock().await.remove(&chat_id.0);

    Ok(())
}
