use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use crate::router::AppState;

use super::transfer_setup;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let (cmd, args) = parse_command(msg.text().unwrap_or(""));

    if !state.admins.is_admin(user_id) {
        let text = if cmd == "start" {
            format!(
                "🤖 Welcome to GroupTransferBot!\n\n\
                 This bot is for admins only. Please contact {} to use this bot.",
                state.cfg.admin_contact
            )
        } else {
            format!(
                "❌ This command is for admins only. Contact {} for access.",
                state.cfg.admin_contact
            )
        };
        let _ = bot.send_message(msg.chat.id, text).await;
        return Ok(());
    }

    match cmd.as_str() {
        "start" => start(bot, msg).await,
        "scrapemembers" => transfer_setup::begin_setup(bot, msg, state).await,
        "promote" => promote(bot, msg, state, &args).await,
        "remove" => remove(bot, msg, state, &args).await,
        "adminlist" => adminlist(bot, msg, state).await,
        "refresh" => refresh(bot, msg).await,
        _ => {
            let _ = bot
                .send_message(msg.chat.id, "Unknown command. See /start for the list.")
                .await;
            Ok(())
        }
    }
}

async fn start(bot: Bot, msg: Message) -> ResponseResult<()> {
    let text = "🤖 **Welcome to GroupTransferBot!**\n\n\
         Here are the available commands:\n\
         • `/scrapemembers` - Transfer members between groups\n\
         • `/promote <uid>` - Promote user to admin\n\
         • `/remove <uid>` - Remove user from admin\n\
         • `/adminlist` - Show current admins\n\
         • `/refresh` - Refresh the bot\n\n\
         ⚠️ Note: All commands are admin-only.";
    let _ = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Markdown)
        .await;
    Ok(())
}

async fn promote(bot: Bot, msg: Message, state: Arc<AppState>, args: &str) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let Ok(user_id) = args.trim().parse::<i64>() else {
        let _ = bot
            .send_message(msg.chat.id, "❌ Usage: `/promote <user_id>`")
            .parse_mode(ParseMode::Markdown)
            .await;
        return Ok(());
    };

    // Best-effort profile lookup; only works if the user ever talked to the bot.
    let (username, first_name) = match bot.get_chat(teloxide::types::ChatId(user_id)).await {
        Ok(chat) => (
            chat.username().map(str::to_string),
            chat.first_name().map(str::to_string),
        ),
        Err(_) => (None, None),
    };

    let reply = match state.admins.add(
        user_id,
        username.clone(),
        first_name.clone(),
        Some(user.id.0 as i64),
    ) {
        Ok(()) => format!(
            "✅ **User promoted to admin**\n\n\
             **User ID:** `{user_id}`\n\
             **Username:** @{}\n\
             **Name:** {}",
            username.as_deref().unwrap_or("N/A"),
            first_name.as_deref().unwrap_or("N/A")
        ),
        Err(e) => format!("❌ Error promoting user: {e}"),
    };
    let _ = bot
        .send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Markdown)
        .await;
    Ok(())
}

async fn remove(bot: Bot, msg: Message, state: Arc<AppState>, args: &str) -> ResponseResult<()> {
    let Ok(user_id) = args.trim().parse::<i64>() else {
        let _ = bot
            .send_message(msg.chat.id, "❌ Usage: `/remove <user_id>`")
            .parse_mode(ParseMode::Markdown)
            .await;
        return Ok(());
    };

    if !state.admins.is_admin(user_id) {
        let _ = bot
            .send_message(msg.chat.id, "❌ User is not an admin.")
            .await;
        return Ok(());
    }

    let reply = match state.admins.remove(user_id) {
        Ok(_) => format!("✅ **Admin removed**\n\n**User ID:** `{user_id}`"),
        Err(e) => format!("❌ Error removing admin: {e}"),
    };
    let _ = bot
        .send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Markdown)
        .await;
    Ok(())
}

async fn adminlist(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let admins = state.admins.list();
    if admins.is_empty() {
        let _ = bot.send_message(msg.chat.id, "❌ No admins found.").await;
        return Ok(());
    }

    let mut text = "👥 **Current Admins:**\n\n".to_string();
    for (i, admin) in admins.iter().enumerate() {
        text.push_str(&format!(
            "{}. User ID: `{}`\n   Username: @{}\n   Name: {}\n   Added: {}\n\n",
            i + 1,
            admin.user_id,
            admin.username.as_deref().unwrap_or("N/A"),
            admin.first_name.as_deref().unwrap_or("N/A"),
            admin.added_at
        ));
    }
    let _ = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Markdown)
        .await;
    Ok(())
}

async fn refresh(bot: Bot, msg: Message) -> ResponseResult<()> {
    let _ = bot
        .send_message(
            msg.chat.id,
            "🔄 **Bot refreshed successfully!**\n\nAll systems operational.",
        )
        .parse_mode(ParseMode::Markdown)
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_mention_and_lowercases() {
        assert_eq!(
            parse_command("/Promote@SomeBot 12345"),
            ("promote".to_string(), "12345".to_string())
        );
        assert_eq!(
            parse_command("/adminlist"),
            ("adminlist".to_string(), "".to_string())
        );
        assert_eq!(
            parse_command("  /remove   42  "),
            ("remove".to_string(), "42".to_string())
        );
    }
}
