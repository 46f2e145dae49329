//! Caption template commands.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Handle /set_caption command.
pub async fn set_caption_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let template = args.trim();

    if template.is_empty() {
        bot.send_message(
            msg.chat.id,
            "Usage: <code>/set_caption {filename} | {filesize} | {duration}</code>\n\
             Placeholders: <code>{filename}</code> <code>{filesize}</code> <code>{duration}</code>",
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    let mut user = state.users.get_or_create(tg_user).await?;
    user.caption_template = Some(template.to_string());
    state.users.save(&user).await?;

    bot.send_message(msg.chat.id, "✅ Caption template saved.")
        .await?;
    Ok(())
}

/// Handle /see_caption command.
pub async fn see_caption_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    let reply = match &user.caption_template {
        Some(t) => format!("Your caption template:\n<code>{}</code>", html_escape(t)),
        None => "No caption template set. Use /set_caption.".to_string(),
    };
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /del_caption command.
pub async fn del_caption_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    if user.caption_template.take().is_none() {
        bot.send_message(msg.chat.id, "No caption template to delete.")
            .await?;
        return Ok(());
    }
    state.users.save(&user).await?;

    bot.send_message(msg.chat.id, "🗑 Caption template deleted.")
        .await?;
    Ok(())
}
