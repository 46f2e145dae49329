//! Metadata settings.
//!
//! /metadata shows the panel with on/off buttons; the /set* commands write
//! individual fields. An empty argument clears the field.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::BotUser;
use crate::utils::html_escape;

/// Handle /metadata command.
pub async fn metadata_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    bot.send_message(msg.chat.id, panel_text(&user))
        .parse_mode(ParseMode::Html)
        .reply_markup(panel_keyboard(user.metadata.enabled))
        .await?;

    Ok(())
}

/// Handle metadata toggle callbacks (meta:on / meta:off).
pub async fn meta_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let enable = data == "meta:on";

    let user_id = q.from.id.0 as i64;
    let Some(mut user) = state.users.get(user_id).await? else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    user.metadata.enabled = enable;
    state.users.save(&user).await?;

    if let Some(msg) = q.message {
        bot.edit_message_text(msg.chat().id, msg.id(), panel_text(&user))
            .parse_mode(ParseMode::Html)
            .reply_markup(panel_keyboard(enable))
            .await?;
    }

    bot.answer_callback_query(q.id)
        .text(if enable {
            "Metadata stamping enabled"
        } else {
            "Metadata stamping disabled"
        })
        .await?;

    Ok(())
}

fn panel_text(user: &BotUser) -> String {
    let meta = &user.metadata;
    let field = |v: &Option<String>| {
        v.as_deref()
            .map(html_escape)
            .unwrap_or_else(|| "<i>not set</i>".to_string())
    };

    format!(
        "<b>🏷 Metadata</b> — {}\n\n\
         Title: {}\n\
         Artist: {}\n\
         Author: {}\n\
         Album: {}\n\
         Genre: {}\n\
         Custom: {}\n\n\
         /settitle, /setartist, /setauthor, /setalbum, /setgenre, /setcustom\n\
         Run a command without arguments to clear that field.",
        if meta.enabled { "enabled ✅" } else { "disabled ❌" },
        field(&meta.title),
        field(&meta.artist),
        field(&meta.author),
        field(&meta.album),
        field(&meta.genre),
        field(&meta.custom),
    )
}

fn panel_keyboard(enabled: bool) -> InlineKeyboardMarkup {
    let toggle = if enabled {
        InlineKeyboardButton::callback("❌ Disable", "meta:off")
    } else {
        InlineKeyboardButton::callback("✅ Enable", "meta:on")
    };
    InlineKeyboardMarkup::new(vec![vec![toggle]])
}

/// Shared implementation for the /set* field commands.
async fn set_field(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
    name: &str,
    apply: impl FnOnce(&mut BotUser, Option<String>),
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    let value = Some(args.trim().to_string()).filter(|s| !s.is_empty());
    let cleared = value.is_none();
    apply(&mut user, value);
    state.users.save(&user).await?;

    let reply = if cleared {
        format!("✅ Metadata {} cleared.", name)
    } else {
        format!("✅ Metadata {} saved.", name)
    };
    bot.send_message(msg.chat.id, reply).await?;

    Ok(())
}

pub async fn settitle_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_field(bot, msg, state, args, "title", |u, v| u.metadata.title = v).await
}

pub async fn setartist_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_field(bot, msg, state, args, "artist", |u, v| u.metadata.artist = v).await
}

pub async fn setauthor_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_field(bot, msg, state, args, "author", |u, v| u.metadata.author = v).await
}

pub async fn setalbum_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_field(bot, msg, state, args, "album", |u, v| u.metadata.album = v).await
}

pub async fn setgenre_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_field(bot, msg, state, args, "genre", |u, v| u.metadata.genre = v).await
}

pub async fn setcustom_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    set_field(bot, msg, state, args, "custom tag", |u, v| u.metadata.custom = v).await
}
