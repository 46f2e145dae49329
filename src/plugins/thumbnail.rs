//! Thumbnail commands.
//!
//! Thumbnails are set by sending a photo (see `events::thumbnail`).

use teloxide::prelude::*;
use teloxide::types::InputFile;

use crate::bot::dispatcher::{AppState, ThrottledBot};

/// Handle /viewthumb command.
pub async fn viewthumb_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    match &user.thumbnail {
        Some(file_id) => {
            bot.send_photo(msg.chat.id, InputFile::file_id(file_id.clone()))
                .caption("Your current thumbnail.")
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "No thumbnail set. Send me a photo to set one.")
                .await?;
        }
    }
    Ok(())
}

/// Handle /delthumb command.
pub async fn delthumb_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    if user.thumbnail.take().is_none() {
        bot.send_message(msg.chat.id, "No thumbnail to delete.").await?;
        return Ok(());
    }
    state.users.save(&user).await?;

    bot.send_message(msg.chat.id, "🗑 Thumbnail deleted.").await?;
    Ok(())
}
