//! Thumbnail capture.
//!
//! Any photo sent in private chat becomes the user's upload thumbnail.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};

pub async fn handle_photo(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    // Highest resolution is the last element
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    let mut user = state.users.get_or_create(tg_user).await?;
    user.thumbnail = Some(photo.file.id.clone());
    state.users.save(&user).await?;

    bot.send_message(
        msg.chat.id,
        "🖼 Thumbnail saved. It will be attached to every processed file.\n\
         /viewthumb to preview, /delthumb to remove.",
    )
    .await?;

    Ok(())
}
