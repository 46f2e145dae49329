//! Sequence mode commands: collect files, then re-send them in episode order.

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::warn;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{MediaKind, SequenceSession};

/// Handle /startsequence command.
pub async fn startsequence_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    if user.sequence_mode {
        bot.send_message(
            msg.chat.id,
            "A sequence is already open. Send files, then /endsequence.",
        )
        .await?;
        return Ok(());
    }

    user.sequence_mode = true;
    state.users.save(&user).await?;
    state
        .sequences
        .save(&SequenceSession::new(user.user_id))
        .await?;

    bot.send_message(
        msg.chat.id,
        "🎬 Sequence started. Send your files in any order; I will return \
         them sorted by episode number on /endsequence. Use /cancelsequence \
         to discard.",
    )
    .await?;
    Ok(())
}

/// Handle /endsequence command.
pub async fn endsequence_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    if !user.sequence_mode {
        bot.send_message(msg.chat.id, "No sequence is open. Start one with /startsequence.")
            .await?;
        return Ok(());
    }

    let session = state.sequences.get(user.user_id).await?;
    user.sequence_mode = false;
    state.users.save(&user).await?;
    state.sequences.delete(user.user_id).await?;

    let files = match session {
        Some(ref s) if !s.files.is_empty() => s.ordered_files(),
        _ => {
            bot.send_message(msg.chat.id, "Sequence closed: no files were collected.")
                .await?;
            return Ok(());
        }
    };

    bot.send_message(
        msg.chat.id,
        format!("📤 Sending {} files in episode order...", files.len()),
    )
    .await?;

    for file in files {
        let input = InputFile::file_id(file.file_id.clone());
        let sent = match file.kind {
            MediaKind::Document => bot.send_document(msg.chat.id, input).await.map(|_| ()),
            MediaKind::Video => bot.send_video(msg.chat.id, input).await.map(|_| ()),
            MediaKind::Audio => bot.send_audio(msg.chat.id, input).await.map(|_| ()),
        };
        // Keep going so one bad file_id does not eat the rest
        if let Err(err) = sent {
            warn!("Failed to re-send {} in sequence: {err}", file.file_name);
        }
    }

    Ok(())
}

/// Handle /cancelsequence command.
pub async fn cancelsequence_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    if !user.sequence_mode {
        bot.send_message(msg.chat.id, "No sequence is open.").await?;
        return Ok(());
    }

    user.sequence_mode = false;
    state.users.save(&user).await?;
    state.sequences.delete(user.user_id).await?;

    bot.send_message(msg.chat.id, "🚫 Sequence discarded.").await?;
    Ok(())
}
