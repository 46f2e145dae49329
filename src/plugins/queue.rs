//! Queue inspection commands and the rename cancel button.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Handle /queue command.
pub async fn queue_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    if user.queue.is_empty() {
        bot.send_message(msg.chat.id, "Your queue is empty.").await?;
        return Ok(());
    }

    let mut lines = vec![format!("<b>📋 Pending files ({}):</b>", user.queue.len())];
    for (i, item) in user.queue.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, html_escape(&item.file_name)));
    }
    lines.push("\n/clearqueue to drop them all.".to_string());

    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /clearqueue command.
pub async fn clearqueue_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    state.users.clear_queue(tg_user.id.0 as i64).await?;

    bot.send_message(msg.chat.id, "🗑 Queue cleared.").await?;
    Ok(())
}

/// Handle cancel:<task_id> callbacks from rename status messages.
///
/// Best-effort: the flag is honored between pipeline stages, an in-flight
/// download or ffmpeg run finishes first.
pub async fn cancel_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let task_id = q
        .data
        .as_deref()
        .and_then(|d| d.strip_prefix("cancel:"))
        .and_then(|id| id.parse::<u64>().ok());

    let cancelled = task_id.map(|id| state.tasks.cancel(id)).unwrap_or(false);

    bot.answer_callback_query(q.id)
        .text(if cancelled {
            "Cancelling after the current step..."
        } else {
            "This task already finished."
        })
        .await?;

    Ok(())
}
