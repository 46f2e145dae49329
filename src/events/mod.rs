//! Event handler system for non-command messages.
//!
//! Media intake (the rename trigger), thumbnail capture and the
//! force-subscribe/ban gate all live here.

pub mod media;
pub mod thumbnail;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::error;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::format_duration_full;

/// Gate branch: swallows private-chat messages from banned users and from
/// users who have not joined the force-sub channels.
///
/// Sits in front of both the command handler and media intake.
pub fn gate_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_async(is_gated).endpoint(gate_prompt)
}

async fn is_gated(msg: Message, state: AppState) -> bool {
    if !msg.chat.is_private() {
        return false;
    }
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    if state.is_owner(user.id.0) {
        return false;
    }

    let now = chrono::Utc::now().timestamp();
    if let Ok(Some(doc)) = state.users.get(user.id.0 as i64).await {
        if doc.is_banned(now) {
            return true;
        }
    }

    if !state.gate.is_enabled() {
        return false;
    }
    !state.gate.missing_channels(user.id).await.is_empty()
}

async fn gate_prompt(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    // Banned users get the reason, not the join prompt
    let now = chrono::Utc::now().timestamp();
    if let Some(doc) = state.users.get(user.id.0 as i64).await? {
        if doc.is_banned(now) {
            let until = match doc.ban_until {
                Some(ts) => format!(
                    "Expires in {}.",
                    format_duration_full((ts - now).max(0) as u64)
                ),
                None => "This ban is permanent.".to_string(),
            };
            let reason = doc.ban_reason.as_deref().unwrap_or("No reason given");
            bot.send_message(
                msg.chat.id,
                format!("🚫 You are banned.\nReason: {}\n{}", reason, until),
            )
            .await?;
            return Ok(());
        }
    }

    let missing = state.gate.missing_channels(user.id).await;
    if missing.is_empty() {
        return Ok(());
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = missing
        .iter()
        .enumerate()
        .filter_map(|(i, ch)| {
            ch.invite_link
                .parse()
                .ok()
                .map(|url| vec![InlineKeyboardButton::url(format!("📢 Join channel {}", i + 1), url)])
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "🔄 I joined, check again",
        "fsub:refresh",
    )]);

    bot.send_message(
        msg.chat.id,
        "You need to join our channel(s) before using this bot.",
    )
    .reply_markup(InlineKeyboardMarkup::new(rows))
    .await?;

    Ok(())
}

/// Build the message event handler for private-chat media.
pub fn message_event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| {
        msg.chat.is_private()
            && (msg.document().is_some()
                || msg.video().is_some()
                || msg.audio().is_some()
                || msg.photo().is_some())
    })
    .endpoint(unified_media_handler)
}

/// Route a media message to the right handler. Errors are logged, never
/// propagated; one bad update must not take others down with it.
async fn unified_media_handler(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if msg.photo().is_some() {
        if let Err(e) = thumbnail::handle_photo(&bot, &msg, &state).await {
            error!("Thumbnail handler error: {}", e);
        }
        return Ok(());
    }

    if let Err(e) = media::handle_media(&bot, &msg, &state).await {
        error!("Media intake error: {}", e);
        let _ = bot
            .send_message(msg.chat.id, "⚠️ Something went wrong, please try again.")
            .await;
    }

    Ok(())
}
