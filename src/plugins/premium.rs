//! Premium plan commands.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::parse_duration;

/// Handle /myplan command.
pub async fn myplan_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    let now = chrono::Utc::now().timestamp();
    let text = match user.premium_until {
        Some(until) if until > now => {
            let expiry = chrono::DateTime::from_timestamp(until, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| until.to_string());
            format!(
                "💠 <b>Premium active</b>\n\
                 Renames are free and unmetered.\n\
                 Expires: <b>{expiry}</b>"
            )
        }
        _ => format!(
            "🆓 <b>Free plan</b>\n\
             Each rename costs {} points (balance: {}).\n\
             Contact an admin to upgrade.",
            state.config.points_per_rename, user.points
        ),
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /addpremium <user_id> <duration> command (owner only).
pub async fn addpremium_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    if !state.is_owner(tg_user.id.0) {
        bot.send_message(msg.chat.id, "You are not authorized to use this command.")
            .await?;
        return Ok(());
    }

    let mut parts = args.split_whitespace();
    let parsed = match (
        parts.next().and_then(|id| id.parse::<i64>().ok()),
        parts.next().and_then(parse_duration),
    ) {
        (Some(id), Some(dur)) => Some((id, dur)),
        _ => None,
    };
    let Some((user_id, duration)) = parsed else {
        bot.send_message(
            msg.chat.id,
            "Usage: /addpremium <user_id> <duration>\nExample: /addpremium 123456 30d",
        )
        .await?;
        return Ok(());
    };

    let Some(mut user) = state.users.get(user_id).await? else {
        bot.send_message(msg.chat.id, "Unknown user: they must /start the bot first.")
            .await?;
        return Ok(());
    };

    let now = chrono::Utc::now().timestamp();
    // Extend an active plan instead of restarting it
    let base = user.premium_until.filter(|&u| u > now).unwrap_or(now);
    user.premium_until = Some(base + duration.as_secs() as i64);
    state.users.save(&user).await?;

    bot.send_message(
        msg.chat.id,
        format!(
            "✅ Premium granted to {} for {}.",
            user_id,
            crate::utils::format_duration_full(duration.as_secs())
        ),
    )
    .await?;
    Ok(())
}

/// Handle /delpremium <user_id> command (owner only).
pub async fn delpremium_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    if !state.is_owner(tg_user.id.0) {
        bot.send_message(msg.chat.id, "You are not authorized to use this command.")
            .await?;
        return Ok(());
    }

    let Ok(user_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Usage: /delpremium <user_id>")
            .await?;
        return Ok(());
    };

    let Some(mut user) = state.users.get(user_id).await? else {
        bot.send_message(msg.chat.id, "Unknown user.").await?;
        return Ok(());
    };

    user.premium_until = None;
    state.users.save(&user).await?;

    bot.send_message(msg.chat.id, format!("✅ Premium removed from {}.", user_id))
        .await?;
    Ok(())
}
