//! Owner-only commands: stats, broadcast, bans, manual point grants.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::{ApiError, RequestError};
use tracing::{info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::{format_duration_full, html_escape, parse_duration};

/// Breather between broadcast copies so long runs stay under the flood cap.
const BROADCAST_PAUSE: Duration = Duration::from_millis(50);

async fn require_owner(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<bool> {
    let authorized = msg
        .from
        .as_ref()
        .map(|u| state.is_owner(u.id.0))
        .unwrap_or(false);

    if !authorized {
        bot.send_message(msg.chat.id, "You are not authorized to use this command.")
            .await?;
    }
    Ok(authorized)
}

/// Handle /stats command (owner only).
pub async fn stats_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !require_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let total = state.users.count().await?;
    let premium = state.users.count_premium().await?;
    let banned = state.users.banned_users().await?.len();
    let uptime = (chrono::Utc::now().timestamp() - state.started_at).max(0) as u64;

    let text = format!(
        "<b>📊 Bot stats</b>\n\
         Users: <b>{total}</b>\n\
         Premium: <b>{premium}</b>\n\
         Banned: <b>{banned}</b>\n\
         Uptime: <b>{}</b>",
        format_duration_full(uptime)
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /broadcast command (owner only).
///
/// Copies the replied-to message to every known user.
pub async fn broadcast_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !require_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let Some(source) = msg.reply_to_message() else {
        bot.send_message(msg.chat.id, "Reply to the message you want to broadcast.")
            .await?;
        return Ok(());
    };

    let ids = state.users.all_user_ids().await?;
    bot.send_message(msg.chat.id, format!("📣 Broadcasting to {} users...", ids.len()))
        .await?;

    let mut sent = 0u64;
    let mut blocked = 0u64;
    let mut failed = 0u64;
    for user_id in ids {
        let result = bot
            .copy_message(ChatId(user_id), source.chat.id, source.id)
            .await;
        match result {
            Ok(_) => sent += 1,
            Err(err) if recipient_unreachable(&err) => blocked += 1,
            Err(err) => {
                warn!("Broadcast to {user_id} failed: {err}");
                failed += 1;
            }
        }
        tokio::time::sleep(BROADCAST_PAUSE).await;
    }

    info!("Broadcast done: {sent} sent, {blocked} blocked, {failed} failed");
    bot.send_message(
        msg.chat.id,
        format!(
            "✅ Broadcast finished: {sent} delivered, {blocked} blocked, {failed} failed."
        ),
    )
    .await?;
    Ok(())
}

/// Whether a send error means the user can no longer be reached at all
/// (blocked the bot or deleted their account), as opposed to a transient
/// failure.
fn recipient_unreachable(err: &RequestError) -> bool {
    matches!(
        err,
        RequestError::Api(
            ApiError::BotBlocked
                | ApiError::UserDeactivated
                | ApiError::BotKicked
                | ApiError::BotKickedFromSupergroup
        )
    )
}

/// Handle /ban <user_id> [duration] [reason] command (owner only).
pub async fn ban_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if !require_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let mut parts = args.split_whitespace();
    let Some(user_id) = parts.next().and_then(|id| id.parse::<i64>().ok()) else {
        bot.send_message(
            msg.chat.id,
            "Usage: /ban <user_id> [duration] [reason]\nExample: /ban 123456 3d spamming",
        )
        .await?;
        return Ok(());
    };

    // An optional duration token comes before the reason
    let rest: Vec<&str> = parts.collect();
    let (duration, reason_parts) = match rest.first().and_then(|t| parse_duration(t)) {
        Some(dur) => (Some(dur), &rest[1..]),
        None => (None, &rest[..]),
    };
    let reason = (!reason_parts.is_empty()).then(|| reason_parts.join(" "));

    let Some(mut user) = state.users.get(user_id).await? else {
        bot.send_message(msg.chat.id, "Unknown user: they must /start the bot first.")
            .await?;
        return Ok(());
    };

    let now = chrono::Utc::now().timestamp();
    user.banned = true;
    user.ban_reason = reason.clone();
    user.ban_until = duration.map(|d| now + d.as_secs() as i64);
    state.users.save(&user).await?;

    let until = match duration {
        Some(d) => format!("for {}", format_duration_full(d.as_secs())),
        None => "permanently".to_string(),
    };
    info!("Banned {user_id} {until} (reason: {reason:?})");

    bot.send_message(msg.chat.id, format!("🔨 Banned {user_id} {until}."))
        .await?;
    Ok(())
}

/// Handle /unban <user_id> command (owner only).
pub async fn unban_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if !require_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let Ok(user_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Usage: /unban <user_id>").await?;
        return Ok(());
    };

    let Some(mut user) = state.users.get(user_id).await? else {
        bot.send_message(msg.chat.id, "Unknown user.").await?;
        return Ok(());
    };

    if !user.banned {
        bot.send_message(msg.chat.id, "That user is not banned.").await?;
        return Ok(());
    }

    user.banned = false;
    user.ban_reason = None;
    user.ban_until = None;
    state.users.save(&user).await?;

    bot.send_message(msg.chat.id, format!("✅ Unbanned {user_id}."))
        .await?;
    Ok(())
}

/// Handle /banlist command (owner only).
pub async fn banlist_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !require_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let banned = state.users.banned_users().await?;
    if banned.is_empty() {
        bot.send_message(msg.chat.id, "No banned users.").await?;
        return Ok(());
    }

    let mut lines = vec![format!("<b>🔨 Banned users ({}):</b>", banned.len())];
    for user in &banned {
        let mut line = format!("• <code>{}</code> {}", user.user_id, html_escape(&user.first_name));
        if let Some(reason) = &user.ban_reason {
            line.push_str(&format!(" - {}", html_escape(reason)));
        }
        if let Some(until) = user.ban_until {
            if let Some(dt) = chrono::DateTime::from_timestamp(until, 0) {
                line.push_str(&format!(" (until {})", dt.format("%Y-%m-%d %H:%M UTC")));
            }
        }
        lines.push(line);
    }

    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /addpoints <user_id> <points> command (owner only).
pub async fn addpoints_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if !require_owner(&bot, &msg, &state).await? {
        return Ok(());
    }

    let mut parts = args.split_whitespace();
    let parsed = match (
        parts.next().and_then(|id| id.parse::<i64>().ok()),
        parts.next().and_then(|n| n.parse::<i64>().ok()),
    ) {
        (Some(id), Some(points)) => Some((id, points)),
        _ => None,
    };
    let Some((user_id, points)) = parsed else {
        bot.send_message(
            msg.chat.id,
            "Usage: /addpoints <user_id> <points>\nExample: /addpoints 123456 50",
        )
        .await?;
        return Ok(());
    };

    if state.users.get(user_id).await?.is_none() {
        bot.send_message(msg.chat.id, "Unknown user: they must /start the bot first.")
            .await?;
        return Ok(());
    }

    state.users.add_points(user_id, points).await?;
    bot.send_message(
        msg.chat.id,
        format!("✅ Adjusted {user_id}'s balance by {points} points."),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_and_deactivated_count_as_unreachable() {
        assert!(recipient_unreachable(&RequestError::Api(ApiError::BotBlocked)));
        assert!(recipient_unreachable(&RequestError::Api(
            ApiError::UserDeactivated
        )));
    }

    #[test]
    fn test_other_api_errors_count_as_failed() {
        assert!(!recipient_unreachable(&RequestError::Api(
            ApiError::MessageNotModified
        )));
        assert!(!recipient_unreachable(&RequestError::Api(
            ApiError::ChatNotFound
        )));
    }
}
