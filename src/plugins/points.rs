//! Points economy commands: balance, referral links, shareable point links.

use rand::distributions::Alphanumeric;
use rand::Rng;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::PointsLink;
use crate::utils::html_escape;

const LINK_CODE_LEN: usize = 8;

/// Random alphanumeric code for a points link. The code doubles as the
/// deep-link payload, so it must stay URL-safe.
fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LINK_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Handle /points command.
pub async fn points_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    let now = chrono::Utc::now().timestamp();
    let balance_line = if user.is_premium(now) {
        "💠 You have <b>premium</b>: renames are free.".to_string()
    } else {
        format!(
            "💰 Balance: <b>{}</b> points (each rename costs {}).",
            user.points, state.config.points_per_rename
        )
    };

    let text = format!(
        "{balance_line}\n\n\
         Earn more:\n\
         • /refer - invite friends ({} points each)\n\
         • redeem a points link shared by another user\n\
         • ask an admin about premium with /myplan",
        state.config.referral_points
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /refer command.
pub async fn refer_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = state.users.get_or_create(tg_user).await?;

    let link = format!(
        "https://t.me/{}?start=refer_{}",
        state.bot_username, user.user_id
    );

    let text = format!(
        "🔗 Your referral link:\n{}\n\n\
         You earn <b>{}</b> points for every new user who starts the bot \
         through it. Referred so far: <b>{}</b>.",
        html_escape(&link),
        state.config.referral_points,
        user.referrals
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /genlink <points> command.
///
/// Moves points from the caller's balance into a shareable deep link;
/// each claimer is credited the full amount.
pub async fn genlink_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };

    let Ok(points) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Usage: /genlink <points>\nExample: /genlink 10")
            .await?;
        return Ok(());
    };
    if points <= 0 {
        bot.send_message(msg.chat.id, "Point amount must be positive.")
            .await?;
        return Ok(());
    }

    let user = state.users.get_or_create(tg_user).await?;
    if user.points < points {
        bot.send_message(
            msg.chat.id,
            format!(
                "Not enough points: you have {} but the link needs {}.",
                user.points, points
            ),
        )
        .await?;
        return Ok(());
    }

    let code = generate_code();
    let link = PointsLink::new(code.clone(), user.user_id, points);
    state.points_links.create(&link).await?;
    state.users.add_points(user.user_id, -points).await?;

    let deep_link = format!("https://t.me/{}?start=points_{}", state.bot_username, code);
    let share_link = match &state.shortener {
        Some(shortener) => match shortener.shorten(&deep_link).await {
            Ok(short) => short,
            Err(err) => {
                tracing::warn!("Shortener failed, falling back to plain link: {err:#}");
                deep_link
            }
        },
        None => deep_link,
    };

    let text = format!(
        "✅ Link created, <b>{points}</b> points deducted.\n\n\
         Anyone opening this link gets {points} points (once each):\n{}",
        html_escape(&share_link)
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), LINK_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_codes_differ() {
        assert_ne!(generate_code(), generate_code());
    }
}
