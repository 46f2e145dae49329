//! /start command plugin.
//!
//! Creates the user document on first contact and handles the two deep-link
//! payloads: `refer_<id>` (referral crediting) and `points_<code>` (points
//! link redemption).

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Handle the /start command.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let existed = state.users.get(tg_user.id.0 as i64).await?.is_some();
    let user = state.users.get_or_create(tg_user).await?;

    let args = args.trim();
    if let Some(referrer) = args.strip_prefix("refer_") {
        handle_referral(&bot, &state, chat_id, user.user_id, existed, referrer).await?;
    } else if let Some(code) = args.strip_prefix("points_") {
        handle_points_claim(&bot, &state, chat_id, user.user_id, code).await?;
    }

    let welcome = format!(
        "<b>Hi {}!</b> 👋\n\n\
         I rename media files you send me.\n\n\
         <b>How it works:</b>\n\
         1. Set a template with /autorename\n\
         2. Send me a document, video or audio file\n\
         3. Get it back renamed, with your metadata and thumbnail\n\n\
         Renames cost {} point(s) each — earn points with /refer,\n\
         or go unlimited with premium (/myplan).",
        html_escape(&tg_user.first_name),
        state.config.points_per_rename,
    );

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📚 Help", "help:main"),
        InlineKeyboardButton::callback("💰 Points", "help:points"),
    ]]);

    bot.send_message(chat_id, welcome)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Credit the referrer once, only for genuinely new users.
async fn handle_referral(
    bot: &ThrottledBot,
    state: &AppState,
    chat_id: ChatId,
    user_id: i64,
    existed: bool,
    referrer: &str,
) -> anyhow::Result<()> {
    let Ok(referrer_id) = referrer.parse::<i64>() else {
        return Ok(());
    };
    if existed || referrer_id == user_id {
        return Ok(());
    }
    let Some(mut referrer_doc) = state.users.get(referrer_id).await? else {
        return Ok(());
    };

    let mut user = match state.users.get(user_id).await? {
        Some(user) => user,
        None => return Ok(()),
    };
    user.referred_by = Some(referrer_id);
    state.users.save(&user).await?;

    referrer_doc.referrals += 1;
    state.users.save(&referrer_doc).await?;
    state
        .users
        .add_points(referrer_id, state.config.referral_points)
        .await?;

    info!("User {} referred by {}", user_id, referrer_id);
    bot.send_message(
        chat_id,
        format!(
            "🎉 You joined via a referral — your friend earned {} points!",
            state.config.referral_points
        ),
    )
    .await?;

    Ok(())
}

async fn handle_points_claim(
    bot: &ThrottledBot,
    state: &AppState,
    chat_id: ChatId,
    user_id: i64,
    code: &str,
) -> anyhow::Result<()> {
    match state.points_links.claim(code, user_id).await? {
        Some(points) => {
            state.users.add_points(user_id, points).await?;
            bot.send_message(
                chat_id,
                format!("💰 Points link redeemed: +{} points!", points),
            )
            .await?;
        }
        None => {
            bot.send_message(
                chat_id,
                "This points link is invalid, already used, or your own.",
            )
            .await?;
        }
    }
    Ok(())
}
