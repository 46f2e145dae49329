//! Help command module.
//!
//! Handles /help and the interactive help menu callbacks (help:*).

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::dispatcher::{AppState, ThrottledBot};

/// Handle /help command.
pub async fn help_command(
    bot: ThrottledBot,
    msg: Message,
    _state: AppState,
) -> anyhow::Result<()> {
    let (text, keyboard) = page("main");
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Handle help callback queries (help:*) and the close button.
pub async fn callback_handler(
    bot: ThrottledBot,
    q: CallbackQuery,
    _state: AppState,
) -> anyhow::Result<()> {
    let data = match q.data {
        Some(d) => d,
        None => return Ok(()),
    };

    if data == "close" {
        if let Some(msg) = q.message {
            let _ = bot.delete_message(msg.chat().id, msg.id()).await;
        }
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    }

    let Some(part) = data.strip_prefix("help:") else {
        // Unknown callback: answer silently so the button stops spinning
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let (text, keyboard) = page(part);

    if let Some(msg) = q.message {
        bot.edit_message_text(msg.chat().id, msg.id(), text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

fn page(part: &str) -> (&'static str, InlineKeyboardMarkup) {
    match part {
        "rename" => (rename_text(), back_keyboard()),
        "metadata" => (metadata_text(), back_keyboard()),
        "points" => (points_text(), back_keyboard()),
        "sequence" => (sequence_text(), back_keyboard()),
        _ => (main_text(), main_keyboard()),
    }
}

fn main_text() -> &'static str {
    "<b>📚 Renamix Help</b>\n\n\
     Send me any document, video or audio file and I rename it using your\n\
     template, stamp your metadata and attach your thumbnail.\n\n\
     Pick a category below for details."
}

fn main_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✏️ Renaming", "help:rename"),
            InlineKeyboardButton::callback("🏷 Metadata", "help:metadata"),
        ],
        vec![
            InlineKeyboardButton::callback("💰 Points", "help:points"),
            InlineKeyboardButton::callback("🔢 Sequencing", "help:sequence"),
        ],
        vec![InlineKeyboardButton::callback("✖️ Close", "close")],
    ])
}

fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("⬅️ Back", "help:main"),
        InlineKeyboardButton::callback("✖️ Close", "close"),
    ]])
}

fn rename_text() -> &'static str {
    "<b>✏️ Renaming</b>\n\n\
     /autorename &lt;template&gt; — set the rename template.\n\
     Placeholders: <code>{season}</code> <code>{episode}</code> \
     <code>{quality}</code> <code>{title}</code>\n\n\
     Example: <code>/autorename MyShow S{season}E{episode} [{quality}]</code>\n\n\
     /set_caption — caption template with <code>{filename}</code> \
     <code>{filesize}</code> <code>{duration}</code>\n\
     Send a photo to set the thumbnail, /viewthumb, /delthumb\n\
     /queue — pending files, /clearqueue\n\
     /setsource on|off — include the original name in the dump-channel copy"
}

fn metadata_text() -> &'static str {
    "<b>🏷 Metadata</b>\n\n\
     /metadata — enable or disable metadata stamping\n\
     /settitle, /setartist, /setauthor, /setalbum, /setgenre, /setcustom\n\n\
     Run a command without arguments to clear that field.\n\
     Tags are written with ffmpeg without re-encoding."
}

fn points_text() -> &'static str {
    "<b>💰 Points</b>\n\n\
     Every rename costs points unless you are premium.\n\n\
     /points — your balance\n\
     /refer — share your referral link, earn points per new user\n\
     /genlink &lt;points&gt; — turn your points into a shareable link\n\
     /myplan — premium status"
}

fn sequence_text() -> &'static str {
    "<b>🔢 Sequencing</b>\n\n\
     /startsequence — start collecting files\n\
     Send your files in any order, then:\n\
     /endsequence — I resend them sorted by episode number\n\
     /cancelsequence — discard the session\n\n\
     /whatanime — reply to a screenshot to identify the anime scene"
}
