//! /whatanime - identify the anime scene in a replied-to screenshot.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::{format_media_duration, html_escape};

/// Handle /whatanime command.
///
/// Must be sent as a reply to a photo (or an image document). The image is
/// passed to trace.moe by its Telegram file URL, so nothing is downloaded
/// locally.
pub async fn whatanime_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(file_id) = replied_image_file_id(&msg) else {
        bot.send_message(
            msg.chat.id,
            "Reply to a screenshot with /whatanime and I will look up the scene.",
        )
        .await?;
        return Ok(());
    };

    let status = bot.send_message(msg.chat.id, "🔎 Searching...").await?;

    let file = bot.get_file(file_id).await?;
    let image_url = bot
        .inner()
        .api_url()
        .join(&format!("file/bot{}/{}", bot.inner().token(), file.path))?;

    let text = match state.tracemoe.search(image_url.as_str()).await {
        Ok(Some(scene)) => {
            let episode = scene
                .episode
                .map(|e| format!("Episode {}", e))
                .unwrap_or_else(|| "Unknown episode".to_string());
            format!(
                "🎬 <b>{}</b>\n{} at {}\nSimilarity: {:.1}%",
                html_escape(&scene.title),
                episode,
                format_media_duration(scene.at as u32),
                scene.similarity * 100.0
            )
        }
        Ok(None) => "No match found for this scene.".to_string(),
        Err(err) => {
            tracing::warn!("trace.moe lookup failed: {err:#}");
            "Scene lookup failed, try again later.".to_string()
        }
    };

    bot.edit_message_text(status.chat.id, status.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Extract the file id of the image in the replied-to message.
fn replied_image_file_id(msg: &Message) -> Option<String> {
    let reply = msg.reply_to_message()?;

    if let Some(sizes) = reply.photo() {
        // Largest size is last
        return sizes.last().map(|p| p.file.id.clone());
    }

    let doc = reply.document()?;
    let mime = doc.mime_type.as_ref()?;
    if mime.type_() == "image" {
        return Some(doc.file.id.clone());
    }

    None
}
