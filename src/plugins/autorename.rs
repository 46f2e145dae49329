//! Rename template and source-info settings.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::rename::heuristics;
use crate::utils::html_escape;

/// Handle /autorename command.
pub async fn autorename_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;
    let template = args.trim();

    if template.is_empty() {
        let current = match &user.rename_template {
            Some(t) => format!("Current template:\n<code>{}</code>", html_escape(t)),
            None => "No template set yet.".to_string(),
        };
        bot.send_message(
            msg.chat.id,
            format!(
                "{}\n\nUsage: <code>/autorename MyShow S{{season}}E{{episode}} [{{quality}}]</code>\n\
                 Placeholders: <code>{{season}}</code> <code>{{episode}}</code> \
                 <code>{{quality}}</code> <code>{{title}}</code>",
                current
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    user.rename_template = Some(template.to_string());
    state.users.save(&user).await?;

    // Preview the template against a typical release name
    let sample = "[Group] Sample Show S01E05 1080p.mkv";
    let preview = heuristics::render_template(template, &heuristics::extract(sample));

    bot.send_message(
        msg.chat.id,
        format!(
            "✅ Template saved.\n\nPreview for <code>{}</code>:\n<code>{}.mkv</code>",
            html_escape(sample),
            html_escape(&preview)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    Ok(())
}

/// Handle /setsource command.
pub async fn setsource_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let mut user = state.users.get_or_create(tg_user).await?;

    let enable = match args.trim().to_lowercase().as_str() {
        "on" | "yes" | "true" => true,
        "off" | "no" | "false" => false,
        _ => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Source info is currently {}.\nUsage: /setsource on|off",
                    if user.show_source { "on" } else { "off" }
                ),
            )
            .await?;
            return Ok(());
        }
    };

    user.show_source = enable;
    state.users.save(&user).await?;

    bot.send_message(
        msg.chat.id,
        if enable {
            "✅ The original file name will be included with dump-channel copies."
        } else {
            "✅ Source info disabled."
        },
    )
    .await?;

    Ok(())
}
