//! The per-file rename pipeline.
//!
//! download -> (ffmpeg metadata stamp) -> rename per template -> re-upload ->
//! dump-channel copy -> ledger update. Each step checks the task's cancel
//! flag; cancellation never interrupts an in-flight download or subprocess.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use tokio::fs;
use tracing::{info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{BotUser, MediaKind, QueueItem};
use crate::utils::{format_file_size, format_media_duration};

use super::heuristics;
use super::RenameError;

/// Everything the pipeline needs to process one file.
pub struct RenameJob {
    pub chat_id: ChatId,
    pub user: BotUser,
    pub item: QueueItem,
    pub file_size: u64,
    /// Media duration in seconds, for videos and audio.
    pub duration: Option<u32>,
}

/// Run a rename job to completion, reporting progress and errors through a
/// status message. Never returns an error; failures end up in the chat.
pub async fn run(bot: ThrottledBot, state: AppState, job: RenameJob) {
    let (task_id, cancel) = state.tasks.register();
    let user_id = job.user.user_id;

    let status = match bot
        .send_message(
            job.chat_id,
            format!("⏳ Queued: {}", job.item.file_name),
        )
        .reply_markup(cancel_keyboard(task_id))
        .await
    {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to send status message for {}: {}", user_id, e);
            state.tasks.finish(task_id);
            return;
        }
    };

    // Per-user throttle: at most 3 renames in flight
    let semaphore = state.tasks.semaphore(user_id);
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            state.tasks.finish(task_id);
            return;
        }
    };

    let work_dir = PathBuf::from(&state.config.download_dir)
        .join(user_id.to_string())
        .join(task_id.to_string());

    let result = process(&bot, &state, &job, task_id, &cancel, &work_dir, status.id).await;

    match result {
        Ok(new_name) => {
            info!("Renamed '{}' -> '{}' for {}", job.item.file_name, new_name, user_id);
            let _ = bot.delete_message(job.chat_id, status.id).await;
        }
        Err(RenameError::Cancelled) => {
            info!("Rename of '{}' cancelled by {}", job.item.file_name, user_id);
            let _ = bot
                .edit_message_text(job.chat_id, status.id, "🚫 Cancelled.")
                .await;
        }
        Err(e) => {
            warn!("Rename of '{}' failed for {}: {}", job.item.file_name, user_id, e);
            let _ = bot
                .edit_message_text(
                    job.chat_id,
                    status.id,
                    format!("⚠️ Processing failed: {}", e),
                )
                .await;
        }
    }

    // Best-effort scratch cleanup in every exit path
    if let Err(e) = fs::remove_dir_all(&work_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to clean up {:?}: {}", work_dir, e);
        }
    }
    state.tasks.finish(task_id);

    // Release the permit before pruning, or the entry always looks busy
    drop(_permit);
    state.tasks.prune_semaphore(user_id);
}

async fn process(
    bot: &ThrottledBot,
    state: &AppState,
    job: &RenameJob,
    task_id: u64,
    cancel: &Arc<AtomicBool>,
    work_dir: &Path,
    status_id: MessageId,
) -> Result<String, RenameError> {
    let user = &job.user;
    let item = &job.item;

    check_cancel(cancel)?;
    edit_status(
        bot,
        job.chat_id,
        status_id,
        task_id,
        format!("⬇️ Downloading: {}", item.file_name),
    )
    .await;

    fs::create_dir_all(work_dir).await?;
    let input_path = work_dir.join(format!("input{}", heuristics::extension(&item.file_name)));
    download_to(bot, &item.file_id, &input_path).await?;

    check_cancel(cancel)?;

    // Render the new name; the template never carries the extension
    let extracted = heuristics::extract(&item.file_name);
    let template = user.rename_template.as_deref().unwrap_or("{title}");
    let mut new_name = heuristics::render_template(template, &extracted);
    if new_name.is_empty() {
        new_name = extracted.title.clone();
    }
    if new_name.is_empty() {
        new_name = item.file_name.clone();
    } else {
        new_name.push_str(heuristics::extension(&item.file_name));
    }

    let output_path = work_dir.join(&new_name);
    if user.metadata.enabled && !user.metadata.tags().is_empty() {
        edit_status(
            bot,
            job.chat_id,
            status_id,
            task_id,
            format!("⚙️ Stamping metadata: {}", new_name),
        )
        .await;
        super::ffmpeg::stamp_metadata(&input_path, &output_path, &user.metadata).await?;
        let _ = fs::remove_file(&input_path).await;
    } else {
        fs::rename(&input_path, &output_path).await?;
    }

    check_cancel(cancel)?;
    edit_status(
        bot,
        job.chat_id,
        status_id,
        task_id,
        format!("⬆️ Uploading: {}", new_name),
    )
    .await;

    // Thumbnails can't be passed by file id, they must be uploaded
    let thumb_path = match &user.thumbnail {
        Some(file_id) => {
            let path = work_dir.join("thumb.jpg");
            match download_to(bot, file_id, &path).await {
                Ok(()) => Some(path),
                Err(e) => {
                    warn!("Thumbnail download failed for {}: {}", user.user_id, e);
                    None
                }
            }
        }
        None => None,
    };

    let caption = match &user.caption_template {
        Some(template) => heuristics::render_caption(
            template,
            &new_name,
            &format_file_size(job.file_size),
            &job.duration.map(format_media_duration).unwrap_or_default(),
        ),
        None => new_name.clone(),
    };

    let sent = upload(bot, job.chat_id, item.kind, &output_path, &caption, thumb_path).await?;

    // Copy to the dump channel, with a source line when the user opted in
    if let Some(dump_id) = state.config.dump_channel_id {
        let dump = ChatId(dump_id);
        if let Err(e) = bot.copy_message(dump, job.chat_id, sent.id).await {
            warn!("Dump-channel copy failed: {}", e);
        } else if user.show_source {
            let _ = bot
                .send_message(
                    dump,
                    format!("Source: {} (user {})", item.file_name, user.user_id),
                )
                .await;
        }
    }

    // Ledger: charge non-premium users, then retire the queue item
    let now = chrono::Utc::now().timestamp();
    if !user.is_premium(now) {
        match state
            .users
            .deduct_points(user.user_id, state.config.points_per_rename)
            .await
        {
            Ok(true) => {}
            // A concurrent rename emptied the balance first; this file was
            // already delivered, so only the charge is skipped.
            Ok(false) => warn!("Balance exhausted mid-rename for {}", user.user_id),
            Err(e) => warn!("Points deduction failed for {}: {}", user.user_id, e),
        }
    }
    if let Err(e) = state.users.pop_queue(user.user_id, &item.file_id).await {
        warn!("Queue pop failed for {}: {}", user.user_id, e);
    }

    Ok(new_name)
}

async fn upload(
    bot: &ThrottledBot,
    chat_id: ChatId,
    kind: MediaKind,
    path: &Path,
    caption: &str,
    thumb: Option<PathBuf>,
) -> Result<Message, RenameError> {
    let input = InputFile::file(path.to_path_buf());

    let sent = match kind {
        MediaKind::Document => {
            let mut request = bot.send_document(chat_id, input).caption(caption.to_string());
            if let Some(thumb) = thumb {
                request = request.thumbnail(InputFile::file(thumb));
            }
            request.await?
        }
        MediaKind::Video => {
            let mut request = bot.send_video(chat_id, input).caption(caption.to_string());
            if let Some(thumb) = thumb {
                request = request.thumbnail(InputFile::file(thumb));
            }
            request.await?
        }
        MediaKind::Audio => {
            let mut request = bot.send_audio(chat_id, input).caption(caption.to_string());
            if let Some(thumb) = thumb {
                request = request.thumbnail(InputFile::file(thumb));
            }
            request.await?
        }
    };

    Ok(sent)
}

/// Fetch a Telegram file to a local path.
async fn download_to(bot: &ThrottledBot, file_id: &str, dest: &Path) -> Result<(), RenameError> {
    let file = bot.get_file(file_id).await?;
    let mut out = fs::File::create(dest).await?;
    bot.inner().download_file(&file.path, &mut out).await?;
    Ok(())
}

fn check_cancel(cancel: &Arc<AtomicBool>) -> Result<(), RenameError> {
    if cancel.load(Ordering::Relaxed) {
        return Err(RenameError::Cancelled);
    }
    Ok(())
}

/// Editing the text drops the inline keyboard, so every progress edit
/// reattaches the cancel button.
async fn edit_status(
    bot: &ThrottledBot,
    chat_id: ChatId,
    status_id: MessageId,
    task_id: u64,
    text: String,
) {
    let _ = bot
        .edit_message_text(chat_id, status_id, text)
        .reply_markup(cancel_keyboard(task_id))
        .await;
}

fn cancel_keyboard(task_id: u64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✖️ Cancel",
        format!("cancel:{}", task_id),
    )]])
}
