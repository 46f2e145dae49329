//! Media intake - the rename trigger.
//!
//! Every document/video/audio sent in private chat lands here after the
//! gate. Sequence mode collects the file instead; otherwise the file is
//! enqueued and a pipeline task is spawned.

use teloxide::prelude::*;
use tracing::debug;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{MediaKind, QueueItem, SequencedFile};
use crate::rename::{heuristics, pipeline};

/// Details pulled off an incoming media message.
struct IncomingFile {
    file_id: String,
    file_name: String,
    mime_type: Option<String>,
    kind: MediaKind,
    size: u64,
    duration: Option<u32>,
}

fn incoming_file(msg: &Message) -> Option<IncomingFile> {
    if let Some(doc) = msg.document() {
        return Some(IncomingFile {
            file_id: doc.file.id.clone(),
            file_name: doc
                .file_name
                .clone()
                .unwrap_or_else(|| "file.bin".to_string()),
            mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
            kind: MediaKind::Document,
            size: doc.file.size as u64,
            duration: None,
        });
    }
    if let Some(video) = msg.video() {
        return Some(IncomingFile {
            file_id: video.file.id.clone(),
            file_name: video
                .file_name
                .clone()
                .unwrap_or_else(|| "video.mp4".to_string()),
            mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
            kind: MediaKind::Video,
            size: video.file.size as u64,
            duration: Some(video.duration.seconds()),
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(IncomingFile {
            file_id: audio.file.id.clone(),
            file_name: audio
                .file_name
                .clone()
                .unwrap_or_else(|| "audio.mp3".to_string()),
            mime_type: audio.mime_type.as_ref().map(|m| m.to_string()),
            kind: MediaKind::Audio,
            size: audio.file.size as u64,
            duration: Some(audio.duration.seconds()),
        });
    }
    None
}

pub async fn handle_media(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(file) = incoming_file(msg) else {
        return Ok(());
    };

    let user = state.users.get_or_create(tg_user).await?;
    debug!("Media intake from {}: {}", user.user_id, file.file_name);

    // Sequence mode: collect, don't rename
    if user.sequence_mode {
        let episode = heuristics::extract(&file.file_name).episode;
        let sequenced = SequencedFile {
            file_id: file.file_id,
            file_name: file.file_name,
            episode,
            kind: file.kind,
        };
        state.sequences.push_file(user.user_id, &sequenced).await?;

        let count = state
            .sequences
            .get(user.user_id)
            .await?
            .map(|s| s.files.len())
            .unwrap_or(0);
        bot.send_message(
            msg.chat.id,
            format!("📥 Added to sequence ({} file(s)). Send /endsequence when done.", count),
        )
        .await?;
        return Ok(());
    }

    if user.rename_template.is_none() {
        bot.send_message(
            msg.chat.id,
            "Set a rename template first with /autorename <template>.\n\
             Example: /autorename MyShow S{season}E{episode} [{quality}]",
        )
        .await?;
        return Ok(());
    }

    // Points check up front so we never download something we won't process
    let now = chrono::Utc::now().timestamp();
    let cost = state.config.points_per_rename;
    if !user.is_premium(now) && user.points < cost {
        bot.send_message(
            msg.chat.id,
            format!(
                "❌ Not enough points (need {}, you have {}).\n\
                 Earn more with /refer or upgrade with /myplan.",
                cost, user.points
            ),
        )
        .await?;
        return Ok(());
    }

    let item = QueueItem::new(
        file.file_id.clone(),
        file.file_name.clone(),
        file.mime_type.clone(),
        file.kind,
    );
    state.users.push_queue(user.user_id, &item).await?;

    let job = pipeline::RenameJob {
        chat_id: msg.chat.id,
        user,
        item,
        file_size: file.size,
        duration: file.duration,
    };

    // The pipeline reports progress and errors itself through the status
    // message, so the spawned task has nothing to return.
    let bot = bot.clone();
    let state = state.clone();
    tokio::spawn(async move {
        pipeline::run(bot, state, job).await;
    });

    Ok(())
}
