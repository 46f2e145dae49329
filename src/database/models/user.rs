//! User document model.
//!
//! One document per user holding every per-user setting, the pending file
//! queue and the points/premium/ban bookkeeping. Created on first /start,
//! mutated by every setting command.

use serde::{Deserialize, Serialize};
use teloxide::types::User;

/// Kind of media a file was received as.
///
/// Determines which send method the pipeline uses on re-upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Document,
    Video,
    Audio,
}

/// A file waiting to be processed, owned by exactly one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueItem {
    /// Telegram file id.
    pub file_id: String,
    /// Original file name as uploaded.
    pub file_name: String,
    /// MIME type reported by Telegram, if any.
    pub mime_type: Option<String>,
    pub kind: MediaKind,
    /// Unix timestamp of enqueue.
    pub created_at: i64,
}

impl QueueItem {
    pub fn new(file_id: String, file_name: String, mime_type: Option<String>, kind: MediaKind) -> Self {
        Self {
            file_id,
            file_name,
            mime_type,
            kind,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Metadata stamped onto processed files via ffmpeg.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MediaMeta {
    /// Whether metadata stamping is enabled at all.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl MediaMeta {
    /// Pairs of (ffmpeg tag, value) for every field that is set.
    pub fn tags(&self) -> Vec<(&'static str, &str)> {
        let mut tags = Vec::new();
        if let Some(v) = self.title.as_deref() {
            tags.push(("title", v));
        }
        if let Some(v) = self.artist.as_deref() {
            tags.push(("artist", v));
        }
        if let Some(v) = self.author.as_deref() {
            tags.push(("author", v));
        }
        if let Some(v) = self.album.as_deref() {
            tags.push(("album", v));
        }
        if let Some(v) = self.genre.as_deref() {
            tags.push(("genre", v));
        }
        if let Some(v) = self.custom.as_deref() {
            tags.push(("comment", v));
        }
        tags
    }
}

/// The per-user document stored in the `users` collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotUser {
    /// Telegram user ID (primary key).
    pub user_id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Unix timestamp of first contact.
    pub joined_at: i64,

    /// Files waiting to be processed.
    #[serde(default)]
    pub queue: Vec<QueueItem>,

    #[serde(default)]
    pub metadata: MediaMeta,

    /// Rename template with {season}/{episode}/{quality}/{title} placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_template: Option<String>,

    /// Telegram file id of the custom thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Caption template with {filename}/{filesize}/{duration} placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_template: Option<String>,

    /// Points balance. Renames deduct from this for non-premium users.
    #[serde(default)]
    pub points: i64,

    // --- Ban state ---
    #[serde(default)]
    pub banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    /// Unix timestamp the ban expires at; None on an active ban = permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_until: Option<i64>,

    /// Unix timestamp premium expires at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<i64>,

    // --- Referral ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<i64>,
    #[serde(default)]
    pub referrals: i64,

    /// While set, incoming files are collected into a sequence session
    /// instead of being renamed.
    #[serde(default)]
    pub sequence_mode: bool,

    /// Include the original file name in the dump-channel caption.
    #[serde(default)]
    pub show_source: bool,
}

impl BotUser {
    /// Create a fresh document for a Telegram user.
    pub fn from_telegram(user: &User) -> Self {
        Self {
            user_id: user.id.0 as i64,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
            joined_at: chrono::Utc::now().timestamp(),
            queue: Vec::new(),
            metadata: MediaMeta::default(),
            rename_template: None,
            thumbnail: None,
            caption_template: None,
            points: 0,
            banned: false,
            ban_reason: None,
            ban_until: None,
            premium_until: None,
            referred_by: None,
            referrals: 0,
            sequence_mode: false,
            show_source: false,
        }
    }

    /// Whether premium is active at `now` (unix secs).
    pub fn is_premium(&self, now: i64) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }

    /// Whether a ban is in effect at `now`. A timed ban that has expired
    /// no longer counts even before the document is cleaned up.
    pub fn is_banned(&self, now: i64) -> bool {
        if !self.banned {
            return false;
        }
        match self.ban_until {
            Some(until) => until > now,
            None => true,
        }
    }

    /// Whether a timed ban has lapsed and the flag should be cleared.
    pub fn ban_expired(&self, now: i64) -> bool {
        self.banned && self.ban_until.is_some_and(|until| until <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(banned: bool, ban_until: Option<i64>) -> BotUser {
        BotUser {
            user_id: 1,
            first_name: "Test".into(),
            username: None,
            joined_at: 0,
            queue: vec![],
            metadata: MediaMeta::default(),
            rename_template: None,
            thumbnail: None,
            caption_template: None,
            points: 0,
            banned,
            ban_reason: None,
            ban_until,
            premium_until: None,
            referred_by: None,
            referrals: 0,
            sequence_mode: false,
            show_source: false,
        }
    }

    #[test]
    fn test_permanent_ban_never_expires() {
        let u = user(true, None);
        assert!(u.is_banned(i64::MAX));
        assert!(!u.ban_expired(i64::MAX));
    }

    #[test]
    fn test_timed_ban_expires() {
        let u = user(true, Some(100));
        assert!(u.is_banned(99));
        assert!(!u.is_banned(100));
        assert!(u.ban_expired(100));
    }

    #[test]
    fn test_premium_window() {
        let mut u = user(false, None);
        assert!(!u.is_premium(0));
        u.premium_until = Some(1000);
        assert!(u.is_premium(999));
        assert!(!u.is_premium(1000));
    }

    #[test]
    fn test_metadata_tags_only_set_fields() {
        let meta = MediaMeta {
            enabled: true,
            title: Some("T".into()),
            genre: Some("G".into()),
            ..Default::default()
        };
        let tags = meta.tags();
        assert_eq!(tags, vec![("title", "T"), ("genre", "G")]);
    }
}
