//! Configuration module for the Renamix bot.
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Bot running mode
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    Polling,
    Webhook,
}

impl Default for BotMode {
    fn default() -> Self {
        Self::Polling
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Bot username (without @) for deep link construction.
    /// Optional - will be fetched via getMe if not set.
    pub bot_username: Option<String>,

    /// Owner user IDs (comma-separated).
    /// These users have full access to admin commands and bypass the gate.
    pub owner_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Channel that receives a copy of every processed file, if set.
    pub dump_channel_id: Option<i64>,

    /// Channels a user must join before the bot serves them.
    /// Each entry is `chat_id:invite_link` or a bare `@username`.
    pub force_sub_channels: Vec<ForceSubChannel>,

    /// Scratch directory for downloads and ffmpeg output.
    pub download_dir: String,

    // Points economy
    pub points_per_rename: i64,
    pub referral_points: i64,

    // URL shortener (optional; /genlink is disabled without it)
    pub shortener_url: Option<String>,
    pub shortener_api_key: Option<String>,
}

/// A channel the force-subscribe gate checks membership against.
#[derive(Debug, Clone)]
pub struct ForceSubChannel {
    /// Numeric chat id (`-100...`) or `@username`.
    pub chat: String,
    /// Invite link shown on the join button. Derived for `@username` entries.
    pub invite_link: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_mode = env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase();

        let bot_mode = match bot_mode.as_str() {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();

        // Validate webhook URL is set if mode is webhook
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            panic!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = env::var("WEBHOOK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8443);

        // Parse owner IDs
        let owner_ids = env::var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        // Parse bot username (strip @ if present)
        let bot_username = env::var("BOT_USERNAME")
            .ok()
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let dump_channel_id = env::var("DUMP_CHANNEL_ID")
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok());

        let force_sub_channels = env::var("FORCE_SUB_CHANNELS")
            .unwrap_or_default()
            .split(',')
            .filter_map(parse_force_sub_entry)
            .collect();

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: env::var("WEBHOOK_SECRET").ok(),
            bot_username,
            owner_ids,
            mongodb_uri: env::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "renamix".to_string()),
            dump_channel_id,
            force_sub_channels,
            download_dir: env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "downloads".to_string()),
            points_per_rename: env::var("POINTS_PER_RENAME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            referral_points: env::var("REFERRAL_POINTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            shortener_url: env::var("SHORTENER_URL").ok().filter(|s| !s.is_empty()),
            shortener_api_key: env::var("SHORTENER_API_KEY").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }
}

/// Parse one FORCE_SUB_CHANNELS entry.
///
/// Accepted forms:
/// - `@channelname` (invite link becomes `https://t.me/channelname`)
/// - `-1001234567890:https://t.me/+abcdef` (private channel with invite link)
fn parse_force_sub_entry(raw: &str) -> Option<ForceSubChannel> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(username) = raw.strip_prefix('@') {
        return Some(ForceSubChannel {
            chat: format!("@{}", username),
            invite_link: format!("https://t.me/{}", username),
        });
    }

    let (chat, link) = raw.split_once(':')?;
    let chat = chat.trim();
    let link = link.trim();
    if chat.parse::<i64>().is_err() || link.is_empty() {
        return None;
    }

    Some(ForceSubChannel {
        chat: chat.to_string(),
        invite_link: link.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_force_sub_username() {
        let entry = parse_force_sub_entry("@mychannel").unwrap();
        assert_eq!(entry.chat, "@mychannel");
        assert_eq!(entry.invite_link, "https://t.me/mychannel");
    }

    #[test]
    fn test_parse_force_sub_private() {
        let entry = parse_force_sub_entry("-1001234567890:https://t.me/+abc").unwrap();
        assert_eq!(entry.chat, "-1001234567890");
        assert_eq!(entry.invite_link, "https://t.me/+abc");
    }

    #[test]
    fn test_parse_force_sub_rejects_garbage() {
        assert!(parse_force_sub_entry("").is_none());
        assert!(parse_force_sub_entry("not-a-channel").is_none());
    }
}
