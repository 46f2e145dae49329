//! Membership checker with caching.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, Recipient, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::config::ForceSubChannel;

/// Cache key for membership lookups.
type MemberCacheKey = (String, u64); // (channel, user_id)

/// Force-subscribe checker with caching support.
///
/// Bot owners (from OWNER_IDS env) automatically bypass the gate.
#[derive(Clone)]
pub struct SubscriptionGate {
    bot: Bot,
    channels: Arc<Vec<ForceSubChannel>>,
    cache: TypedCache<MemberCacheKey, bool>,
    owner_ids: Vec<u64>,
}

impl SubscriptionGate {
    pub fn new(
        bot: Bot,
        cache_registry: Arc<CacheRegistry>,
        channels: Vec<ForceSubChannel>,
        owner_ids: Vec<u64>,
    ) -> Self {
        let cache = cache_registry.get_or_create(
            "force_sub",
            CacheConfig::with_capacity(10_000)
                .ttl(Duration::from_secs(300)) // 5 minutes
                .tti(Duration::from_secs(120)), // 2 minutes idle
        );

        Self {
            bot,
            channels: Arc::new(channels),
            cache,
            owner_ids,
        }
    }

    /// Whether the gate is active at all.
    pub fn is_enabled(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Channels the user still has to join. Empty means the gate passes.
    ///
    /// Membership verdicts are cached; a "refresh" callback invalidates
    /// them so a freshly joined user passes immediately.
    pub async fn missing_channels(&self, user_id: UserId) -> Vec<ForceSubChannel> {
        if self.owner_ids.contains(&user_id.0) {
            return Vec::new();
        }

        let mut missing = Vec::new();
        for channel in self.channels.iter() {
            if !self.is_member(channel, user_id).await {
                missing.push(channel.clone());
            }
        }
        missing
    }

    /// Drop cached verdicts for a user so the next check hits the API.
    pub fn forget(&self, user_id: UserId) {
        for channel in self.channels.iter() {
            self.cache.invalidate(&(channel.chat.clone(), user_id.0));
        }
    }

    async fn is_member(&self, channel: &ForceSubChannel, user_id: UserId) -> bool {
        let cache_key = (channel.chat.clone(), user_id.0);

        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        let verdict = self.fetch_membership(channel, user_id).await;
        debug!(
            "Membership check for {} in {}: {}",
            user_id, channel.chat, verdict
        );

        self.cache.insert(cache_key, verdict);
        verdict
    }

    /// Fetch membership from the Telegram API.
    ///
    /// An API error (bot not in the channel, bad id) counts as a pass so a
    /// misconfigured gate never locks everyone out.
    async fn fetch_membership(&self, channel: &ForceSubChannel, user_id: UserId) -> bool {
        let recipient = match channel.chat.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(channel.chat.clone()),
        };

        match self.bot.get_chat_member(recipient, user_id).await {
            Ok(member) => !matches!(
                member.kind,
                ChatMemberKind::Left | ChatMemberKind::Banned(_)
            ),
            Err(e) => {
                debug!("get_chat_member failed for {}: {}", channel.chat, e);
                true
            }
        }
    }
}
