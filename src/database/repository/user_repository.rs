//! User repository with on-demand caching.
//!
//! Short TTL (60s) since almost every update touches the user document.

use std::time::Duration;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;
use teloxide::types::User;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::models::{BotUser, QueueItem};
use crate::database::Database;

/// Repository for user documents.
pub struct UserRepository {
    collection: Collection<BotUser>,
    cache: TypedCache<i64, BotUser>,
}

impl UserRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let user_cache = cache.get_or_create(
            "users",
            CacheConfig::with_capacity(10_000).ttl(Duration::from_secs(60)),
        );

        Self {
            collection: db.collection("users"),
            cache: user_cache,
        }
    }

    /// Get a user, returning None if not exists.
    ///
    /// An expired timed ban is lifted here, so callers always see the
    /// effective ban state.
    pub async fn get(&self, user_id: i64) -> Result<Option<BotUser>> {
        if let Some(user) = self.cache.get(&user_id) {
            return Ok(Some(user));
        }

        let filter = doc! { "user_id": user_id };
        let mut result = self.collection.find_one(filter).await?;

        if let Some(user) = result.as_mut() {
            let now = chrono::Utc::now().timestamp();
            if user.ban_expired(now) {
                user.banned = false;
                user.ban_reason = None;
                user.ban_until = None;
                self.save(user).await?;
            } else {
                self.cache.insert(user_id, user.clone());
            }
        }

        Ok(result)
    }

    /// Get or create the document for a Telegram user.
    pub async fn get_or_create(&self, tg_user: &User) -> Result<BotUser> {
        if let Some(user) = self.get(tg_user.id.0 as i64).await? {
            return Ok(user);
        }

        let user = BotUser::from_telegram(tg_user);
        self.save(&user).await?;
        debug!("Created user document for {}", user.user_id);
        Ok(user)
    }

    /// Save a user document (upsert).
    pub async fn save(&self, user: &BotUser) -> Result<()> {
        let filter = doc! { "user_id": user.user_id };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(filter, user)
            .with_options(options)
            .await?;

        self.cache.insert(user.user_id, user.clone());
        Ok(())
    }

    /// Atomically adjust a user's points balance.
    ///
    /// Negative `delta` deducts. Relies on Mongo's single-document atomicity;
    /// the balance is never read-modify-written through the cache.
    pub async fn add_points(&self, user_id: i64, delta: i64) -> Result<()> {
        let filter = doc! { "user_id": user_id };
        self.collection
            .update_one(filter, doc! { "$inc": { "points": delta } })
            .await?;

        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Deduct points only when the balance covers the amount.
    ///
    /// The balance guard sits in the update filter, so concurrent renames
    /// racing the same balance cannot drive it negative. Returns whether
    /// the deduction applied.
    pub async fn deduct_points(&self, user_id: i64, amount: i64) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                covered_balance_filter(user_id, amount),
                doc! { "$inc": { "points": -amount } },
            )
            .await?;

        self.cache.invalidate(&user_id);
        Ok(result.modified_count > 0)
    }

    /// Append a queue item to a user's pending queue.
    pub async fn push_queue(&self, user_id: i64, item: &QueueItem) -> Result<()> {
        let filter = doc! { "user_id": user_id };
        let item = mongodb::bson::to_bson(item)?;
        self.collection
            .update_one(filter, doc! { "$push": { "queue": item } })
            .await?;

        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Remove a queue item by file id after processing.
    pub async fn pop_queue(&self, user_id: i64, file_id: &str) -> Result<()> {
        let filter = doc! { "user_id": user_id };
        self.collection
            .update_one(filter, doc! { "$pull": { "queue": { "file_id": file_id } } })
            .await?;

        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Drop a user's entire pending queue.
    pub async fn clear_queue(&self, user_id: i64) -> Result<()> {
        let filter = doc! { "user_id": user_id };
        self.collection
            .update_one(filter, doc! { "$set": { "queue": [] } })
            .await?;

        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Total number of known users.
    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    /// Number of users with premium active right now.
    pub async fn count_premium(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        Ok(self
            .collection
            .count_documents(doc! { "premium_until": { "$gt": now } })
            .await?)
    }

    /// All currently banned users (for /banlist).
    ///
    /// Lapsed timed bans are excluded in the query; the flag itself is
    /// only cleared lazily when the user is next read.
    pub async fn banned_users(&self) -> Result<Vec<BotUser>> {
        let now = chrono::Utc::now().timestamp();
        let cursor = self.collection.find(active_ban_filter(now)).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Stream every user id (for /broadcast).
    pub async fn all_user_ids(&self) -> Result<Vec<i64>> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut ids = Vec::new();
        while let Some(user) = cursor.try_next().await? {
            ids.push(user.user_id);
        }
        Ok(ids)
    }

    /// Invalidate the cached copy of a user document.
    pub fn invalidate(&self, user_id: i64) {
        self.cache.invalidate(&user_id);
    }
}

/// Filter matching users whose ban is in effect at `now`. A missing
/// `ban_until` is a permanent ban; `$eq: null` also matches the field
/// being absent.
fn active_ban_filter(now: i64) -> Document {
    doc! {
        "banned": true,
        "$or": [
            { "ban_until": null },
            { "ban_until": { "$gt": now } },
        ],
    }
}

/// Filter matching the user only while their balance covers `amount`.
fn covered_balance_filter(user_id: i64, amount: i64) -> Document {
    doc! { "user_id": user_id, "points": { "$gte": amount } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_ban_filter_excludes_lapsed_bans() {
        let filter = active_ban_filter(100);
        assert_eq!(
            filter,
            doc! {
                "banned": true,
                "$or": [
                    { "ban_until": null },
                    { "ban_until": { "$gt": 100_i64 } },
                ],
            }
        );
    }

    #[test]
    fn test_covered_balance_filter_guards_the_deduction() {
        let filter = covered_balance_filter(7, 3);
        assert_eq!(
            filter,
            doc! { "user_id": 7_i64, "points": { "$gte": 3_i64 } }
        );
    }
}
