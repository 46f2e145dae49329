//! Points link repository.
//!
//! No caching: links are claimed once per user and read rarely.

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::debug;

use crate::database::models::PointsLink;
use crate::database::Database;

pub struct PointsLinkRepository {
    collection: Collection<PointsLink>,
}

impl PointsLinkRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("points_links"),
        }
    }

    /// Store a freshly generated link.
    pub async fn create(&self, link: &PointsLink) -> Result<()> {
        self.collection.insert_one(link).await?;
        debug!("Created points link {} worth {}", link.code, link.points);
        Ok(())
    }

    pub async fn get(&self, code: &str) -> Result<Option<PointsLink>> {
        Ok(self.collection.find_one(doc! { "code": code }).await?)
    }

    /// Try to claim a code for `user_id`.
    ///
    /// Returns the credited points, or None when the code is unknown,
    /// owned by the claimer, or already claimed by them. The claim marker
    /// is added atomically so a double-tap cannot credit twice.
    pub async fn claim(&self, code: &str, user_id: i64) -> Result<Option<i64>> {
        let Some(link) = self.get(code).await? else {
            return Ok(None);
        };

        if !link.claimable_by(user_id) {
            return Ok(None);
        }

        // Guard against a concurrent claim by the same user: the filter
        // re-checks claimed_by, so only one update can match.
        let filter = doc! { "code": code, "claimed_by": { "$ne": user_id } };
        let result = self
            .collection
            .update_one(filter, doc! { "$push": { "claimed_by": user_id } })
            .await?;

        if result.modified_count == 0 {
            return Ok(None);
        }

        Ok(Some(link.points))
    }
}
