//! Sequence session repository.
//!
//! Sessions are ephemeral, so reads go straight to the collection.

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::Collection;

use crate::database::models::{SequenceSession, SequencedFile};
use crate::database::Database;

pub struct SequenceRepository {
    collection: Collection<SequenceSession>,
}

impl SequenceRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("sequences"),
        }
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<SequenceSession>> {
        Ok(self.collection.find_one(doc! { "user_id": user_id }).await?)
    }

    /// Save a session (upsert).
    pub async fn save(&self, session: &SequenceSession) -> Result<()> {
        let filter = doc! { "user_id": session.user_id };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(filter, session)
            .with_options(options)
            .await?;
        Ok(())
    }

    /// Append a collected file without rewriting the whole session.
    pub async fn push_file(&self, user_id: i64, file: &SequencedFile) -> Result<()> {
        let file = mongodb::bson::to_bson(file)?;
        self.collection
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$push": { "files": file } },
            )
            .await?;
        Ok(())
    }

    /// Delete a session. Returns whether one existed.
    pub async fn delete(&self, user_id: i64) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
