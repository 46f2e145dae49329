//! Points link document model.
//!
//! A shareable code that credits points to whoever opens the bot through
//! its deep link. Each user can claim a given code once; the owner cannot
//! claim their own code.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointsLink {
    /// Generated alphanumeric code (primary key).
    pub code: String,
    /// User who generated the link.
    pub owner_id: i64,
    /// Points credited per claim.
    pub points: i64,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Users who already claimed this code.
    #[serde(default)]
    pub claimed_by: Vec<i64>,
}

impl PointsLink {
    pub fn new(code: String, owner_id: i64, points: i64) -> Self {
        Self {
            code,
            owner_id,
            points,
            created_at: chrono::Utc::now().timestamp(),
            claimed_by: Vec::new(),
        }
    }

    /// Whether `user_id` may claim this link.
    pub fn claimable_by(&self, user_id: i64) -> bool {
        user_id != self.owner_id && !self.claimed_by.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_cannot_claim() {
        let link = PointsLink::new("abc123".into(), 42, 5);
        assert!(!link.claimable_by(42));
        assert!(link.claimable_by(7));
    }

    #[test]
    fn test_single_claim_per_user() {
        let mut link = PointsLink::new("abc123".into(), 42, 5);
        link.claimed_by.push(7);
        assert!(!link.claimable_by(7));
        assert!(link.claimable_by(8));
    }
}
