//! Database model exports.

pub mod points_link;
pub mod sequence;
pub mod user;

pub use points_link::PointsLink;
pub use sequence::{SequenceSession, SequencedFile};
pub use user::{BotUser, MediaKind, MediaMeta, QueueItem};
