//! Repository module - data access layer over the Mongo collections.

mod points_link_repository;
mod sequence_repository;
mod user_repository;

pub use points_link_repository::PointsLinkRepository;
pub use sequence_repository::SequenceRepository;
pub use user_repository::UserRepository;
