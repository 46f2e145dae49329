//! Outbound HTTP clients.

mod shortener;
mod tracemoe;

pub use shortener::Shortener;
pub use tracemoe::{SceneMatch, TraceMoe};
