//! Force-subscribe gate.
//!
//! Users must be members of the configured channels before the bot
//! serves them.

mod checker;

pub use checker::SubscriptionGate;
