//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command handlers and event handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::database::{Database, PointsLinkRepository, SequenceRepository, UserRepository};
use crate::events;
use crate::gate::SubscriptionGate;
use crate::plugins;
use crate::rename::TaskRegistry;
use crate::services::{Shortener, TraceMoe};

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// User repository.
    pub users: Arc<UserRepository>,

    /// Points link repository.
    pub points_links: Arc<PointsLinkRepository>,

    /// Sequence session repository.
    pub sequences: Arc<SequenceRepository>,

    /// Force-subscribe gate with membership caching.
    pub gate: SubscriptionGate,

    /// In-memory rename task bookkeeping (semaphores + cancel flags).
    pub tasks: TaskRegistry,

    /// URL-shortener client; None disables /genlink.
    pub shortener: Option<Shortener>,

    /// trace.moe client for /whatanime.
    pub tracemoe: TraceMoe,

    /// Bot username (without @) for deep link construction.
    pub bot_username: String,

    /// Unix timestamp of process start (for /stats uptime).
    pub started_at: i64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        bot: ThrottledBot,
        db: Arc<Database>,
        cache: Arc<CacheRegistry>,
        config: Arc<Config>,
        bot_username: String,
    ) -> Self {
        // The gate needs the inner Bot for API calls
        let gate = SubscriptionGate::new(
            bot.inner().clone(),
            cache.clone(),
            config.force_sub_channels.clone(),
            config.owner_ids.clone(),
        );

        // Create repositories
        let users = Arc::new(UserRepository::new(&db, &cache));
        let points_links = Arc::new(PointsLinkRepository::new(&db));
        let sequences = Arc::new(SequenceRepository::new(&db));

        let shortener = match (&config.shortener_url, &config.shortener_api_key) {
            (Some(url), Some(key)) => Some(Shortener::new(url.clone(), key.clone())),
            _ => None,
        };

        Self {
            config,
            users,
            points_links,
            sequences,
            gate,
            tasks: TaskRegistry::new(),
            shortener,
            tracemoe: TraceMoe::new(),
            bot_username,
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.config.is_owner(user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    db: Arc<Database>,
    cache: Arc<CacheRegistry>,
    config: Arc<Config>,
    bot_username: String,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(bot.clone(), db, cache, config, bot_username);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
///
/// The force-subscribe gate sits in front of both commands and media intake;
/// banned users are filtered in the same place.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    let message_handler = Update::filter_message()
        .branch(events::gate_handler())
        .branch(plugins::command_handler())
        .branch(events::message_event_handler());

    let callback_handler = plugins::callback_handler();

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}
