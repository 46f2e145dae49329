//! Renamix - Telegram media rename bot
//!
//! Renames media files uploaded in private chat, stamps metadata through
//! ffmpeg and runs a points/premium economy on top of MongoDB.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB integration
//! - `cache` - LRU-based caching with Moka
//! - `gate` - Force-subscribe membership checking with caching
//! - `bot` - Core bot functionality (with Throttle for API rate limiting)
//! - `plugins` - Command handlers (extensible)
//! - `events` - Media intake and other non-command handlers
//! - `rename` - Download / ffmpeg / upload pipeline and filename heuristics
//! - `services` - Outbound HTTP clients (shortener, trace.moe)
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod database;
mod events;
mod gate;
mod plugins;
mod rename;
mod services;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::CacheRegistry;
use config::Config;
use database::Database;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // Initialize logging with sensible defaults
    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("renamix=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Renamix bot...");

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    // The download scratch directory must exist before the first pipeline run
    tokio::fs::create_dir_all(&config.download_dir).await?;

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let db = Arc::new(db);
    info!("Database connected");

    // Initialize cache registry
    let cache = Arc::new(CacheRegistry::new());

    // Initialize bot with Throttle for automatic rate limiting.
    // This also absorbs Telegram's retry-after responses so handlers
    // never sleep-and-retry themselves.
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    // Get bot info
    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    // Build dispatcher
    let dispatcher =
        bot::build_dispatcher(bot.clone(), db, cache, Arc::new(config.clone()), bot_username);

    // Run the bot
    bot::run(&config, dispatcher, bot).await;

    Ok(())
}
