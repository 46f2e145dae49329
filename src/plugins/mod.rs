//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod admin;
pub mod anime;
pub mod autorename;
pub mod caption;
pub mod help;
pub mod metadata;
pub mod points;
pub mod premium;
pub mod queue;
pub mod sequence;
pub mod start;
pub mod thumbnail;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::AppState;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start(String),

    #[command(description = "Help")]
    Help,

    // Rename settings
    #[command(description = "Set the rename template")]
    Autorename(String),

    #[command(description = "Toggle source info in the dump channel")]
    Setsource(String),

    // Metadata
    #[command(description = "Metadata panel")]
    Metadata,

    #[command(description = "Set metadata title")]
    Settitle(String),

    #[command(description = "Set metadata artist")]
    Setartist(String),

    #[command(description = "Set metadata author")]
    Setauthor(String),

    #[command(description = "Set metadata album")]
    Setalbum(String),

    #[command(description = "Set metadata genre")]
    Setgenre(String),

    #[command(description = "Set custom metadata comment")]
    Setcustom(String),

    // Caption
    #[command(rename = "set_caption", description = "Set the caption template")]
    SetCaption(String),

    #[command(rename = "see_caption", description = "Show the caption template")]
    SeeCaption,

    #[command(rename = "del_caption", description = "Delete the caption template")]
    DelCaption,

    // Thumbnail
    #[command(description = "Show the saved thumbnail")]
    Viewthumb,

    #[command(description = "Delete the saved thumbnail")]
    Delthumb,

    // Queue
    #[command(description = "Show pending files")]
    Queue,

    #[command(description = "Clear pending files")]
    Clearqueue,

    // Points & premium
    #[command(description = "Points balance")]
    Points,

    #[command(description = "Your referral link")]
    Refer,

    #[command(description = "Generate a shareable points link")]
    Genlink(String),

    #[command(description = "Premium status")]
    Myplan,

    // Sequence
    #[command(description = "Start collecting files for sequencing")]
    Startsequence,

    #[command(description = "Send collected files in episode order")]
    Endsequence,

    #[command(description = "Discard the sequence session")]
    Cancelsequence,

    // Anime lookup
    #[command(description = "Identify the anime scene in a replied photo")]
    Whatanime,

    // Admin commands
    #[command(description = "Bot statistics")]
    Stats,

    #[command(description = "Broadcast the replied message to all users")]
    Broadcast,

    #[command(description = "Ban a user")]
    Ban(String),

    #[command(description = "Unban a user")]
    Unban(String),

    #[command(description = "List banned users")]
    Banlist,

    #[command(description = "Grant points to a user")]
    Addpoints(String),

    #[command(description = "Grant premium to a user")]
    Addpremium(String),

    #[command(description = "Revoke premium from a user")]
    Delpremium(String),
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(help::help_command))
        // Rename settings
        .branch(case![Command::Autorename(args)].endpoint(autorename::autorename_command))
        .branch(case![Command::Setsource(args)].endpoint(autorename::setsource_command))
        // Metadata
        .branch(case![Command::Metadata].endpoint(metadata::metadata_command))
        .branch(case![Command::Settitle(args)].endpoint(metadata::settitle_command))
        .branch(case![Command::Setartist(args)].endpoint(metadata::setartist_command))
        .branch(case![Command::Setauthor(args)].endpoint(metadata::setauthor_command))
        .branch(case![Command::Setalbum(args)].endpoint(metadata::setalbum_command))
        .branch(case![Command::Setgenre(args)].endpoint(metadata::setgenre_command))
        .branch(case![Command::Setcustom(args)].endpoint(metadata::setcustom_command))
        // Caption
        .branch(case![Command::SetCaption(args)].endpoint(caption::set_caption_command))
        .branch(case![Command::SeeCaption].endpoint(caption::see_caption_command))
        .branch(case![Command::DelCaption].endpoint(caption::del_caption_command))
        // Thumbnail
        .branch(case![Command::Viewthumb].endpoint(thumbnail::viewthumb_command))
        .branch(case![Command::Delthumb].endpoint(thumbnail::delthumb_command))
        // Queue
        .branch(case![Command::Queue].endpoint(queue::queue_command))
        .branch(case![Command::Clearqueue].endpoint(queue::clearqueue_command))
        // Points & premium
        .branch(case![Command::Points].endpoint(points::points_command))
        .branch(case![Command::Refer].endpoint(points::refer_command))
        .branch(case![Command::Genlink(args)].endpoint(points::genlink_command))
        .branch(case![Command::Myplan].endpoint(premium::myplan_command))
        // Sequence
        .branch(case![Command::Startsequence].endpoint(sequence::startsequence_command))
        .branch(case![Command::Endsequence].endpoint(sequence::endsequence_command))
        .branch(case![Command::Cancelsequence].endpoint(sequence::cancelsequence_command))
        // Anime lookup
        .branch(case![Command::Whatanime].endpoint(anime::whatanime_command))
        // Admin
        .branch(case![Command::Stats].endpoint(admin::stats_command))
        .branch(case![Command::Broadcast].endpoint(admin::broadcast_command))
        .branch(case![Command::Ban(args)].endpoint(admin::ban_command))
        .branch(case![Command::Unban(args)].endpoint(admin::unban_command))
        .branch(case![Command::Banlist].endpoint(admin::banlist_command))
        .branch(case![Command::Addpoints(args)].endpoint(admin::addpoints_command))
        .branch(case![Command::Addpremium(args)].endpoint(premium::addpremium_command))
        .branch(case![Command::Delpremium(args)].endpoint(premium::delpremium_command))
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query()
        .branch(
            callback_prefix("cancel:").endpoint(queue::cancel_callback),
        )
        .branch(
            callback_prefix("meta:").endpoint(metadata::meta_callback),
        )
        .branch(
            callback_prefix("fsub:").endpoint(fsub_refresh_callback),
        )
        .branch(dptree::endpoint(help::callback_handler))
}

fn callback_prefix(prefix: &'static str) -> UpdateHandler<anyhow::Error> {
    dptree::filter(move |q: CallbackQuery| {
        q.data.as_ref().map(|d| d.starts_with(prefix)).unwrap_or(false)
    })
}

/// Handle the "I joined, check again" button under the gate prompt.
async fn fsub_refresh_callback(
    bot: crate::bot::dispatcher::ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    state.gate.forget(q.from.id);
    let missing = state.gate.missing_channels(q.from.id).await;

    if missing.is_empty() {
        bot.answer_callback_query(q.id)
            .text("✅ Thanks! You can use the bot now.")
            .await?;
        if let Some(msg) = q.message {
            let _ = bot.delete_message(msg.chat().id, msg.id()).await;
        }
    } else {
        bot.answer_callback_query(q.id)
            .text("You still need to join all channels.")
            .show_alert(true)
            .await?;
    }

    Ok(())
}
