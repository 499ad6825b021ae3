//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::booking_api::BookingClient;
use crate::db;
use crate::dialogue::{end_dialogue, SearchCommand, SearchDialogue, SearchState};
use crate::session::SessionStore;

use super::dialogue_manager::{
    handle_city_input, handle_max_distance_input, handle_max_price_input, handle_min_price_input,
    start_search,
};
use super::ui_builder::{history_keyboard, main_menu_keyboard};

/// How many past searches `/history` lists.
const HISTORY_LIMIT: i64 = 10;

const WELCOME_TEXT: &str = "👋 Welcome to Hotel Bot!\n\n\
    I can help you find hotels using Booking data.\n\
    Choose a command below:\n\n\
    🔎 /lowprice — cheapest hotels\n\
    ⭐ /guest_rating — top by guest rating\n\
    📍 /bestdeal — best near city center (distance + price)\n\
    🕘 /history — your search history\n\
    ℹ️ /help — how it works";

const HELP_TEXT: &str = "🤖 Hotel Search Bot — commands:\n\n\
    /start — start bot\n\
    /help — show this help\n\n\
    Search:\n\
    /lowprice — find hotels (city + dates)\n\
    /guest_rating — top by rating\n\
    /bestdeal — best deal near center (distance + price)\n\n\
    /history — show search history\n\
    /cancel — cancel current search\n\n\
    Tip: Use /lowprice to begin.";

/// Dispatch one incoming message: commands first, then free-text input
/// routed by whatever state the search dialogue is in.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: SearchDialogue,
    pool: Arc<SqlitePool>,
    api: Arc<BookingClient>,
    sessions: SessionStore,
) -> Result<()> {
    let Some(text) = msg.text() else {
        bot.send_message(
            msg.chat.id,
            "I only understand text here. Use /help to see the commands.",
        )
        .await?;
        return Ok(());
    };
    let text = text.trim();
    debug!(user_id = %msg.chat.id, "Received text message");

    if let Some(command) = SearchCommand::from_command_text(text) {
        return start_search(&bot, &msg, dialogue, &sessions, command).await;
    }

    match text {
        "/start" => {
            bot.send_message(msg.chat.id, WELCOME_TEXT)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        "/help" => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
        }
        "/cancel" => {
            sessions.reset(msg.chat.id.0);
            end_dialogue(&dialogue).await?;
            info!(user_id = %msg.chat.id, "Dialogue cancelled by user");
            bot.send_message(msg.chat.id, "Cancelled ❌").await?;
        }
        "/history" => {
            handle_history_command(&bot, &msg, &pool).await?;
        }
        _ => {
            handle_dialogue_text(&bot, &msg, dialogue, &pool, &api, &sessions, text).await?;
        }
    }

    Ok(())
}

/// List the user's recent searches as a replay keyboard.
async fn handle_history_command(bot: &Bot, msg: &Message, pool: &SqlitePool) -> Result<()> {
    let entries = match db::list_recent(pool, msg.chat.id.0, HISTORY_LIMIT).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to load search history");
            bot.send_message(msg.chat.id, "❌ Could not load history. Try again later.")
                .await?;
            return Ok(());
        }
    };

    if entries.is_empty() {
        bot.send_message(msg.chat.id, "History is empty. Run /lowprice first.")
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "🕘 Your last searches (choose one):")
        .reply_markup(history_keyboard(&entries))
        .await?;

    Ok(())
}

/// Route plain text into the dialogue state expecting it.
async fn handle_dialogue_text(
    bot: &Bot,
    msg: &Message,
    dialogue: SearchDialogue,
    pool: &SqlitePool,
    api: &BookingClient,
    sessions: &SessionStore,
    text: &str,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        SearchState::AskCity { criteria } => {
            handle_city_input(bot, msg, dialogue, api, criteria, text).await?;
        }
        SearchState::AskMinPrice { criteria } => {
            handle_min_price_input(bot, msg, dialogue, criteria, text).await?;
        }
        SearchState::AskMaxPrice { criteria } => {
            handle_max_price_input(bot, msg, dialogue, pool, api, sessions, criteria, text).await?;
        }
        SearchState::AskMaxDistance { criteria } => {
            handle_max_distance_input(bot, msg, dialogue, pool, api, sessions, criteria, text)
                .await?;
        }
        SearchState::PickLocation { .. }
        | SearchState::AskCheckIn { .. }
        | SearchState::AskCheckOut { .. } => {
            bot.send_message(msg.chat.id, "Please use the buttons above to continue.")
                .await?;
        }
        SearchState::Idle => {
            bot.send_message(
                msg.chat.id,
                "Use /lowprice to start a hotel search, or /help for all commands.",
            )
            .await?;
        }
    }

    Ok(())
}
