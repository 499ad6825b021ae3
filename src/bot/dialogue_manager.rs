//! Dialogue Manager module for handling dialogue state transitions

use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use teloxide::prelude::*;
use tracing::{error, info, warn};

use crate::booking_api::BookingClient;
use crate::db;
use crate::dialogue::{
    parse_amount, price_range_ok, validate_city, SearchCommand, SearchCriteria, SearchDialogue,
    SearchState,
};
use crate::hotels::filter_and_sort;
use crate::session::{ResultSet, SessionStore};

use super::ui_builder::{format_hotel, hotel_nav_keyboard, locations_keyboard};

/// How many destination candidates the disambiguation keyboard offers.
const DESTINATION_LIMIT: usize = 5;

// Fixed occupancy for every search: 2 adults, 1 room, first result page.
const ADULTS: u32 = 2;
const ROOM_QTY: u32 = 1;
const FIRST_PAGE: u32 = 1;

/// Enter the search dialogue for one of the three commands: reset any
/// previous session state and ask for the city.
pub async fn start_search(
    bot: &Bot,
    msg: &Message,
    dialogue: SearchDialogue,
    sessions: &SessionStore,
    command: SearchCommand,
) -> Result<()> {
    sessions.reset(msg.chat.id.0);
    info!(user_id = %msg.chat.id, command = command.as_str(), "Search dialogue started");

    dialogue
        .update(SearchState::AskCity {
            criteria: SearchCriteria::new(command),
        })
        .await?;
    bot.send_message(msg.chat.id, "🏙️ Enter city name:").await?;

    Ok(())
}

/// Handle the city name typed in the `AskCity` state.
pub async fn handle_city_input(
    bot: &Bot,
    msg: &Message,
    dialogue: SearchDialogue,
    api: &BookingClient,
    mut criteria: SearchCriteria,
    input: &str,
) -> Result<()> {
    let city = match validate_city(input) {
        Ok(city) => city,
        Err(_) => {
            bot.send_message(msg.chat.id, "Please enter a valid city name.")
                .await?;
            // Keep dialogue active, user can try again
            return Ok(());
        }
    };

    criteria.city = city;

    let destinations = match api.search_destinations(&criteria.city, DESTINATION_LIMIT).await {
        Ok(destinations) => destinations,
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Destination search failed");
            bot.send_message(msg.chat.id, format!("❌ API error while searching city:\n{e}"))
                .await?;
            dialogue.exit().await?;
            return Ok(());
        }
    };

    if destinations.is_empty() {
        bot.send_message(msg.chat.id, "No locations found. Try another city name.")
            .await?;
        dialogue.update(SearchState::AskCity { criteria }).await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "📍 Choose a location from the list:")
        .reply_markup(locations_keyboard(&destinations))
        .await?;
    dialogue
        .update(SearchState::PickLocation {
            criteria,
            destinations,
        })
        .await?;

    Ok(())
}

/// Handle the minimum price typed in the `AskMinPrice` state.
pub async fn handle_min_price_input(
    bot: &Bot,
    msg: &Message,
    dialogue: SearchDialogue,
    mut criteria: SearchCriteria,
    input: &str,
) -> Result<()> {
    let min_price = match parse_amount(input) {
        Ok(value) => value,
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                "❗ Please enter a valid non-negative number for MIN price.",
            )
            .await?;
            return Ok(());
        }
    };

    criteria.min_price = min_price;
    bot.send_message(
        msg.chat.id,
        "💰 Enter MAX price (number, e.g. 300). If no limit, type 0:",
    )
    .await?;
    dialogue.update(SearchState::AskMaxPrice { criteria }).await?;

    Ok(())
}

/// Handle the maximum price typed in the `AskMaxPrice` state. For
/// `bestdeal` the dialogue continues with the distance question; the other
/// commands reach the terminal state and run the search.
#[allow(clippy::too_many_arguments)]
pub async fn handle_max_price_input(
    bot: &Bot,
    msg: &Message,
    dialogue: SearchDialogue,
    pool: &SqlitePool,
    api: &BookingClient,
    sessions: &SessionStore,
    mut criteria: SearchCriteria,
    input: &str,
) -> Result<()> {
    let max_price = match parse_amount(input) {
        Ok(value) => value,
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                "❗ Please enter a valid non-negative number for MAX price.",
            )
            .await?;
            return Ok(());
        }
    };

    if !price_range_ok(criteria.min_price, max_price) {
        bot.send_message(
            msg.chat.id,
            "❗ MAX price must be >= MIN price (or 0 for no limit). Try again:",
        )
        .await?;
        return Ok(());
    }

    criteria.max_price = max_price;

    if criteria.command == SearchCommand::BestDeal {
        bot.send_message(
            msg.chat.id,
            "📍 Enter MAX distance to city center in km (e.g. 5).\nIf no limit, type 0:",
        )
        .await?;
        dialogue
            .update(SearchState::AskMaxDistance { criteria })
            .await?;
        return Ok(());
    }

    run_search(bot, msg.chat.id, dialogue, pool, api, sessions, criteria).await
}

/// Handle the maximum distance typed in the `AskMaxDistance` state
/// (`bestdeal` only); completes the dialogue.
#[allow(clippy::too_many_arguments)]
pub async fn handle_max_distance_input(
    bot: &Bot,
    msg: &Message,
    dialogue: SearchDialogue,
    pool: &SqlitePool,
    api: &BookingClient,
    sessions: &SessionStore,
    mut criteria: SearchCriteria,
    input: &str,
) -> Result<()> {
    let max_distance = match parse_amount(input) {
        Ok(value) => value,
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                "❗ Please enter a valid non-negative number for distance (km).",
            )
            .await?;
            return Ok(());
        }
    };

    criteria.max_distance_km = max_distance;
    run_search(bot, msg.chat.id, dialogue, pool, api, sessions, criteria).await
}

/// Terminal state: query the provider with the accumulated criteria, filter
/// and sort the raw list, stash the result set, archive the search and
/// render the first hotel.
async fn run_search(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: SearchDialogue,
    pool: &SqlitePool,
    api: &BookingClient,
    sessions: &SessionStore,
    criteria: SearchCriteria,
) -> Result<()> {
    let (Some(check_in), Some(check_out)) = (criteria.check_in, criteria.check_out) else {
        // Dates are filled before the price states; reaching here means the
        // stored state was tampered with or lost.
        warn!(user_id = %chat_id, "Terminal state reached without stay dates");
        bot.send_message(chat_id, "❌ Search state was incomplete. Start again with /lowprice.")
            .await?;
        dialogue.exit().await?;
        return Ok(());
    };

    info!(
        user_id = %chat_id,
        command = criteria.command.as_str(),
        dest_id = %criteria.dest_id,
        "Running hotel search"
    );

    let hotels = match api
        .search_hotels(
            &criteria.dest_id,
            &criteria.search_type,
            check_in,
            check_out,
            ADULTS,
            ROOM_QTY,
            FIRST_PAGE,
        )
        .await
    {
        Ok(hotels) => hotels,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Hotel search failed");
            bot.send_message(chat_id, format!("❌ API error:\n{e}")).await?;
            dialogue.exit().await?;
            return Ok(());
        }
    };

    if hotels.is_empty() {
        bot.send_message(chat_id, "No hotels found for these dates.")
            .await?;
        dialogue.exit().await?;
        return Ok(());
    }

    let filtered = filter_and_sort(hotels, &criteria);
    if filtered.is_empty() {
        let report = if criteria.command == SearchCommand::BestDeal {
            format!(
                "No hotels found for your filters.\nPrice: {}-{}, Distance ≤ {} km.\nTry /bestdeal again.",
                criteria.min_price, criteria.max_price, criteria.max_distance_km
            )
        } else {
            format!(
                "No hotels found in price range {}–{}.\nTry again.",
                criteria.min_price, criteria.max_price
            )
        };
        bot.send_message(chat_id, report).await?;
        dialogue.exit().await?;
        return Ok(());
    }

    info!(user_id = %chat_id, results = filtered.len(), "Search completed");

    // Archiving is fire-and-forget: a failed insert must never block the
    // result rendering.
    if let Err(e) = db::append_history(pool, chat_id.0, &criteria, &filtered).await {
        error!(user_id = %chat_id, error = %e, "Failed to archive search history");
    }

    let first = &filtered[0];
    let total = filtered.len();
    let card = format_hotel(first);

    sessions.set_results(chat_id.0, ResultSet::new(filtered));

    bot.send_message(chat_id, card)
        .reply_markup(hotel_nav_keyboard(0, total))
        .await?;
    dialogue.exit().await?;

    Ok(())
}
