//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MaybeInaccessibleMessage};
use tracing::{debug, error, info};

use crate::booking_api::BookingClient;
use crate::calendar::{self, CalendarStep};
use crate::db;
use crate::dialogue::{end_dialogue, stay_dates_ok, SearchDialogue, SearchState};
use crate::session::{CurrentHotel, ResultSet, SessionStore};

use super::ui_builder::{format_hotel, hotel_nav_keyboard, truncate_chars};

/// How many photos one photos request sends.
const PHOTO_LIMIT: usize = 3;

/// Telegram-friendly cap on description length.
const DESCRIPTION_LIMIT: usize = 3500;

/// Handle callback queries from inline keyboards: location picks, calendar
/// steps, hotel navigation and history replay.
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: SearchDialogue,
    pool: Arc<SqlitePool>,
    api: Arc<BookingClient>,
    sessions: SessionStore,
) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    if let Some(msg) = q.message.clone() {
        let data = q.data.as_deref().unwrap_or("");
        route_callback(&bot, &msg, &dialogue, &pool, &api, &sessions, data).await?;
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id).await?;

    Ok(())
}

async fn route_callback(
    bot: &Bot,
    msg: &MaybeInaccessibleMessage,
    dialogue: &SearchDialogue,
    pool: &SqlitePool,
    api: &BookingClient,
    sessions: &SessionStore,
    data: &str,
) -> Result<()> {
    let chat_id = msg.chat().id;

    if data == "loc_cancel" {
        sessions.reset(chat_id.0);
        end_dialogue(dialogue).await?;
        bot.edit_message_text(chat_id, msg.id(), "Cancelled ❌").await?;
        return Ok(());
    }

    if data.starts_with("loc|") {
        return handle_location_pick(bot, msg, dialogue, data).await;
    }

    if data.starts_with("cal|") {
        return handle_calendar_step(bot, msg, dialogue, data).await;
    }

    match data {
        "hotel_prev" => {
            let current = sessions.step_prev(chat_id.0);
            return render_current(bot, msg, current).await;
        }
        "hotel_next" => {
            let current = sessions.step_next(chat_id.0);
            return render_current(bot, msg, current).await;
        }
        "hotel_photos" => return handle_photos(bot, chat_id, api, sessions).await,
        "hotel_info" => return handle_info(bot, chat_id, api, sessions).await,
        _ => {}
    }

    if let Some(entry_id) = data.strip_prefix("hist_open|") {
        return handle_history_replay(bot, msg, pool, sessions, entry_id).await;
    }

    // Ignore callbacks that belong to no known control.
    Ok(())
}

/// A destination was picked (or the selection was malformed). A selection
/// that does not match the cached candidates ends the dialogue defensively
/// rather than guessing intent.
async fn handle_location_pick(
    bot: &Bot,
    msg: &MaybeInaccessibleMessage,
    dialogue: &SearchDialogue,
    data: &str,
) -> Result<()> {
    let chat_id = msg.chat().id;

    let SearchState::PickLocation {
        mut criteria,
        destinations,
    } = dialogue.get().await?.unwrap_or_default()
    else {
        // Stale keyboard from an earlier dialogue; nothing to do.
        return Ok(());
    };

    let parts: Vec<&str> = data.split('|').collect();
    let known = match parts.as_slice() {
        ["loc", dest_id, search_type] => destinations
            .iter()
            .any(|d| d.dest_id == *dest_id && d.search_type == *search_type),
        _ => false,
    };

    if !known {
        error!(user_id = %chat_id, data, "Malformed location selection");
        bot.edit_message_text(chat_id, msg.id(), "❌ Invalid selection. Try /lowprice again.")
            .await?;
        dialogue.exit().await?;
        return Ok(());
    }

    criteria.dest_id = parts[1].to_string();
    criteria.search_type = parts[2].to_string();

    bot.edit_message_text(chat_id, msg.id(), "📅 Choose check-in date:")
        .reply_markup(calendar::year_keyboard(Utc::now().date_naive()))
        .await?;
    dialogue.update(SearchState::AskCheckIn { criteria }).await?;

    Ok(())
}

/// Advance the calendar picker for whichever date the dialogue is waiting
/// on. Intermediate steps re-render the picker in place; a completed
/// check-out is validated against the recorded check-in.
async fn handle_calendar_step(
    bot: &Bot,
    msg: &MaybeInaccessibleMessage,
    dialogue: &SearchDialogue,
    data: &str,
) -> Result<()> {
    let chat_id = msg.chat().id;
    let state = dialogue.get().await?.unwrap_or_default();

    let step = match calendar::process(data) {
        Ok(step) => step,
        Err(e) => {
            error!(user_id = %chat_id, data, error = %e, "Malformed calendar selection");
            bot.edit_message_text(chat_id, msg.id(), "❌ Invalid selection. Try /lowprice again.")
                .await?;
            end_dialogue(dialogue).await?;
            return Ok(());
        }
    };

    match state {
        SearchState::AskCheckIn { mut criteria } => match step {
            CalendarStep::Picking { keyboard, stage } => {
                bot.edit_message_text(
                    chat_id,
                    msg.id(),
                    format!("📅 Choose check-in date ({stage}):"),
                )
                .reply_markup(keyboard)
                .await?;
            }
            CalendarStep::Done(date) => {
                criteria.check_in = Some(date);
                bot.edit_message_text(
                    chat_id,
                    msg.id(),
                    format!("✅ Check-in: {date}\n\n📅 Choose check-out date:"),
                )
                .reply_markup(calendar::year_keyboard(Utc::now().date_naive()))
                .await?;
                dialogue.update(SearchState::AskCheckOut { criteria }).await?;
            }
        },
        SearchState::AskCheckOut { mut criteria } => match step {
            CalendarStep::Picking { keyboard, stage } => {
                bot.edit_message_text(
                    chat_id,
                    msg.id(),
                    format!("📅 Choose check-out date ({stage}):"),
                )
                .reply_markup(keyboard)
                .await?;
            }
            CalendarStep::Done(date) => {
                let Some(check_in) = criteria.check_in else {
                    bot.edit_message_text(
                        chat_id,
                        msg.id(),
                        "❌ Search state was incomplete. Start again with /lowprice.",
                    )
                    .await?;
                    dialogue.exit().await?;
                    return Ok(());
                };

                if !stay_dates_ok(check_in, date) {
                    // Re-prompt for check-out only; check-in stays recorded.
                    bot.edit_message_text(
                        chat_id,
                        msg.id(),
                        format!(
                            "❗ Check-out must be after check-in.\nCheck-in: {check_in}\n\n📅 Choose a new check-out date:"
                        ),
                    )
                    .reply_markup(calendar::year_keyboard(Utc::now().date_naive()))
                    .await?;
                    return Ok(());
                }

                criteria.check_out = Some(date);
                bot.edit_message_text(
                    chat_id,
                    msg.id(),
                    "💰 Enter MIN price (number, e.g. 50).\nIf you don't want a minimum limit, type 0:",
                )
                .await?;
                dialogue.update(SearchState::AskMinPrice { criteria }).await?;
            }
        },
        _ => {
            // Calendar callback outside the date states: stale keyboard.
        }
    }

    Ok(())
}

/// Re-render the hotel card after a navigation step, or ask the user to
/// search again when no results are cached.
async fn render_current(
    bot: &Bot,
    msg: &MaybeInaccessibleMessage,
    current: Option<CurrentHotel>,
) -> Result<()> {
    let chat_id = msg.chat().id;

    let Some(current) = current else {
        bot.edit_message_text(chat_id, msg.id(), "No hotels cached. Run /lowprice again.")
            .await?;
        return Ok(());
    };

    bot.edit_message_text(chat_id, msg.id(), format_hotel(&current.hotel))
        .reply_markup(hotel_nav_keyboard(current.index, current.total))
        .await?;

    Ok(())
}

/// Fetch and send up to [`PHOTO_LIMIT`] photos of the cursored hotel.
async fn handle_photos(
    bot: &Bot,
    chat_id: ChatId,
    api: &BookingClient,
    sessions: &SessionStore,
) -> Result<()> {
    let Some(current) = sessions.current(chat_id.0) else {
        bot.send_message(chat_id, "No hotels cached. Run /lowprice again.")
            .await?;
        return Ok(());
    };

    let Some(hotel_id) = current.hotel.hotel_id else {
        bot.send_message(chat_id, "No hotel_id found for this item.")
            .await?;
        return Ok(());
    };

    let urls = match api.hotel_photos(hotel_id).await {
        Ok(urls) => urls,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Photos request failed");
            bot.send_message(chat_id, format!("❌ Photos API error:\n{e}"))
                .await?;
            return Ok(());
        }
    };

    if urls.is_empty() {
        bot.send_message(chat_id, "No photos found for this hotel.")
            .await?;
        return Ok(());
    }

    let mut sent = 0;
    for url in &urls {
        match reqwest::Url::parse(url) {
            Ok(parsed) => {
                bot.send_photo(chat_id, InputFile::url(parsed)).await?;
                sent += 1;
            }
            Err(_) => debug!(user_id = %chat_id, url, "Skipping unparseable photo URL"),
        }
        if sent >= PHOTO_LIMIT {
            break;
        }
    }

    if sent == 0 {
        bot.send_message(chat_id, "Photos exist but no usable URL fields found.")
            .await?;
    }

    Ok(())
}

/// Fetch and send the description of the cursored hotel.
async fn handle_info(
    bot: &Bot,
    chat_id: ChatId,
    api: &BookingClient,
    sessions: &SessionStore,
) -> Result<()> {
    let Some(current) = sessions.current(chat_id.0) else {
        bot.send_message(chat_id, "No hotels cached. Run /lowprice again.")
            .await?;
        return Ok(());
    };

    let Some(hotel_id) = current.hotel.hotel_id else {
        bot.send_message(chat_id, "No hotel_id found for this item.")
            .await?;
        return Ok(());
    };

    let description = match api.description(hotel_id, "en-us").await {
        Ok(description) => description,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Description request failed");
            bot.send_message(chat_id, format!("❌ Info API error:\n{e}"))
                .await?;
            return Ok(());
        }
    };

    let description = description.trim();
    if description.is_empty() {
        bot.send_message(chat_id, "No description text found for this hotel.")
            .await?;
        return Ok(());
    }

    let description = truncate_chars(description, DESCRIPTION_LIMIT);
    bot.send_message(chat_id, format!("ℹ️ Description:\n\n{description}"))
        .await?;

    Ok(())
}

/// Rehydrate a stored search into the session and render its first hotel,
/// exactly as a fresh search would.
async fn handle_history_replay(
    bot: &Bot,
    msg: &MaybeInaccessibleMessage,
    pool: &SqlitePool,
    sessions: &SessionStore,
    entry_id: &str,
) -> Result<()> {
    let chat_id = msg.chat().id;

    let Ok(entry_id) = entry_id.parse::<i64>() else {
        bot.edit_message_text(chat_id, msg.id(), "Invalid history selection.")
            .await?;
        return Ok(());
    };

    let entry = match db::get_by_id(pool, entry_id).await {
        Ok(entry) => entry,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "History lookup failed");
            bot.edit_message_text(chat_id, msg.id(), "❌ Could not load history. Try again later.")
                .await?;
            return Ok(());
        }
    };

    let Some(entry) = entry else {
        bot.edit_message_text(chat_id, msg.id(), "History item not found.")
            .await?;
        return Ok(());
    };

    let hotels = match entry.hotels() {
        Ok(hotels) => hotels,
        Err(e) => {
            error!(user_id = %chat_id, entry_id, error = %e, "History snapshot is corrupt");
            bot.edit_message_text(chat_id, msg.id(), "Stored snapshot could not be decoded.")
                .await?;
            return Ok(());
        }
    };

    let Some(first) = hotels.first().cloned() else {
        bot.edit_message_text(chat_id, msg.id(), "History item is empty.")
            .await?;
        return Ok(());
    };

    info!(user_id = %chat_id, entry_id, hotels = hotels.len(), "History entry replayed");

    let total = hotels.len();
    sessions.set_results(chat_id.0, ResultSet::new(hotels));

    bot.edit_message_text(
        chat_id,
        msg.id(),
        format!(
            "✅ Loaded history:\n{} | {} | {}→{}\n\nShowing first hotel:",
            entry.command, entry.city, entry.checkin, entry.checkout
        ),
    )
    .await?;
    bot.send_message(chat_id, format_hotel(&first))
        .reply_markup(hotel_nav_keyboard(0, total))
        .await?;

    Ok(())
}
