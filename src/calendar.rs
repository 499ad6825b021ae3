//! # Calendar Module
//!
//! Inline-keyboard date picker: the user drills down year → month → day,
//! each step re-rendering the keyboard, until a day selection produces a
//! complete date. The picker owns the `cal|` callback namespace so the
//! outer dialogue only has to distinguish "still picking" from "done".

use chrono::{Datelike, NaiveDate};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// How many years forward from the current one are offered.
const YEARS_AHEAD: i32 = 2;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Outcome of feeding one callback into the picker.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarStep {
    /// Selection incomplete; re-render with this keyboard.
    Picking {
        keyboard: InlineKeyboardMarkup,
        stage: &'static str,
    },
    /// A full date was selected.
    Done(NaiveDate),
}

/// Callback data the picker does not recognise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedSelection;

impl std::fmt::Display for MalformedSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed calendar selection")
    }
}

impl std::error::Error for MalformedSelection {}

/// Keyboard for the first step: pick a year.
pub fn year_keyboard(today: NaiveDate) -> InlineKeyboardMarkup {
    let row = (today.year()..=today.year() + YEARS_AHEAD)
        .map(|year| InlineKeyboardButton::callback(year.to_string(), format!("cal|y|{year}")))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

fn month_keyboard(year: i32) -> InlineKeyboardMarkup {
    let buttons = MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            InlineKeyboardButton::callback(
                (*name).to_string(),
                format!("cal|m|{year}|{}", idx + 1),
            )
        })
        .collect::<Vec<_>>();
    let rows = buttons.chunks(3).map(|chunk| chunk.to_vec()).collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

fn day_keyboard(year: i32, month: u32, day_count: u32) -> InlineKeyboardMarkup {
    let buttons = (1..=day_count)
        .map(|day| {
            InlineKeyboardButton::callback(day.to_string(), format!("cal|d|{year}|{month}|{day}"))
        })
        .collect::<Vec<_>>();
    let rows = buttons.chunks(7).map(|chunk| chunk.to_vec()).collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_month.signed_duration_since(first).num_days() as u32)
}

/// Advance the picker with one `cal|…` callback payload.
///
/// `cal|y|<year>` and `cal|m|<year>|<month>` yield the next keyboard;
/// `cal|d|<year>|<month>|<day>` completes the date. Anything else, including
/// out-of-range dates, is a malformed selection.
pub fn process(data: &str) -> Result<CalendarStep, MalformedSelection> {
    let parts: Vec<&str> = data.split('|').collect();
    if parts.first() != Some(&"cal") {
        return Err(MalformedSelection);
    }

    match parts.as_slice() {
        ["cal", "y", year] => {
            let year: i32 = year.parse().map_err(|_| MalformedSelection)?;
            Ok(CalendarStep::Picking {
                keyboard: month_keyboard(year),
                stage: "month",
            })
        }
        ["cal", "m", year, month] => {
            let year: i32 = year.parse().map_err(|_| MalformedSelection)?;
            let month: u32 = month.parse().map_err(|_| MalformedSelection)?;
            let day_count = days_in_month(year, month).ok_or(MalformedSelection)?;
            Ok(CalendarStep::Picking {
                keyboard: day_keyboard(year, month, day_count),
                stage: "day",
            })
        }
        ["cal", "d", year, month, day] => {
            let year: i32 = year.parse().map_err(|_| MalformedSelection)?;
            let month: u32 = month.parse().map_err(|_| MalformedSelection)?;
            let day: u32 = day.parse().map_err(|_| MalformedSelection)?;
            let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(MalformedSelection)?;
            Ok(CalendarStep::Done(date))
        }
        _ => Err(MalformedSelection),
    }
}
