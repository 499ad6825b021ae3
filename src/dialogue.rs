//! Search dialogue module: conversation states, accumulated criteria and the
//! input validators applied at each step.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::booking_api::Destination;

/// The three search commands, each driving the same dialogue with its own
/// filtering/ordering at the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchCommand {
    LowPrice,
    GuestRating,
    BestDeal,
}

impl SearchCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCommand::LowPrice => "lowprice",
            SearchCommand::GuestRating => "guest_rating",
            SearchCommand::BestDeal => "bestdeal",
        }
    }

    /// Map a `/command` message onto a search command.
    pub fn from_command_text(text: &str) -> Option<Self> {
        match text {
            "/lowprice" => Some(SearchCommand::LowPrice),
            "/guest_rating" => Some(SearchCommand::GuestRating),
            "/bestdeal" => Some(SearchCommand::BestDeal),
            _ => None,
        }
    }
}

/// Dialogue answers accumulated field-by-field as states complete.
///
/// `min_price`, `max_price` and `max_distance_km` use 0 as the "no bound"
/// sentinel. `check_out > check_in` strictly once both are set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub command: SearchCommand,
    pub city: String,
    pub dest_id: String,
    pub search_type: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub min_price: f64,
    pub max_price: f64,
    pub max_distance_km: f64,
}

impl SearchCriteria {
    pub fn new(command: SearchCommand) -> Self {
        Self {
            command,
            city: String::new(),
            dest_id: String::new(),
            search_type: String::new(),
            check_in: None,
            check_out: None,
            min_price: 0.0,
            max_price: 0.0,
            max_distance_km: 0.0,
        }
    }
}

/// Conversation state for the search dialogue.
///
/// The flow is linear per command with one branch: `AskMaxDistance` is only
/// entered for `bestdeal`. Each in-progress variant carries the criteria
/// collected so far; `PickLocation` also carries the candidate list backing
/// the inline keyboard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum SearchState {
    #[default]
    Idle,
    AskCity {
        criteria: SearchCriteria,
    },
    PickLocation {
        criteria: SearchCriteria,
        destinations: Vec<Destination>,
    },
    AskCheckIn {
        criteria: SearchCriteria,
    },
    AskCheckOut {
        criteria: SearchCriteria,
    },
    AskMinPrice {
        criteria: SearchCriteria,
    },
    AskMaxPrice {
        criteria: SearchCriteria,
    },
    AskMaxDistance {
        criteria: SearchCriteria,
    },
}

/// Type alias for the search dialogue.
pub type SearchDialogue = Dialogue<SearchState, InMemStorage<SearchState>>;

/// End the dialogue if one is active. `InMemStorage` treats removing an
/// absent record as an error, but for us "no dialogue" already is the
/// ended state (cancel while idle, stale inline keyboards).
pub async fn end_dialogue(dialogue: &SearchDialogue) -> anyhow::Result<()> {
    if dialogue.get().await?.is_some() {
        dialogue.exit().await?;
    }
    Ok(())
}

/// Validates a city name input.
pub fn validate_city(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    Ok(trimmed.to_string())
}

/// Parses a price or distance input as a non-negative number; 0 means
/// "no bound".
pub fn parse_amount(input: &str) -> Result<f64, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    let value: f64 = trimmed.parse().map_err(|_| "not_a_number")?;
    if !value.is_finite() {
        return Err("not_a_number");
    }
    if value < 0.0 {
        return Err("negative");
    }

    Ok(value)
}

/// A max price of 0 is unbounded; otherwise it must not undercut the min.
pub fn price_range_ok(min_price: f64, max_price: f64) -> bool {
    max_price == 0.0 || max_price >= min_price
}

/// Check-out must be strictly after check-in; same-day stays are rejected.
pub fn stay_dates_ok(check_in: NaiveDate, check_out: NaiveDate) -> bool {
    check_out > check_in
}
