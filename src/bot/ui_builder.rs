//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::booking_api::Destination;
use crate::db::HistoryEntry;
use crate::hotels::{self, HotelRecord};

/// Maximum characters of the accessibility label shown on a hotel card.
const CARD_LABEL_LIMIT: usize = 350;

/// Persistent reply keyboard with the bot commands.
pub fn main_menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new("/lowprice"),
            KeyboardButton::new("/guest_rating"),
        ],
        vec![
            KeyboardButton::new("/bestdeal"),
            KeyboardButton::new("/history"),
        ],
        vec![KeyboardButton::new("/help"), KeyboardButton::new("/cancel")],
    ])
}

/// One button per destination candidate plus a cancel row.
///
/// Callback data has to stay short, so only the essentials are encoded:
/// `loc|<dest_id>|<search_type>`.
pub fn locations_keyboard(destinations: &[Destination]) -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = destinations
        .iter()
        .map(|d| {
            vec![InlineKeyboardButton::callback(
                d.display_label().to_string(),
                format!("loc|{}|{}", d.dest_id, d.search_type),
            )]
        })
        .collect();

    buttons.push(vec![InlineKeyboardButton::callback(
        "❌ Cancel".to_string(),
        "loc_cancel".to_string(),
    )]);

    InlineKeyboardMarkup::new(buttons)
}

/// Navigation keyboard for the hotel card at `index` of `total`.
///
/// Prev is offered iff the cursor can move back, Next iff it can move
/// forward; the photos/info row is always present.
pub fn hotel_nav_keyboard(index: usize, total: usize) -> InlineKeyboardMarkup {
    let mut buttons = Vec::new();

    let mut nav_row = Vec::new();
    if index > 0 {
        nav_row.push(InlineKeyboardButton::callback("⬅️ Prev", "hotel_prev"));
    }
    if index + 1 < total {
        nav_row.push(InlineKeyboardButton::callback("Next ➡️", "hotel_next"));
    }
    if !nav_row.is_empty() {
        buttons.push(nav_row);
    }

    buttons.push(vec![
        InlineKeyboardButton::callback("📷 Photos", "hotel_photos"),
        InlineKeyboardButton::callback("ℹ️ Info", "hotel_info"),
    ]);

    InlineKeyboardMarkup::new(buttons)
}

/// One button per stored search, newest first.
pub fn history_keyboard(entries: &[HistoryEntry]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .map(|entry| {
            vec![InlineKeyboardButton::callback(
                entry.label(),
                format!("hist_open|{}", entry.id),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Truncate to at most `limit` characters, appending an ellipsis when
/// anything was cut. Operates on chars, not bytes, so multi-byte text
/// never splits mid-character.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(limit).collect();
        truncated.push('…');
        truncated
    }
}

/// Render one hotel as the text card shown while paging through results.
pub fn format_hotel(hotel: &HotelRecord) -> String {
    let property = hotel.property.as_ref();

    let name = hotels::hotel_name(hotel);
    let hotel_id = hotel
        .hotel_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    let price_text = match hotels::price_value(hotel) {
        Some(value) => {
            let currency = property
                .and_then(|p| p.price_breakdown.as_ref())
                .and_then(|pb| pb.gross_price.as_ref())
                .and_then(|gp| gp.currency.as_deref())
                .unwrap_or("");
            format!("{value:.2} {currency}").trim_end().to_string()
        }
        None => "-".to_string(),
    };

    let checkin = property
        .and_then(|p| p.checkin_date.as_deref())
        .unwrap_or("");
    let checkout = property
        .and_then(|p| p.checkout_date.as_deref())
        .unwrap_or("");

    let coordinates = match (
        property.and_then(|p| p.latitude),
        property.and_then(|p| p.longitude),
    ) {
        (Some(lat), Some(lon)) => format!("{lat}, {lon}"),
        _ => "-".to_string(),
    };

    let short_desc = truncate_chars(
        hotel
            .accessibility_label
            .as_deref()
            .unwrap_or("")
            .trim(),
        CARD_LABEL_LIMIT,
    );

    format!(
        "🏨 {name}\n\
         🆔 hotel_id: {hotel_id}\n\
         💰 Price: {price_text}\n\
         📅 Dates: {checkin} → {checkout}\n\
         📍 Coordinates: {coordinates}\n\n\
         {short_desc}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotels::{GrossPrice, PriceBreakdown, Property};

    fn sample_hotel() -> HotelRecord {
        HotelRecord {
            hotel_id: Some(1377073),
            accessibility_label: Some("8.6 Fabulous 1432 reviews. 1.2 km from downtown.".into()),
            property: Some(Property {
                name: Some("Hotel Le Six".into()),
                latitude: Some(48.8443),
                longitude: Some(2.3266),
                checkin_date: Some("2026-09-01".into()),
                checkout_date: Some("2026-09-04".into()),
                price_breakdown: Some(PriceBreakdown {
                    gross_price: Some(GrossPrice {
                        value: Some(842.16),
                        currency: Some("USD".into()),
                    }),
                }),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_format_hotel_card() {
        let card = format_hotel(&sample_hotel());
        assert!(card.contains("🏨 Hotel Le Six"));
        assert!(card.contains("hotel_id: 1377073"));
        assert!(card.contains("842.16 USD"));
        assert!(card.contains("2026-09-01 → 2026-09-04"));
        assert!(card.contains("48.8443, 2.3266"));
    }

    #[test]
    fn test_format_hotel_with_missing_fields() {
        let bare = HotelRecord {
            hotel_id: None,
            accessibility_label: None,
            property: None,
        };
        let card = format_hotel(&bare);
        assert!(card.contains("🏨 Hotel"));
        assert!(card.contains("💰 Price: -"));
        assert!(card.contains("📍 Coordinates: -"));
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("short", 350), "short");

        let long = "é".repeat(400);
        let cut = truncate_chars(&long, 350);
        assert_eq!(cut.chars().count(), 351); // 350 kept + ellipsis
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_nav_keyboard_affordances() {
        // First of three: no Prev
        let first = hotel_nav_keyboard(0, 3);
        let texts: Vec<&str> = first.inline_keyboard[0]
            .iter()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Next ➡️"]);

        // Middle: both
        let middle = hotel_nav_keyboard(1, 3);
        assert_eq!(middle.inline_keyboard[0].len(), 2);

        // Last: no Next; the photos/info row remains
        let last = hotel_nav_keyboard(2, 3);
        let texts: Vec<&str> = last.inline_keyboard[0]
            .iter()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(texts, vec!["⬅️ Prev"]);
        assert_eq!(last.inline_keyboard.len(), 2);

        // Single result: only the photos/info row
        let single = hotel_nav_keyboard(0, 1);
        assert_eq!(single.inline_keyboard.len(), 1);
        assert_eq!(single.inline_keyboard[0].len(), 2);
    }

    #[test]
    fn test_locations_keyboard_has_cancel_row() {
        let destinations = vec![
            Destination {
                dest_id: "-1456928".into(),
                search_type: "city".into(),
                label: Some("Paris, France".into()),
                name: None,
            },
            Destination {
                dest_id: "903".into(),
                search_type: "district".into(),
                label: Some("Le Marais".into()),
                name: None,
            },
        ];

        let markup = locations_keyboard(&destinations);
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[0][0].text, "Paris, France");
        assert_eq!(markup.inline_keyboard[2][0].text, "❌ Cancel");
    }
}
