//! # Hotel Records Module
//!
//! Typed view of the booking-com15 hotel payload plus the filter/sort engine
//! applied to raw search results.
//!
//! The provider echoes most hotel facts inside `accessibilityLabel`, a
//! free-text blurb, so the guest rating and the distance to downtown are
//! best-effort extractions from prose. Both extractors are kept pure and
//! separate from any I/O so they stay unit-testable.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dialogue::{SearchCommand, SearchCriteria};

/// One hotel as returned by the provider's hotel search.
///
/// Every field is optional: the provider omits fields freely, and an absent
/// field means "no data", never an error. Records are immutable once
/// fetched; the engine only filters, reorders and copies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    #[serde(default)]
    pub hotel_id: Option<i64>,
    #[serde(default, rename = "accessibilityLabel")]
    pub accessibility_label: Option<String>,
    #[serde(default)]
    pub property: Option<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wishlist_name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub checkin_date: Option<String>,
    #[serde(default)]
    pub checkout_date: Option<String>,
    #[serde(default)]
    pub price_breakdown: Option<PriceBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    #[serde(default)]
    pub gross_price: Option<GrossPrice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrossPrice {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

// Sort-key fallbacks for records that slipped past the filters; the
// bestdeal filter already excludes hotels without a distance, so these
// values are never expected to decide an ordering.
const DISTANCE_SENTINEL: f64 = 9999.0;
const PRICE_SENTINEL: f64 = 1e18;

lazy_static! {
    static ref DISTANCE_RE: Regex = Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*km\s+from\s+downtown")
        .expect("distance pattern should be valid");
}

/// Numeric gross price of the hotel, if the provider sent one.
///
/// A hotel without a parseable price is excluded from every command's
/// results, so this is the one extraction that gates inclusion.
pub fn price_value(hotel: &HotelRecord) -> Option<f64> {
    hotel
        .property
        .as_ref()?
        .price_breakdown
        .as_ref()?
        .gross_price
        .as_ref()?
        .value
}

/// Guest rating parsed out of the accessibility label.
///
/// The provider buries the rating in prose like "8.9 Excellent 2249
/// reviews"; the first whitespace-separated token that parses as a float
/// wins. A label with no parseable token yields 0.0, which conflates
/// "unrated" with "worst rating" — preserved as-is because the ordering of
/// existing deployments depends on it.
pub fn guest_rating(hotel: &HotelRecord) -> f64 {
    hotel
        .accessibility_label
        .as_deref()
        .unwrap_or("")
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Distance to downtown in kilometres, extracted from the accessibility
/// label ("2.8 km from downtown"). Returns `None` when the label carries no
/// such phrase.
pub fn distance_km(hotel: &HotelRecord) -> Option<f64> {
    let label = hotel.accessibility_label.as_deref()?;
    let captures = DISTANCE_RE.captures(label)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}

/// Display name of the hotel, falling back through the provider's
/// alternate name fields.
pub fn hotel_name(hotel: &HotelRecord) -> &str {
    let property = hotel.property.as_ref();
    property
        .and_then(|p| p.name.as_deref())
        .or_else(|| property.and_then(|p| p.wishlist_name.as_deref()))
        .unwrap_or("Hotel")
}

/// Apply the price/distance range filter and the per-command ordering.
///
/// Filter rules:
/// - price must be present; `min_price`/`max_price` of 0 mean unbounded
/// - `bestdeal` additionally requires a parseable distance within
///   `max_distance_km` (0 = unbounded)
///
/// Ordering rules:
/// - `lowprice`: provider order preserved
/// - `guest_rating`: rating descending, ties keep provider order
/// - `bestdeal`: distance ascending, then price ascending
pub fn filter_and_sort(hotels: Vec<HotelRecord>, criteria: &SearchCriteria) -> Vec<HotelRecord> {
    let mut filtered: Vec<HotelRecord> = hotels
        .into_iter()
        .filter(|hotel| passes_filters(hotel, criteria))
        .collect();

    match criteria.command {
        SearchCommand::LowPrice => {}
        SearchCommand::GuestRating => {
            filtered.sort_by(|a, b| {
                guest_rating(b)
                    .partial_cmp(&guest_rating(a))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        SearchCommand::BestDeal => {
            filtered.sort_by(|a, b| {
                let key_a = (
                    distance_km(a).unwrap_or(DISTANCE_SENTINEL),
                    price_value(a).unwrap_or(PRICE_SENTINEL),
                );
                let key_b = (
                    distance_km(b).unwrap_or(DISTANCE_SENTINEL),
                    price_value(b).unwrap_or(PRICE_SENTINEL),
                );
                key_a.partial_cmp(&key_b).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }

    filtered
}

fn passes_filters(hotel: &HotelRecord, criteria: &SearchCriteria) -> bool {
    let Some(price) = price_value(hotel) else {
        return false;
    };

    let min_ok = criteria.min_price == 0.0 || price >= criteria.min_price;
    let max_ok = criteria.max_price == 0.0 || price <= criteria.max_price;
    if !(min_ok && max_ok) {
        return false;
    }

    if criteria.command == SearchCommand::BestDeal {
        // Distance is mandatory for bestdeal; unparseable labels drop the
        // record regardless of price.
        let Some(distance) = distance_km(hotel) else {
            return false;
        };
        if criteria.max_distance_km != 0.0 && distance > criteria.max_distance_km {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::SearchCommand;

    fn hotel(id: i64, price: Option<f64>, label: &str) -> HotelRecord {
        HotelRecord {
            hotel_id: Some(id),
            accessibility_label: Some(label.to_string()),
            property: Some(Property {
                name: Some(format!("Hotel {id}")),
                price_breakdown: price.map(|value| PriceBreakdown {
                    gross_price: Some(GrossPrice {
                        value: Some(value),
                        currency: Some("USD".to_string()),
                    }),
                }),
                ..Default::default()
            }),
        }
    }

    fn criteria(command: SearchCommand) -> SearchCriteria {
        SearchCriteria::new(command)
    }

    fn ids(hotels: &[HotelRecord]) -> Vec<i64> {
        hotels.iter().filter_map(|h| h.hotel_id).collect()
    }

    #[test]
    fn test_price_extraction() {
        assert_eq!(price_value(&hotel(1, Some(120.5), "")), Some(120.5));
        assert_eq!(price_value(&hotel(2, None, "")), None);

        let bare = HotelRecord {
            hotel_id: Some(3),
            accessibility_label: None,
            property: None,
        };
        assert_eq!(price_value(&bare), None);
    }

    #[test]
    fn test_guest_rating_extraction() {
        let rated = hotel(1, Some(100.0), "8.9 Excellent 2249 reviews");
        assert_eq!(guest_rating(&rated), 8.9);

        // First parseable token wins, even when later tokens are numeric too.
        let noisy = hotel(2, Some(100.0), "Hotel rated 7.2 out of 10");
        assert_eq!(guest_rating(&noisy), 7.2);

        let unrated = hotel(3, Some(100.0), "No reviews yet");
        assert_eq!(guest_rating(&unrated), 0.0);
    }

    #[test]
    fn test_distance_extraction() {
        let near = hotel(1, Some(100.0), "Great stay \u{200e}2.8 km from downtown\u{202c}");
        assert_eq!(distance_km(&near), Some(2.8));

        let shouty = hotel(2, Some(100.0), "1 KM FROM DOWNTOWN");
        assert_eq!(distance_km(&shouty), Some(1.0));

        let vague = hotel(3, Some(100.0), "close to the centre");
        assert_eq!(distance_km(&vague), None);
    }

    #[test]
    fn test_price_range_filter() {
        let hotels = vec![
            hotel(1, Some(40.0), ""),
            hotel(2, Some(100.0), ""),
            hotel(3, Some(260.0), ""),
            hotel(4, None, ""),
        ];

        let mut c = criteria(SearchCommand::LowPrice);
        c.min_price = 50.0;
        c.max_price = 200.0;
        assert_eq!(ids(&filter_and_sort(hotels.clone(), &c)), vec![2]);

        // Zero bounds are sentinels for "unbounded"; priceless records are
        // still dropped.
        let open = criteria(SearchCommand::LowPrice);
        assert_eq!(ids(&filter_and_sort(hotels, &open)), vec![1, 2, 3]);
    }

    #[test]
    fn test_lowprice_preserves_provider_order() {
        let hotels = vec![
            hotel(1, Some(300.0), ""),
            hotel(2, Some(50.0), ""),
            hotel(3, Some(120.0), ""),
        ];
        let c = criteria(SearchCommand::LowPrice);
        assert_eq!(ids(&filter_and_sort(hotels, &c)), vec![1, 2, 3]);
    }

    #[test]
    fn test_guest_rating_sort_is_stable_on_ties() {
        let hotels = vec![
            hotel(1, Some(100.0), "7.2 Good"),
            hotel(2, Some(100.0), "9.1 Superb"),
            hotel(3, Some(100.0), "unrated property"),
            hotel(4, Some(100.0), "9.1 Superb"),
        ];
        let c = criteria(SearchCommand::GuestRating);
        // Tied 9.1 entries keep provider order; the unparseable rating sorts
        // last as 0.0.
        assert_eq!(ids(&filter_and_sort(hotels, &c)), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_bestdeal_sort_and_distance_exclusion() {
        let hotels = vec![
            hotel(1, Some(100.0), "3.0 km from downtown"),
            hotel(2, Some(200.0), "1.0 km from downtown"),
            hotel(3, Some(50.0), "no distance in label"),
            hotel(4, Some(150.0), "1.0 km from downtown"),
        ];
        let mut c = criteria(SearchCommand::BestDeal);
        c.max_distance_km = 5.0;
        // Distance ascending, price breaking the 1.0 km tie; the cheap
        // distance-less record is excluded outright.
        assert_eq!(ids(&filter_and_sort(hotels, &c)), vec![4, 2, 1]);
    }

    #[test]
    fn test_bestdeal_zero_distance_is_unbounded() {
        let hotels = vec![
            hotel(1, Some(100.0), "12.5 km from downtown"),
            hotel(2, Some(80.0), "0.4 km from downtown"),
        ];
        let c = criteria(SearchCommand::BestDeal);
        assert_eq!(ids(&filter_and_sort(hotels, &c)), vec![2, 1]);
    }

    #[test]
    fn test_filter_and_sort_is_idempotent() {
        let hotels = vec![
            hotel(1, Some(100.0), "3.0 km from downtown 7.1"),
            hotel(2, Some(200.0), "1.0 km from downtown 8.8"),
            hotel(3, Some(150.0), "1.0 km from downtown 9.6"),
        ];
        let mut c = criteria(SearchCommand::BestDeal);
        c.max_distance_km = 5.0;

        let once = filter_and_sort(hotels, &c);
        let twice = filter_and_sort(once.clone(), &c);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_hotel_record_deserializes_provider_shape() {
        let raw = serde_json::json!({
            "hotel_id": 1377073,
            "accessibilityLabel": "Hotel Le Six.\n4 out of 5 stars.\n8.6 Fabulous 1432 reviews.\n\u{200e}1.2 km from downtown\u{202c}.",
            "property": {
                "name": "Hotel Le Six",
                "latitude": 48.8443,
                "longitude": 2.3266,
                "checkinDate": "2026-09-01",
                "checkoutDate": "2026-09-04",
                "priceBreakdown": {
                    "grossPrice": { "value": 842.16, "currency": "USD" }
                },
                "reviewScore": 8.6
            },
            "somethingUnexpected": true
        });

        let record: HotelRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.hotel_id, Some(1377073));
        assert_eq!(price_value(&record), Some(842.16));
        assert_eq!(guest_rating(&record), 4.0);
        assert_eq!(distance_km(&record), Some(1.2));
        assert_eq!(hotel_name(&record), "Hotel Le Six");
    }
}
