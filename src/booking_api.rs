//! # Booking API Module
//!
//! Thin client for the booking-com15 RapidAPI provider: destination search,
//! hotel search, photos and descriptions. Calls are plain request/response
//! with a bounded timeout and no retries; a timeout surfaces as a transport
//! error like any other failed call.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hotels::HotelRecord;

const BASE_URL: &str = "https://booking-com15.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "booking-com15.p.rapidapi.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors raised by the provider. Missing optional fields in an otherwise
/// successful response are "no data", not an error.
#[derive(Debug, Clone)]
pub enum BookingApiError {
    /// Non-success HTTP status with the response body for context.
    Status { status: u16, body: String },
    /// Connection, timeout or payload-shape failure.
    Transport(String),
}

impl std::fmt::Display for BookingApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingApiError::Status { status, body } => {
                write!(f, "provider returned status {status}: {body}")
            }
            BookingApiError::Transport(msg) => write!(f, "provider transport error: {msg}"),
        }
    }
}

impl std::error::Error for BookingApiError {}

impl From<reqwest::Error> for BookingApiError {
    fn from(err: reqwest::Error) -> Self {
        BookingApiError::Transport(err.to_string())
    }
}

/// A location candidate returned by destination search, used to build the
/// disambiguation keyboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub dest_id: String,
    #[serde(default)]
    pub search_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Destination {
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn is_city(&self) -> bool {
        self.search_type.eq_ignore_ascii_case("city")
    }
}

#[derive(Debug, Default, Deserialize)]
struct DestinationResponse {
    #[serde(default)]
    data: Vec<Destination>,
}

#[derive(Debug, Default, Deserialize)]
struct HotelSearchResponse {
    #[serde(default)]
    data: Option<HotelSearchData>,
}

#[derive(Debug, Default, Deserialize)]
struct HotelSearchData {
    #[serde(default)]
    hotels: Vec<HotelRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct PhotosResponse {
    #[serde(default)]
    data: Option<PhotosData>,
}

#[derive(Debug, Default, Deserialize)]
struct PhotosData {
    #[serde(default)]
    photos: Vec<PhotoItem>,
}

#[derive(Debug, Default, Deserialize)]
struct PhotoItem {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "photoUrl")]
    photo_url: Option<String>,
    #[serde(default, rename = "mainUrl")]
    main_url: Option<String>,
}

impl PhotoItem {
    fn usable_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.photo_url.as_deref())
            .or(self.main_url.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct DescriptionResponse {
    #[serde(default)]
    data: Option<DescriptionData>,
}

#[derive(Debug, Default, Deserialize)]
struct DescriptionData {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hotel_description: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// City-type candidates sort before everything else; ties keep provider
/// order. Candidates without a `dest_id` are unusable and dropped.
fn order_destinations(mut items: Vec<Destination>, limit: usize) -> Vec<Destination> {
    items.retain(|d| !d.dest_id.is_empty());
    items.sort_by_key(|d| if d.is_city() { 0 } else { 1 });
    items.truncate(limit);
    items
}

/// Client for the booking-com15 provider.
pub struct BookingClient {
    http: reqwest::Client,
    api_key: String,
}

impl BookingClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, api_key })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BookingApiError> {
        let url = format!("{BASE_URL}{path}");
        debug!(path, "Calling provider endpoint");

        let response = self
            .http
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BookingApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BookingApiError::Transport(e.to_string()))
    }

    /// Destination candidates for a city query, city-type entries first,
    /// bounded to `limit`.
    pub async fn search_destinations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Destination>, BookingApiError> {
        let response: DestinationResponse = self
            .get_json(
                "/api/v1/hotels/searchDestination",
                &[
                    ("query", query.to_string()),
                    ("locale", "en-us".to_string()),
                ],
            )
            .await?;

        Ok(order_destinations(response.data, limit))
    }

    /// Raw hotel list for one destination and stay. A response without
    /// `data.hotels` is an empty list, not an error.
    #[allow(clippy::too_many_arguments)]
    pub async fn search_hotels(
        &self,
        dest_id: &str,
        search_type: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
        room_qty: u32,
        page: u32,
    ) -> Result<Vec<HotelRecord>, BookingApiError> {
        let response: HotelSearchResponse = self
            .get_json(
                "/api/v1/hotels/searchHotels",
                &[
                    ("dest_id", dest_id.to_string()),
                    ("search_type", search_type.to_string()),
                    ("arrival_date", check_in.format("%Y-%m-%d").to_string()),
                    ("departure_date", check_out.format("%Y-%m-%d").to_string()),
                    ("adults", adults.to_string()),
                    ("room_qty", room_qty.to_string()),
                    ("page_number", page.to_string()),
                    ("units", "metric".to_string()),
                    ("temperature_unit", "c".to_string()),
                    ("languagecode", "en-us".to_string()),
                    ("currency_code", "USD".to_string()),
                ],
            )
            .await?;

        Ok(response.data.map(|d| d.hotels).unwrap_or_default())
    }

    /// Photo URLs for one hotel, in provider order; photo entries with no
    /// usable URL field are skipped.
    pub async fn hotel_photos(&self, hotel_id: i64) -> Result<Vec<String>, BookingApiError> {
        let response: PhotosResponse = self
            .get_json(
                "/api/v1/hotels/getHotelPhotos",
                &[("hotel_id", hotel_id.to_string())],
            )
            .await?;

        let photos = response.data.map(|d| d.photos).unwrap_or_default();
        Ok(photos
            .iter()
            .filter_map(|p| p.usable_url().map(str::to_string))
            .collect())
    }

    /// Free-text description for one hotel; empty string when the provider
    /// sent none of the known description fields.
    pub async fn description(
        &self,
        hotel_id: i64,
        languagecode: &str,
    ) -> Result<String, BookingApiError> {
        let response: DescriptionResponse = self
            .get_json(
                "/api/v1/hotels/getDescriptionAndInfo",
                &[
                    ("hotel_id", hotel_id.to_string()),
                    ("languagecode", languagecode.to_string()),
                ],
            )
            .await?;

        let data = response.data.unwrap_or_default();
        Ok(data
            .description
            .or(data.hotel_description)
            .or(data.text)
            .unwrap_or_default())
    }
}
