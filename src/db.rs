//! # Database Module
//!
//! Append-only search history: one row per completed search, including a
//! JSON snapshot of the filtered hotel list so past results can be replayed
//! without calling the provider again.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::info;

use crate::dialogue::SearchCriteria;
use crate::hotels::HotelRecord;

/// One stored search with its result snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub command: String,
    pub city: String,
    pub dest_id: String,
    pub search_type: String,
    pub checkin: String,
    pub checkout: String,
    pub min_price: f64,
    pub max_price: f64,
    pub created_at: DateTime<Utc>,
    pub hotels_json: String,
}

impl HistoryEntry {
    /// Deserialize the stored hotel snapshot.
    pub fn hotels(&self) -> Result<Vec<HotelRecord>> {
        serde_json::from_str(&self.hotels_json).context("Failed to decode hotels snapshot")
    }

    /// Short label for the history keyboard: timestamp, command, city.
    pub fn label(&self) -> String {
        format!(
            "{} | {} | {}",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.command,
            self.city
        )
    }
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            command TEXT NOT NULL,
            city TEXT NOT NULL,
            dest_id TEXT NOT NULL,
            search_type TEXT NOT NULL,
            checkin TEXT NOT NULL,
            checkout TEXT NOT NULL,
            min_price REAL NOT NULL DEFAULT 0,
            max_price REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            hotels_json TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create search_history table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_search_history_user
         ON search_history (user_id, created_at DESC)",
    )
    .execute(pool)
    .await
    .context("Failed to create search_history index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Append a completed search with its hotel snapshot; returns the new row id.
pub async fn append_history(
    pool: &SqlitePool,
    user_id: i64,
    criteria: &SearchCriteria,
    hotels: &[HotelRecord],
) -> Result<i64> {
    let hotels_json =
        serde_json::to_string(hotels).context("Failed to serialize hotels snapshot")?;
    let checkin = criteria
        .check_in
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let checkout = criteria
        .check_out
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let result = sqlx::query(
        "INSERT INTO search_history
            (user_id, command, city, dest_id, search_type, checkin, checkout,
             min_price, max_price, created_at, hotels_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(user_id)
    .bind(criteria.command.as_str())
    .bind(&criteria.city)
    .bind(&criteria.dest_id)
    .bind(&criteria.search_type)
    .bind(checkin)
    .bind(checkout)
    .bind(criteria.min_price)
    .bind(criteria.max_price)
    .bind(Utc::now())
    .bind(hotels_json)
    .execute(pool)
    .await
    .context("Failed to insert history entry")?;

    let entry_id = result.last_insert_rowid();
    info!(user_id, entry_id, "History entry created");

    Ok(entry_id)
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        command: row.try_get("command")?,
        city: row.try_get("city")?,
        dest_id: row.try_get("dest_id")?,
        search_type: row.try_get("search_type")?,
        checkin: row.try_get("checkin")?,
        checkout: row.try_get("checkout")?,
        min_price: row.try_get("min_price")?,
        max_price: row.try_get("max_price")?,
        created_at: row.try_get("created_at")?,
        hotels_json: row.try_get("hotels_json")?,
    })
}

/// Most recent searches for one user, newest first, bounded to `limit`.
pub async fn list_recent(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        "SELECT id, user_id, command, city, dest_id, search_type, checkin, checkout,
                min_price, max_price, created_at, hotels_json
         FROM search_history
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list history entries")?;

    rows.iter().map(entry_from_row).collect()
}

/// Look up one history entry by id.
pub async fn get_by_id(pool: &SqlitePool, entry_id: i64) -> Result<Option<HistoryEntry>> {
    let row = sqlx::query(
        "SELECT id, user_id, command, city, dest_id, search_type, checkin, checkout,
                min_price, max_price, created_at, hotels_json
         FROM search_history
         WHERE id = ?1",
    )
    .bind(entry_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read history entry")?;

    row.as_ref().map(entry_from_row).transpose()
}
