//! Integration tests for the search history store.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use hotelscout::db;
use hotelscout::dialogue::{SearchCommand, SearchCriteria};
use hotelscout::hotels::{GrossPrice, HotelRecord, PriceBreakdown, Property};

async fn setup_test_db() -> Result<SqlitePool> {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    db::init_database_schema(&pool).await?;
    Ok(pool)
}

fn paris_criteria(command: SearchCommand) -> SearchCriteria {
    let mut criteria = SearchCriteria::new(command);
    criteria.city = "Paris".to_string();
    criteria.dest_id = "-1456928".to_string();
    criteria.search_type = "city".to_string();
    criteria.check_in = NaiveDate::from_ymd_opt(2026, 9, 1);
    criteria.check_out = NaiveDate::from_ymd_opt(2026, 9, 4);
    criteria.min_price = 50.0;
    criteria.max_price = 300.0;
    criteria
}

fn hotel(id: i64, price: f64) -> HotelRecord {
    HotelRecord {
        hotel_id: Some(id),
        accessibility_label: Some(format!("8.{id} Great {id} reviews")),
        property: Some(Property {
            name: Some(format!("Hotel {id}")),
            price_breakdown: Some(PriceBreakdown {
                gross_price: Some(GrossPrice {
                    value: Some(price),
                    currency: Some("USD".to_string()),
                }),
            }),
            ..Default::default()
        }),
    }
}

#[tokio::test]
async fn test_append_and_read_back() -> Result<()> {
    let pool = setup_test_db().await?;
    let criteria = paris_criteria(SearchCommand::LowPrice);
    let hotels = vec![hotel(1, 120.0), hotel(2, 90.0)];

    let entry_id = db::append_history(&pool, 42, &criteria, &hotels).await?;
    let entry = db::get_by_id(&pool, entry_id).await?.expect("entry exists");

    assert_eq!(entry.user_id, 42);
    assert_eq!(entry.command, "lowprice");
    assert_eq!(entry.city, "Paris");
    assert_eq!(entry.dest_id, "-1456928");
    assert_eq!(entry.checkin, "2026-09-01");
    assert_eq!(entry.checkout, "2026-09-04");
    assert_eq!(entry.min_price, 50.0);
    assert_eq!(entry.max_price, 300.0);

    // The snapshot replays byte-for-byte into the same records.
    assert_eq!(entry.hotels()?, hotels);

    Ok(())
}

#[tokio::test]
async fn test_list_recent_orders_newest_first_and_limits() -> Result<()> {
    let pool = setup_test_db().await?;
    let criteria = paris_criteria(SearchCommand::GuestRating);

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(db::append_history(&pool, 7, &criteria, &[hotel(1, 100.0)]).await?);
    }

    let recent = db::list_recent(&pool, 7, 3).await?;
    assert_eq!(recent.len(), 3);

    // Inserts in the same instant fall back to id DESC, so the newest row
    // comes first either way.
    let listed: Vec<i64> = recent.iter().map(|e| e.id).collect();
    assert_eq!(listed, vec![ids[3], ids[2], ids[1]]);

    Ok(())
}

#[tokio::test]
async fn test_history_is_isolated_per_user() -> Result<()> {
    let pool = setup_test_db().await?;
    let criteria = paris_criteria(SearchCommand::BestDeal);

    db::append_history(&pool, 1, &criteria, &[hotel(1, 100.0)]).await?;
    db::append_history(&pool, 2, &criteria, &[hotel(2, 100.0)]).await?;

    let user_one = db::list_recent(&pool, 1, 10).await?;
    assert_eq!(user_one.len(), 1);
    assert_eq!(user_one[0].user_id, 1);

    let nobody = db::list_recent(&pool, 3, 10).await?;
    assert!(nobody.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_by_id_miss_returns_none() -> Result<()> {
    let pool = setup_test_db().await?;
    assert!(db::get_by_id(&pool, 9999).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_entry_label_format() -> Result<()> {
    let pool = setup_test_db().await?;
    let criteria = paris_criteria(SearchCommand::LowPrice);

    let entry_id = db::append_history(&pool, 5, &criteria, &[hotel(1, 100.0)]).await?;
    let entry = db::get_by_id(&pool, entry_id).await?.expect("entry exists");

    let label = entry.label();
    assert!(label.contains("lowprice"));
    assert!(label.ends_with("Paris"));

    Ok(())
}
