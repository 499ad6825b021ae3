//! Startup configuration loaded from the environment (optionally via a
//! `.env` file).

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub rapidapi_key: String,
    pub database_url: String,
}

impl Config {
    /// Read configuration from the environment. `BOT_TOKEN` and
    /// `RAPIDAPI_KEY` are required; `DATABASE_URL` falls back to a local
    /// sqlite file.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN is missing. Put it in .env")?;
        let rapidapi_key =
            env::var("RAPIDAPI_KEY").context("RAPIDAPI_KEY is missing. Put it in .env")?;
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:hotels.db".to_string());

        Ok(Self {
            bot_token,
            rapidapi_key,
            database_url,
        })
    }
}
