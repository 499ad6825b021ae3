//! # Hotel Search Telegram Bot
//!
//! A Telegram bot that guides users through a multi-step hotel search
//! dialogue, queries a third-party hotel-data provider, pages through the
//! filtered results and replays past searches from a stored history.

pub mod booking_api;
pub mod bot;
pub mod calendar;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod hotels;
pub mod session;
