//! # Session Module
//!
//! Per-chat result state that outlives the search dialogue: the ordered
//! hotel list produced by a completed search (or a history replay) and the
//! cursor used to page through it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::hotels::HotelRecord;

/// An ordered hotel list with a clamped cursor.
///
/// The cursor always satisfies `cursor < items.len()` while the list is
/// non-empty; `prev`/`next` saturate at the ends instead of wrapping or
/// going out of bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    items: Vec<HotelRecord>,
    cursor: usize,
}

impl ResultSet {
    /// Wrap a freshly filtered list with the cursor at the first item.
    pub fn new(items: Vec<HotelRecord>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[HotelRecord] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor.min(self.items.len().saturating_sub(1))
    }

    pub fn current(&self) -> Option<&HotelRecord> {
        self.items.get(self.cursor())
    }

    /// Step back one item, flooring at the first.
    pub fn prev(&mut self) {
        self.cursor = self.cursor().saturating_sub(1);
    }

    /// Step forward one item, capping at the last.
    pub fn next(&mut self) {
        if self.cursor() + 1 < self.items.len() {
            self.cursor = self.cursor() + 1;
        }
    }

    pub fn has_prev(&self) -> bool {
        self.cursor() > 0
    }

    pub fn has_next(&self) -> bool {
        !self.is_empty() && self.cursor() < self.items.len() - 1
    }
}

/// A snapshot of the cursored item handed to the renderer.
#[derive(Debug, Clone)]
pub struct CurrentHotel {
    pub hotel: HotelRecord,
    pub index: usize,
    pub total: usize,
}

/// Thread-safe store of per-chat result sets.
///
/// Keyed by chat id so state never leaks across users. Updates for one chat
/// arrive sequentially in practice, but every access still goes through the
/// mutex so concurrent tasks stay safe.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<i64, ResultSet>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chat's result set wholesale (fresh search or replay).
    pub fn set_results(&self, chat_id: i64, results: ResultSet) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(chat_id, results);
    }

    /// Drop the chat's result set (dialogue start or cancel).
    pub fn reset(&self, chat_id: i64) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(&chat_id);
    }

    pub fn current(&self, chat_id: i64) -> Option<CurrentHotel> {
        let sessions = self.sessions.lock().unwrap();
        snapshot(sessions.get(&chat_id)?)
    }

    pub fn step_prev(&self, chat_id: i64) -> Option<CurrentHotel> {
        let mut sessions = self.sessions.lock().unwrap();
        let results = sessions.get_mut(&chat_id)?;
        results.prev();
        snapshot(results)
    }

    pub fn step_next(&self, chat_id: i64) -> Option<CurrentHotel> {
        let mut sessions = self.sessions.lock().unwrap();
        let results = sessions.get_mut(&chat_id)?;
        results.next();
        snapshot(results)
    }
}

fn snapshot(results: &ResultSet) -> Option<CurrentHotel> {
    Some(CurrentHotel {
        hotel: results.current()?.clone(),
        index: results.cursor(),
        total: results.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotels::{GrossPrice, PriceBreakdown, Property};

    fn hotel(id: i64) -> HotelRecord {
        HotelRecord {
            hotel_id: Some(id),
            accessibility_label: None,
            property: Some(Property {
                name: Some(format!("Hotel {id}")),
                price_breakdown: Some(PriceBreakdown {
                    gross_price: Some(GrossPrice {
                        value: Some(100.0),
                        currency: Some("USD".to_string()),
                    }),
                }),
                ..Default::default()
            }),
        }
    }

    fn three_hotels() -> Vec<HotelRecord> {
        vec![hotel(1), hotel(2), hotel(3)]
    }

    #[test]
    fn test_cursor_clamps_at_both_ends() {
        let mut results = ResultSet::new(three_hotels());
        assert_eq!(results.cursor(), 0);

        // prev at the start is a no-op
        results.prev();
        assert_eq!(results.cursor(), 0);

        // three nexts land on the last item and stay there
        results.next();
        results.next();
        results.next();
        assert_eq!(results.cursor(), 2);
        assert_eq!(results.current().unwrap().hotel_id, Some(3));
    }

    #[test]
    fn test_navigation_affordances() {
        let mut results = ResultSet::new(three_hotels());
        assert!(!results.has_prev());
        assert!(results.has_next());

        results.next();
        assert!(results.has_prev());
        assert!(results.has_next());

        results.next();
        assert!(results.has_prev());
        assert!(!results.has_next());
    }

    #[test]
    fn test_empty_result_set() {
        let mut results = ResultSet::new(Vec::new());
        assert!(results.current().is_none());
        assert!(!results.has_prev());
        assert!(!results.has_next());
        results.next();
        results.prev();
        assert!(results.current().is_none());
    }

    #[test]
    fn test_store_keys_do_not_leak_across_chats() {
        let store = SessionStore::new();
        store.set_results(1, ResultSet::new(three_hotels()));

        assert!(store.current(2).is_none());
        assert!(store.step_next(2).is_none());

        let one = store.current(1).unwrap();
        assert_eq!(one.index, 0);
        assert_eq!(one.total, 3);
    }

    #[test]
    fn test_store_step_and_reset() {
        let store = SessionStore::new();
        store.set_results(7, ResultSet::new(three_hotels()));

        let stepped = store.step_next(7).unwrap();
        assert_eq!(stepped.index, 1);
        assert_eq!(stepped.hotel.hotel_id, Some(2));

        let back = store.step_prev(7).unwrap();
        assert_eq!(back.index, 0);

        store.reset(7);
        assert!(store.current(7).is_none());
    }

    #[test]
    fn test_replay_replaces_results_wholesale() {
        let store = SessionStore::new();
        store.set_results(9, ResultSet::new(three_hotels()));
        store.step_next(9);

        // A replay installs a fresh set with the cursor back at 0.
        store.set_results(9, ResultSet::new(vec![hotel(42)]));
        let current = store.current(9).unwrap();
        assert_eq!(current.index, 0);
        assert_eq!(current.total, 1);
        assert_eq!(current.hotel.hotel_id, Some(42));
    }
}
