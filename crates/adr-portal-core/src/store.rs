//! In-memory portal store: one keyed table per entity kind.
//!
//! Ids come from a per-table atomic counter starting at 1. They are unique and monotonic
//! under concurrent creators and are never reused, even after a delete.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::models::{
    AdrReport, CalendarEvent, ChatMessage, NewAdrReport, NewCalendarEvent, NewUser, User,
};

/// Keyed rows plus the id generator for one entity kind.
pub struct Table<T> {
    rows: DashMap<u64, T>,
    next_id: AtomicU64,
}

impl<T: Clone> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Reserve the next id, build the row with it, store and return a copy.
    pub fn insert_with(&self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    pub fn get(&self, id: u64) -> Option<T> {
        self.rows.get(&id).map(|r| r.value().clone())
    }

    /// All rows in insertion (id) order.
    pub fn all(&self) -> Vec<T> {
        let mut rows: Vec<(u64, T)> = self
            .rows
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    pub fn remove(&self, id: u64) -> bool {
        self.rows.remove(&id).is_some()
    }
}

impl<T: Clone> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns every portal record. Shared behind an `Arc`; no module-level singleton.
#[derive(Default)]
pub struct PortalStore {
    users: Table<User>,
    usernames: DashMap<String, u64>,
    adr_reports: Table<AdrReport>,
    chat_messages: Table<ChatMessage>,
    calendar_events: Table<CalendarEvent>,
}

impl PortalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername(user.username)),
            Entry::Vacant(slot) => {
                let created = self.users.insert_with(|id| User {
                    id,
                    username: user.username,
                    password: user.password,
                });
                slot.insert(created.id);
                Ok(created)
            }
        }
    }

    pub fn get_user(&self, id: u64) -> Option<User> {
        self.users.get(id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<User> {
        let id = *self.usernames.get(username)?;
        self.users.get(id)
    }

    pub fn create_adr_report(&self, report: NewAdrReport) -> AdrReport {
        let created_at = Utc::now();
        self.adr_reports.insert_with(|id| AdrReport {
            id,
            report,
            created_at,
        })
    }

    pub fn get_adr_report(&self, id: u64) -> Option<AdrReport> {
        self.adr_reports.get(id)
    }

    pub fn all_adr_reports(&self) -> Vec<AdrReport> {
        self.adr_reports.all()
    }

    pub fn create_chat_message(&self, message: &str, response: &str) -> ChatMessage {
        let created_at = Utc::now();
        self.chat_messages.insert_with(|id| ChatMessage {
            id,
            message: message.to_string(),
            response: response.to_string(),
            created_at,
        })
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.chat_messages.all()
    }

    pub fn create_calendar_event(&self, event: NewCalendarEvent) -> CalendarEvent {
        let created_at = Utc::now();
        self.calendar_events.insert_with(|id| CalendarEvent {
            id,
            event,
            created_at,
        })
    }

    pub fn get_calendar_event(&self, id: u64) -> Option<CalendarEvent> {
        self.calendar_events.get(id)
    }

    pub fn all_calendar_events(&self) -> Vec<CalendarEvent> {
        self.calendar_events.all()
    }

    /// Events due at or after `now`, soonest first (ties by id), at most `limit`.
    pub fn upcoming_calendar_events(&self, now: DateTime<Utc>, limit: usize) -> Vec<CalendarEvent> {
        let mut due: Vec<CalendarEvent> = self
            .calendar_events
            .all()
            .into_iter()
            .filter(|e| e.event.event_date >= now)
            .collect();
        due.sort_by(|a, b| {
            a.event
                .event_date
                .cmp(&b.event.event_date)
                .then(a.id.cmp(&b.id))
        });
        due.truncate(limit);
        due
    }

    pub fn delete_calendar_event(&self, id: u64) -> bool {
        self.calendar_events.remove(id)
    }
}
