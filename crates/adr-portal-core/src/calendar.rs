//! Reporting calendar: the store's calendar table plus default deadline seeding.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::config::SeedConfig;
use crate::models::{CalendarEvent, EventType, NewCalendarEvent};
use crate::store::PortalStore;

/// Midnight UTC on `day` of `month0` (0-based, may run past 11 into following years).
fn midnight(year: i32, month0: i32, day: u32) -> Option<DateTime<Utc>> {
    let total = year * 12 + month0;
    let y = total.div_euclid(12);
    let m = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(y, m, day)?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// The three recurring deadlines relative to `now`.
pub fn seed_deadlines(now: DateTime<Utc>, seed: &SeedConfig) -> Vec<NewCalendarEvent> {
    let year = now.year();
    let month0 = now.month0() as i32;
    let mut events = Vec::with_capacity(3);

    let next_quarter = (month0 / 3) * 3 + 3;
    let quarterly = midnight(year, next_quarter, seed.quarterly_day).and_then(|due| {
        if due < now {
            midnight(year, next_quarter + 3, seed.quarterly_day)
        } else {
            Some(due)
        }
    });
    if let Some(event_date) = quarterly {
        events.push(NewCalendarEvent {
            title: "Quarterly ADR Reports Due".to_string(),
            event_date,
            event_type: EventType::Accent,
            description: Some(
                "Submit quarterly adverse drug reaction reports to the regulatory authority."
                    .to_string(),
            ),
        });
    }

    if let Some(event_date) = midnight(year, month0 + 1, seed.psur_day) {
        events.push(NewCalendarEvent {
            title: "PSUR Submission Deadline".to_string(),
            event_date,
            event_type: EventType::Muted,
            description: Some(
                "Submit Periodic Safety Update Reports for all registered products.".to_string(),
            ),
        });
    }

    let webinar = midnight(year, month0, seed.webinar_day).and_then(|at| {
        if at < now {
            midnight(year, month0 + 1, seed.webinar_day)
        } else {
            Some(at)
        }
    });
    if let Some(event_date) = webinar {
        events.push(NewCalendarEvent {
            title: "PvPI Training Webinar".to_string(),
            event_date,
            event_type: EventType::Secondary,
            description: Some(
                "Mandatory training webinar on latest pharmacovigilance practices.".to_string(),
            ),
        });
    }

    events
}

pub struct DeadlineCalendar {
    store: Arc<PortalStore>,
    seed: SeedConfig,
}

impl DeadlineCalendar {
    pub fn new(store: Arc<PortalStore>, seed: SeedConfig) -> Self {
        Self { store, seed }
    }

    /// Insert the default deadlines. No-op when seeding is disabled.
    pub fn seed(&self, now: DateTime<Utc>) -> Vec<CalendarEvent> {
        if !self.seed.enabled {
            tracing::info!("[calendar] default deadline seeding disabled");
            return Vec::new();
        }
        let created: Vec<CalendarEvent> = seed_deadlines(now, &self.seed)
            .into_iter()
            .map(|e| self.store.create_calendar_event(e))
            .collect();
        for e in &created {
            tracing::info!(
                "[calendar] seeded '{}' on {}",
                e.event.title,
                e.event.event_date.format("%Y-%m-%d")
            );
        }
        created
    }

    pub fn create(&self, event: NewCalendarEvent) -> CalendarEvent {
        let created = self.store.create_calendar_event(event);
        tracing::info!(
            id = created.id,
            event_type = created.event.event_type.as_str(),
            "[calendar] event created"
        );
        created
    }

    pub fn get(&self, id: u64) -> Option<CalendarEvent> {
        self.store.get_calendar_event(id)
    }

    pub fn all(&self) -> Vec<CalendarEvent> {
        self.store.all_calendar_events()
    }

    pub fn upcoming(&self, now: DateTime<Utc>, limit: usize) -> Vec<CalendarEvent> {
        self.store.upcoming_calendar_events(now, limit)
    }

    pub fn delete(&self, id: u64) -> bool {
        let deleted = self.store.delete_calendar_event(id);
        if deleted {
            tracing::info!(id, "[calendar] event deleted");
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn dates(events: &[NewCalendarEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| e.event_date.format("%Y-%m-%d").to_string())
            .collect()
    }

    #[test]
    fn seeds_mid_october() {
        let events = seed_deadlines(at("2026-10-16T10:00:00Z"), &SeedConfig::default());
        assert_eq!(dates(&events), vec!["2027-01-15", "2026-11-10", "2026-10-25"]);
        assert_eq!(events[0].event_type, EventType::Accent);
        assert_eq!(events[1].event_type, EventType::Muted);
        assert_eq!(events[2].event_type, EventType::Secondary);
    }

    #[test]
    fn webinar_rolls_to_next_month_once_passed() {
        let events = seed_deadlines(at("2026-03-27T08:00:00Z"), &SeedConfig::default());
        assert_eq!(dates(&events), vec!["2026-04-15", "2026-04-10", "2026-04-25"]);
    }

    #[test]
    fn webinar_day_itself_counts_as_passed_after_midnight() {
        let events = seed_deadlines(at("2026-05-25T00:00:01Z"), &SeedConfig::default());
        assert_eq!(events[2].event_date.format("%Y-%m-%d").to_string(), "2026-06-25");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let events = seed_deadlines(at("2026-12-20T00:00:00Z"), &SeedConfig::default());
        assert_eq!(dates(&events), vec!["2027-01-15", "2027-01-10", "2026-12-25"]);
    }

    #[test]
    fn seed_days_are_configurable() {
        let seed = SeedConfig {
            enabled: true,
            quarterly_day: 1,
            psur_day: 28,
            webinar_day: 5,
        };
        let events = seed_deadlines(at("2026-02-10T00:00:00Z"), &seed);
        assert_eq!(dates(&events), vec!["2026-04-01", "2026-03-28", "2026-03-05"]);
    }

    #[test]
    fn seeded_events_are_upcoming() {
        let store = Arc::new(PortalStore::new());
        let calendar = DeadlineCalendar::new(Arc::clone(&store), SeedConfig::default());
        let now = Utc::now();
        assert_eq!(calendar.seed(now).len(), 3);
        let upcoming = calendar.upcoming(now, 10);
        assert_eq!(upcoming.len(), 3);
        assert!(upcoming.windows(2).all(|w| w[0].event.event_date <= w[1].event.event_date));
    }

    #[test]
    fn disabled_seeding_leaves_calendar_empty() {
        let store = Arc::new(PortalStore::new());
        let seed = SeedConfig { enabled: false, ..SeedConfig::default() };
        let calendar = DeadlineCalendar::new(Arc::clone(&store), seed);
        assert!(calendar.seed(Utc::now()).is_empty());
        assert!(calendar.all().is_empty());
    }
}
