//! Calendar event types.
//!
//! Events are all-day and date-ranged: time of day never enters the model,
//! so every comparison happens on plain calendar dates.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CalShotError, CalShotResult};

/// Label shown (and stored) for events created without a title.
pub const UNTITLED: &str = "(No title)";

/// Opaque event identifier, stable for the event's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    pub fn new() -> Self {
        EventId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `#RRGGBB`; resolved from the background palette when absent
    pub color: Option<String>,
}

impl Event {
    /// Create an event with a fresh id. Blank titles are stored as [`UNTITLED`].
    pub fn new(
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        color: Option<String>,
    ) -> Self {
        Event {
            id: EventId::new(),
            title: normalize_title(title.into()),
            start_date,
            end_date,
            color,
        }
    }

    /// Single-day event on `date`.
    pub fn on(title: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(title, date, date, None)
    }

    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = id.into();
        self
    }

    /// Number of days between start and end (0 for single-day events).
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Shift both dates by `days`.
    pub(crate) fn shift(&mut self, days: i64) {
        self.start_date += Duration::days(days);
        self.end_date += Duration::days(days);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_title())
    }
}

/// Partial update for [`Event`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `Some(None)` clears the color
    pub color: Option<Option<String>>,
}

impl EventPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn color(mut self, color: Option<String>) -> Self {
        self.color = Some(color);
        self
    }

    pub(crate) fn apply(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = normalize_title(title);
        }
        if let Some(start) = self.start_date {
            event.start_date = start;
        }
        if let Some(end) = self.end_date {
            event.end_date = end;
        }
        if let Some(color) = self.color {
            event.color = color;
        }
    }
}

/// Drop the time of day from a timestamp.
pub fn start_of_day(dt: NaiveDateTime) -> NaiveDate {
    dt.date()
}

/// Parse `YYYY-MM-DD`, or a `YYYY-MM-DDTHH:MM` timestamp truncated to its date.
pub fn parse_date(s: &str) -> CalShotResult<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").map(start_of_day))
        .map_err(|_| CalShotError::InvalidDate(s.to_string(), "YYYY-MM-DD"))
}

fn normalize_title(title: String) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}
