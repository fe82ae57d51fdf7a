//! Month selection and the fixed 7-column month grid.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CalShotError, CalShotResult};

pub const DAYS_PER_WEEK: usize = 7;
/// Grids never shrink below five week rows.
pub const MIN_WEEKS: usize = 5;
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Month {
    first: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> CalShotResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Month { first })
            .ok_or_else(|| CalShotError::InvalidDate(format!("{year}-{month:02}"), "YYYY-MM"))
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Month {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> CalShotResult<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(|first| Month { first })
            .map_err(|_| CalShotError::InvalidDate(s.to_string(), "YYYY-MM"))
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first - Duration::days(1)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn prev(&self) -> Self {
        Month {
            first: self.first - Months::new(1),
        }
    }

    pub fn next(&self) -> Self {
        Month {
            first: self.first + Months::new(1),
        }
    }

    /// "June 2024"
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// "2024-06", used in export file names
    pub fn slug(&self) -> String {
        self.first.format("%Y-%m").to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// The visible grid for a month: starts on the Sunday on or before the 1st
/// and holds 5 or 6 full weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    month: Month,
    first_day: NaiveDate,
    weeks: usize,
}

impl MonthGrid {
    pub fn new(month: Month) -> Self {
        let offset = month.first_day().weekday().num_days_from_sunday() as usize;
        let first_day = month.first_day() - Duration::days(offset as i64);
        MonthGrid {
            month,
            first_day,
            weeks: week_count(offset, month.days_in_month() as usize),
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Duration::days((self.cell_count() - 1) as i64)
    }

    /// Weekday index (Sunday = 0) of the 1st of the month.
    pub fn start_offset(&self) -> usize {
        self.month.first_day().weekday().num_days_from_sunday() as usize
    }

    pub fn week_count(&self) -> usize {
        self.weeks
    }

    pub fn cell_count(&self) -> usize {
        self.weeks * DAYS_PER_WEEK
    }

    pub fn date_at(&self, week: usize, column: usize) -> NaiveDate {
        self.first_day + Duration::days((week * DAYS_PER_WEEK + column) as i64)
    }

    /// `(week, column)` of `date`, if it is on the grid.
    pub fn position_of(&self, date: NaiveDate) -> Option<(usize, usize)> {
        if !self.contains(date) {
            return None;
        }
        let index = (date - self.first_day).num_days() as usize;
        Some((index / DAYS_PER_WEEK, index % DAYS_PER_WEEK))
    }

    /// Whether `date` is one of the grid's cells (adjacent-month days included).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day()
    }

    pub fn is_in_month(&self, date: NaiveDate) -> bool {
        self.month.contains(date)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.cell_count()).map(|i| self.first_day + Duration::days(i as i64))
    }

    pub fn week_dates(&self, week: usize) -> [NaiveDate; DAYS_PER_WEEK] {
        std::array::from_fn(|column| self.date_at(week, column))
    }
}

/// Week rows needed for a month: `ceil((offset + days) / 7)`, never fewer
/// than [`MIN_WEEKS`].
pub fn week_count(start_offset: usize, days_in_month: usize) -> usize {
    (start_offset + days_in_month).div_ceil(DAYS_PER_WEEK).max(MIN_WEEKS)
}
