//! Month layout engine.
//!
//! Turns a month and a set of events into a render plan: for every grid day
//! the (at most [`MAX_EVENTS_PER_DAY`]) events shown there with their row,
//! and for every week the horizontal segments that draw those events.
//!
//! Row assignment is seeded from the previous pass through a [`RowMemo`] so
//! an event keeps its row across re-renders (e.g. while it is being dragged)
//! as long as nothing with higher priority claims that row first.

use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::event::{Event, EventId};
use crate::month::{DAYS_PER_WEEK, MonthGrid};

/// Event rows available in a day cell.
pub const MAX_EVENTS_PER_DAY: usize = 2;

/// Last known row per event, carried from one layout pass to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMemo(HashMap<EventId, usize>);

impl RowMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &EventId) -> Option<usize> {
        self.0.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, id: EventId, row: usize) {
        self.0.insert(id, row);
    }
}

/// An event shown in a single day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub event_id: EventId,
    pub row: usize,
    /// Day is the event's first day (title is drawn here)
    pub is_start: bool,
    /// Day is the event's last day (delete/resize affordances live here)
    pub is_end: bool,
    pub is_middle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// False for the leading/trailing days of adjacent months
    pub in_month: bool,
    pub is_today: bool,
    /// Ordered by row
    pub entries: Vec<DayEntry>,
    /// Events covering this day that did not fit
    pub overflow: Vec<EventId>,
}

impl DayCell {
    pub fn entry_for(&self, id: &EventId) -> Option<&DayEntry> {
        self.entries.iter().find(|e| &e.event_id == id)
    }

    /// Number of events that did not fit.
    pub fn hidden(&self) -> usize {
        self.overflow.len()
    }

    /// Events logically covering this day, shown or not.
    pub fn occupancy(&self) -> usize {
        self.entries.len() + self.overflow.len()
    }

    /// Whether `id` covers this day, shown or hidden.
    pub fn covered_by(&self, id: &EventId) -> bool {
        self.entry_for(id).is_some() || self.overflow.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }
}

/// The part of an event drawn as one bar inside a week row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub event_id: EventId,
    pub week: usize,
    pub row: usize,
    /// 0-based column (Sunday = 0)
    pub column_start: usize,
    /// 1..=7, never crossing the week boundary
    pub column_span: usize,
    pub is_start: bool,
    pub is_end: bool,
    pub continues_before: bool,
    pub continues_after: bool,
}

impl Segment {
    pub fn column_end(&self) -> usize {
        self.column_start + self.column_span - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekLayout {
    pub index: usize,
    pub days: Vec<DayCell>,
    /// Ordered by row, then column
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthLayout {
    pub grid: MonthGrid,
    pub weeks: Vec<WeekLayout>,
    /// Rows used in this pass; feed back into the next [`layout_month`] call.
    pub rows: RowMemo,
}

impl MonthLayout {
    pub fn day(&self, date: NaiveDate) -> Option<&DayCell> {
        let (week, column) = self.grid.position_of(date)?;
        self.weeks.get(week).and_then(|w| w.days.get(column))
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flat_map(|w| w.days.iter())
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.weeks.iter().flat_map(|w| w.segments.iter())
    }

    pub fn occupancy(&self, date: NaiveDate) -> usize {
        self.day(date).map(DayCell::occupancy).unwrap_or(0)
    }

    /// Whether `id` covers `date`, even if overflow hides it there.
    pub fn occupies(&self, date: NaiveDate, id: &EventId) -> bool {
        self.day(date).is_some_and(|d| d.covered_by(id))
    }
}

/// Lay out `events` on the grid.
///
/// Per day, events that started earlier are placed before events starting
/// that day; within each group longer events go first, then earlier starts.
/// Each keeps its memoized row when free, otherwise takes the lowest free row.
pub fn layout_month(
    grid: &MonthGrid,
    events: &[Event],
    previous: &RowMemo,
    today: Option<NaiveDate>,
) -> MonthLayout {
    let by_id: HashMap<&EventId, &Event> = events.iter().map(|e| (&e.id, e)).collect();
    let mut memo = previous.clone();
    let mut rows = RowMemo::new();

    let mut weeks = Vec::with_capacity(grid.week_count());
    for week in 0..grid.week_count() {
        let days: Vec<DayCell> = grid
            .week_dates(week)
            .into_iter()
            .map(|date| {
                let cell = place_day(grid, date, events, &mut memo, today);
                for entry in &cell.entries {
                    rows.insert(entry.event_id.clone(), entry.row);
                }
                cell
            })
            .collect();

        let segments = week_segments(grid, week, &days, &by_id);
        weeks.push(WeekLayout {
            index: week,
            days,
            segments,
        });
    }

    MonthLayout {
        grid: *grid,
        weeks,
        rows,
    }
}

fn place_day(
    grid: &MonthGrid,
    date: NaiveDate,
    events: &[Event],
    memo: &mut RowMemo,
    today: Option<NaiveDate>,
) -> DayCell {
    let (mut continuing, mut fresh): (Vec<&Event>, Vec<&Event>) = events
        .iter()
        .filter(|e| e.covers(date))
        .partition(|e| e.start_date < date);

    let priority = |e: &&Event| (Reverse(e.duration_days()), e.start_date, e.id.clone());
    continuing.sort_by_key(priority);
    fresh.sort_by_key(priority);

    let mut used = [false; MAX_EVENTS_PER_DAY];
    let mut entries = Vec::with_capacity(MAX_EVENTS_PER_DAY);
    let mut overflow = Vec::new();

    for event in continuing.into_iter().chain(fresh) {
        let row = match memo.get(&event.id) {
            Some(row) if row < MAX_EVENTS_PER_DAY && !used[row] => Some(row),
            _ => used.iter().position(|taken| !taken),
        };
        let Some(row) = row else {
            overflow.push(event.id.clone());
            continue;
        };

        used[row] = true;
        memo.insert(event.id.clone(), row);

        let is_start = event.start_date == date;
        let is_end = event.end_date == date;
        entries.push(DayEntry {
            event_id: event.id.clone(),
            row,
            is_start,
            is_end,
            is_middle: !is_start && !is_end,
        });
    }

    entries.sort_by_key(|e| e.row);

    DayCell {
        date,
        in_month: grid.is_in_month(date),
        is_today: today == Some(date),
        entries,
        overflow,
    }
}

/// Columns an event can span from `column` without leaving the week:
/// `min(days_until_week_end + 1, days_until_event_end + 1)`.
pub fn span_within_week(column: usize, date: NaiveDate, event_end: NaiveDate) -> usize {
    let days_until_week_end = DAYS_PER_WEEK - 1 - column;
    let days_until_event_end = (event_end - date).num_days().max(0) as usize;
    days_until_week_end.min(days_until_event_end) + 1
}

fn week_segments(
    grid: &MonthGrid,
    week: usize,
    days: &[DayCell],
    by_id: &HashMap<&EventId, &Event>,
) -> Vec<Segment> {
    let mut segments = Vec::new();

    for (column, day) in days.iter().enumerate() {
        for entry in &day.entries {
            // Only open a segment where the previous column doesn't continue it
            let continued = column > 0
                && days[column - 1]
                    .entry_for(&entry.event_id)
                    .is_some_and(|prev| prev.row == entry.row);
            if continued {
                continue;
            }
            let Some(event) = by_id.get(&entry.event_id) else {
                continue;
            };

            let max_span = span_within_week(column, day.date, event.end_date);
            let span = (column..column + max_span)
                .take_while(|&c| {
                    days[c]
                        .entry_for(&entry.event_id)
                        .is_some_and(|e| e.row == entry.row)
                })
                .count();

            let last = grid.date_at(week, column + span - 1);
            let is_start = event.start_date == day.date;
            let is_end = event.end_date == last;
            segments.push(Segment {
                event_id: entry.event_id.clone(),
                week,
                row: entry.row,
                column_start: column,
                column_span: span,
                is_start,
                is_end,
                continues_before: !is_start,
                continues_after: !is_end,
            });
        }
    }

    segments.sort_by_key(|s| (s.row, s.column_start));
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june() -> MonthGrid {
        MonthGrid::new(Month::new(2024, 6).unwrap())
    }

    fn event(id: &str, start: NaiveDate, end: NaiveDate) -> Event {
        Event::new(id, start, end, None).with_id(id)
    }

    #[test]
    fn test_layout_has_one_week_per_grid_row() {
        let layout = layout_month(&june(), &[], &RowMemo::new(), None);
        assert_eq!(layout.weeks.len(), 6);
        assert!(layout.weeks.iter().all(|w| w.days.len() == DAYS_PER_WEEK));
        assert!(layout.segments().next().is_none());
    }

    #[test]
    fn test_single_day_event_is_start_and_end() {
        let events = [event("a", date(2024, 6, 12), date(2024, 6, 12))];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        let entry = &layout.day(date(2024, 6, 12)).unwrap().entries[0];
        assert!(entry.is_start && entry.is_end && !entry.is_middle);
        assert_eq!(entry.row, 0);

        let segments: Vec<_> = layout.segments().collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].column_start, 3);
        assert_eq!(segments[0].column_span, 1);
    }

    #[test]
    fn test_multi_week_event_splits_at_week_boundary() {
        // Thu 6th .. Tue 11th
        let events = [event("a", date(2024, 6, 6), date(2024, 6, 11))];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        let segments: Vec<_> = layout.segments().collect();
        assert_eq!(segments.len(), 2);

        let first = segments[0];
        assert_eq!((first.week, first.column_start, first.column_span), (1, 4, 3));
        assert!(first.is_start && !first.is_end && first.continues_after);

        let second = segments[1];
        assert_eq!((second.week, second.column_start, second.column_span), (2, 0, 3));
        assert!(!second.is_start && second.is_end && second.continues_before);

        let middle = layout.day(date(2024, 6, 9)).unwrap().entry_for(&"a".into()).unwrap();
        assert!(middle.is_middle);
    }

    #[test]
    fn test_span_matches_week_formula() {
        assert_eq!(span_within_week(4, date(2024, 6, 6), date(2024, 6, 11)), 3);
        assert_eq!(span_within_week(0, date(2024, 6, 9), date(2024, 6, 11)), 3);
        assert_eq!(span_within_week(6, date(2024, 6, 8), date(2024, 6, 30)), 1);
    }

    #[test]
    fn test_at_most_two_events_per_day() {
        let day = date(2024, 6, 12);
        let events = [
            event("a", day, day),
            event("b", day, day),
            event("c", day, day),
            event("d", day, day),
        ];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        let cell = layout.day(day).unwrap();
        assert_eq!(cell.entries.len(), MAX_EVENTS_PER_DAY);
        assert_eq!(cell.hidden(), 2);
        assert_eq!(cell.occupancy(), 4);
        assert!(layout.days().all(|d| d.entries.len() <= MAX_EVENTS_PER_DAY));
    }

    #[test]
    fn test_longer_events_claim_rows_first() {
        let day = date(2024, 6, 12);
        let events = [
            event("short", day, day),
            event("long", day, date(2024, 6, 14)),
            event("mid", day, date(2024, 6, 13)),
        ];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        let cell = layout.day(day).unwrap();
        let ids: Vec<_> = cell.entries.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, ["long", "mid"]);
        assert_eq!(cell.hidden(), 1);
    }

    #[test]
    fn test_continuing_events_keep_their_row() {
        // "a" starts Monday on row 0; "b" joins Tuesday and must take row 1
        let events = [
            event("a", date(2024, 6, 10), date(2024, 6, 13)),
            event("b", date(2024, 6, 11), date(2024, 6, 20)),
        ];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        for d in 10..=13 {
            let cell = layout.day(date(2024, 6, d)).unwrap();
            assert_eq!(cell.entry_for(&"a".into()).unwrap().row, 0, "day {d}");
        }
        assert_eq!(layout.day(date(2024, 6, 11)).unwrap().entry_for(&"b".into()).unwrap().row, 1);
        // Once "a" ends "b" stays on row 1 rather than jumping up
        assert_eq!(layout.day(date(2024, 6, 14)).unwrap().entry_for(&"b".into()).unwrap().row, 1);
    }

    #[test]
    fn test_row_memo_seeds_next_pass() {
        let day = date(2024, 6, 12);
        let events = [event("a", day, day)];
        let mut previous = RowMemo::new();
        previous.insert("a".into(), 1);

        let layout = layout_month(&june(), &events, &previous, None);
        assert_eq!(layout.day(day).unwrap().entries[0].row, 1);
        assert_eq!(layout.rows.get(&"a".into()), Some(1));
    }

    #[test]
    fn test_displaced_event_gets_shorter_segment() {
        // "c" is hidden on the 10th, then as the longest continuing event it
        // claims row 0 on the 11th and pushes "b" down to row 1
        let events = [
            event("a", date(2024, 6, 9), date(2024, 6, 10)),
            event("b", date(2024, 6, 9), date(2024, 6, 11)),
            event("c", date(2024, 6, 10), date(2024, 6, 15)),
        ];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        let tenth = layout.day(date(2024, 6, 10)).unwrap();
        let ids: Vec<_> = tenth.entries.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(tenth.hidden(), 1);
        assert!(layout.occupies(date(2024, 6, 10), &"c".into()));

        let eleventh = layout.day(date(2024, 6, 11)).unwrap();
        assert_eq!(eleventh.entry_for(&"c".into()).unwrap().row, 0);
        assert_eq!(eleventh.entry_for(&"b".into()).unwrap().row, 1);

        let b: Vec<_> = layout.segments().filter(|s| s.event_id.as_str() == "b").collect();
        assert_eq!(b.len(), 2);
        assert_eq!((b[0].row, b[0].column_start, b[0].column_span), (0, 0, 2));
        assert!(b[0].is_start && !b[0].is_end);
        assert_eq!((b[1].row, b[1].column_start, b[1].column_span), (1, 2, 1));
        assert!(b[1].is_end);

        let c: Vec<_> = layout.segments().filter(|s| s.event_id.as_str() == "c").collect();
        assert_eq!(c.len(), 1);
        assert_eq!((c[0].column_start, c[0].column_span), (2, 5));
        assert!(c[0].continues_before && c[0].is_end);
    }

    #[test]
    fn test_adjacent_month_days_host_events() {
        let events = [event("spill", date(2024, 5, 30), date(2024, 6, 2))];
        let layout = layout_month(&june(), &events, &RowMemo::new(), None);

        let may_30 = layout.day(date(2024, 5, 30)).unwrap();
        assert!(!may_30.in_month);
        assert_eq!(may_30.entries.len(), 1);
        assert!(layout.occupies(date(2024, 6, 2), &"spill".into()));
    }

    #[test]
    fn test_today_flag() {
        let layout = layout_month(&june(), &[], &RowMemo::new(), Some(date(2024, 6, 18)));
        assert!(layout.day(date(2024, 6, 18)).unwrap().is_today);
        assert_eq!(layout.days().filter(|d| d.is_today).count(), 1);
    }
}
