//! TUI rendering traits for calshot types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to calshot-core types using owo_colors.

use calshot_core::color::parse_hex;
use calshot_core::layout::{MAX_EVENTS_PER_DAY, Segment, WeekLayout};
use calshot_core::month::{DAYS_PER_WEEK, WEEKDAY_LABELS};
use calshot_core::{Background, CalendarSettings, Event, MonthLayout};
use chrono::Datelike;
use owo_colors::OwoColorize;

/// Width of one day column, separator included
const CELL: usize = 11;

const FALLBACK_RGB: [u8; 3] = [107, 114, 128];

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Event {
    fn render(&self) -> String {
        let swatch = match self.color.as_deref().map(parse_hex) {
            Some(Ok([r, g, b])) => "■".truecolor(r, g, b).to_string(),
            _ => "■".dimmed().to_string(),
        };
        let dates = if self.is_single_day() {
            self.start_date.format("%b %-d").to_string()
        } else {
            format!("{} to {}", self.start_date.format("%b %-d"), self.end_date.format("%b %-d"))
        };
        format!("{} {} {}", swatch, self, dates.dimmed())
    }
}

impl Render for Background {
    fn render(&self) -> String {
        match self.swatch().map(|(color, _)| parse_hex(color)) {
            Some(Ok([r, g, b])) => format!("{} {}", "■".truecolor(r, g, b), self.id()),
            _ => format!("{} {}", "□".dimmed(), self.id()),
        }
    }
}

/// Terminal month grid: day numbers, two event rows per week, overflow counts.
pub trait MonthRender {
    fn render(&self, events: &[Event], settings: &CalendarSettings) -> String;
}

impl MonthRender for MonthLayout {
    fn render(&self, events: &[Event], settings: &CalendarSettings) -> String {
        let width = CELL * DAYS_PER_WEEK;
        let mut lines = Vec::new();

        let title = self.grid.month().label().to_uppercase();
        lines.push(format!("{:^width$}", title).bold().to_string());
        lines.push(
            WEEKDAY_LABELS
                .iter()
                .map(|label| format!("{:<width$}", label, width = CELL))
                .collect::<String>()
                .dimmed()
                .to_string(),
        );

        for week in &self.weeks {
            lines.push(day_numbers(week, settings.show_today));
            for row in 0..MAX_EVENTS_PER_DAY {
                lines.push(event_row(week, row, events, settings));
            }
            if week.days.iter().any(|d| d.hidden() > 0) {
                lines.push(overflow_row(week));
            }
        }

        lines.join("\n")
    }
}

fn day_numbers(week: &WeekLayout, show_today: bool) -> String {
    week.days
        .iter()
        .map(|day| {
            if !day.in_month {
                return " ".repeat(CELL);
            }
            let number = format!("{:>2}", day.date.day());
            let pad = " ".repeat(CELL - number.len());
            if day.is_today && show_today {
                format!("{}{}", number.reversed(), pad)
            } else {
                format!("{}{}", number, pad)
            }
        })
        .collect()
}

fn event_row(week: &WeekLayout, row: usize, events: &[Event], settings: &CalendarSettings) -> String {
    let text_rgb = parse_hex(&settings.palette().text_color).unwrap_or([255, 255, 255]);
    let mut out = String::new();
    let mut column = 0;

    while column < DAYS_PER_WEEK {
        let Some(segment) = week
            .segments
            .iter()
            .find(|s| s.row == row && s.column_start == column)
        else {
            out.push_str(&" ".repeat(CELL));
            column += 1;
            continue;
        };

        let event = events.iter().find(|e| e.id == segment.event_id);
        let [r, g, b] = event
            .and_then(|e| parse_hex(&settings.resolve_event_color(e)).ok())
            .unwrap_or(FALLBACK_RGB);
        let label = bar_label(segment, event.map(|e| e.display_title()).unwrap_or_default());

        let [tr, tg, tb] = text_rgb;
        out.push_str(&label.truecolor(tr, tg, tb).on_truecolor(r, g, b).to_string());
        out.push(' ');
        column += segment.column_span;
    }

    out
}

/// Plain bar text, exactly one character short of the segment's columns.
fn bar_label(segment: &Segment, title: &str) -> String {
    let width = segment.column_span * CELL - 1;
    let left = if segment.continues_before { '<' } else { ' ' };
    let right = if segment.continues_after { '>' } else { ' ' };
    let body = if segment.is_start { title } else { "" };

    let inner: String = body.chars().take(width - 2).collect();
    let fill = width - 2 - inner.chars().count();
    format!("{}{}{}{}", left, inner, " ".repeat(fill), right)
}

fn overflow_row(week: &WeekLayout) -> String {
    week.days
        .iter()
        .map(|day| {
            let text = if day.hidden() > 0 {
                format!("+{} more", day.hidden())
            } else {
                String::new()
            };
            format!("{:<width$}", text, width = CELL).dimmed().to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calshot_core::event::EventId;
    use calshot_core::{Month, MonthGrid, RowMemo, layout_month};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn segment(span: usize, is_start: bool, continues_after: bool) -> Segment {
        Segment {
            event_id: EventId::from("e"),
            week: 0,
            row: 0,
            column_start: 0,
            column_span: span,
            is_start,
            is_end: !continues_after,
            continues_before: !is_start,
            continues_after,
        }
    }

    #[test]
    fn test_bar_label_fills_its_columns() {
        let label = bar_label(&segment(2, true, true), "Offsite");
        assert_eq!(label.chars().count(), 2 * CELL - 1);
        assert!(label.starts_with(" Offsite"));
        assert!(label.ends_with('>'));
    }

    #[test]
    fn test_bar_label_hides_title_after_first_week() {
        let label = bar_label(&segment(3, false, false), "Offsite");
        assert!(label.starts_with('<'));
        assert!(!label.contains("Offsite"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let label = bar_label(&segment(1, true, false), "A very long event title");
        assert_eq!(label.chars().count(), CELL - 1);
    }

    #[test]
    fn test_month_grid_output() {
        let events = vec![
            Event::new("Offsite", date(2024, 6, 10), date(2024, 6, 12), None),
            Event::on("A", date(2024, 6, 20)),
            Event::on("B", date(2024, 6, 20)),
            Event::on("C", date(2024, 6, 20)),
        ];
        let grid = MonthGrid::new(Month::new(2024, 6).unwrap());
        let layout = layout_month(&grid, &events, &RowMemo::new(), None);

        let output = layout.render(&events, &CalendarSettings::default());

        assert!(output.contains("JUNE 2024"));
        assert!(output.contains("Offsite"));
        assert!(output.contains("+1 more"));
        assert!(output.contains("30"));
    }
}
