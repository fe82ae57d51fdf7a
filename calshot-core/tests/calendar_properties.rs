use calshot_core::export::Exporter;
use calshot_core::layout::MAX_EVENTS_PER_DAY;
use calshot_core::raster::PIXEL_RATIO;
use calshot_core::scene::EXPORT_WIDTH;
use calshot_core::{
    CalendarSettings, CalendarView, Event, EventId, EventStore, Month, MonthGrid, RowMemo, Surface, layout_month,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_week_count_five_or_six() {
    // June 2024 has 30 days and starts on a Saturday
    assert_eq!(MonthGrid::new(Month::new(2024, 6).unwrap()).week_count(), 6);
    // February 2015 has 28 days and starts on a Sunday
    assert_eq!(MonthGrid::new(Month::new(2015, 2).unwrap()).week_count(), 5);

    for year in 2020..2030 {
        for month in 1..=12 {
            let grid = MonthGrid::new(Month::new(year, month).unwrap());
            let needed = (grid.start_offset() + grid.month().days_in_month() as usize).div_ceil(7);
            assert_eq!(grid.week_count(), if needed > 5 { 6 } else { 5 });
        }
    }
}

#[test]
fn test_move_preserves_duration() {
    let trip = Event::new("Trip", date(2024, 6, 6), date(2024, 6, 11), None);
    let id = trip.id.clone();
    let mut store = EventStore::with_events([trip]);

    store.move_event(&id, date(2024, 6, 27));

    let moved = store.get(&id).unwrap();
    assert_eq!(moved.start_date, date(2024, 6, 27));
    assert_eq!(moved.end_date, date(2024, 7, 2));
}

#[test]
fn test_resize_before_start_collapses() {
    let trip = Event::new("Trip", date(2024, 6, 6), date(2024, 6, 11), None);
    let id = trip.id.clone();
    let mut store = EventStore::with_events([trip]);

    store.resize(&id, date(2024, 6, 1));

    let resized = store.get(&id).unwrap();
    assert_eq!(resized.end_date, resized.start_date);
}

#[test]
fn test_no_day_shows_more_than_two_events() {
    let events: Vec<Event> = (0..6)
        .map(|i| Event::new(format!("E{i}"), date(2024, 6, 3 + i), date(2024, 6, 12), None))
        .collect();
    let grid = MonthGrid::new(Month::new(2024, 6).unwrap());
    let layout = layout_month(&grid, &events, &RowMemo::new(), None);

    for day in layout.days() {
        assert!(day.entries.len() <= MAX_EVENTS_PER_DAY);
        assert!(day.entries.iter().all(|e| e.row < MAX_EVENTS_PER_DAY));
    }
    let busiest = layout.day(date(2024, 6, 10)).unwrap();
    assert_eq!(busiest.hidden(), 4);
}

#[test]
fn test_row_is_stable_across_span() {
    let long = Event::new("Long", date(2024, 6, 3), date(2024, 6, 14), None);
    let short = Event::new("Short", date(2024, 6, 5), date(2024, 6, 6), None);
    let id = long.id.clone();
    let grid = MonthGrid::new(Month::new(2024, 6).unwrap());
    let events = [long, short];
    let layout = layout_month(&grid, &events, &RowMemo::new(), None);

    let rows: Vec<usize> = (3..=14)
        .map(|d| layout.day(date(2024, 6, d)).unwrap().entry_for(&id).unwrap().row)
        .collect();
    assert!(rows.iter().all(|r| *r == 0));

    // A second pass seeded with the first keeps the same rows
    let again = layout_month(&grid, &events, &layout.rows, None);
    assert_eq!(again.rows, layout.rows);
}

#[test]
fn test_quick_create_reads_back() {
    let mut store = EventStore::new();
    let id = store.quick_create("Launch", date(2024, 6, 10));

    let event = store.get(&id).unwrap();
    assert_eq!(event.title, "Launch");
    assert_eq!(event.start_date, date(2024, 6, 10));
    assert_eq!(event.end_date, date(2024, 6, 10));
}

#[test]
fn test_delete_missing_id_is_noop() {
    let mut store = EventStore::with_events([Event::on("Launch", date(2024, 6, 10))]);
    let before = store.events().to_vec();

    store.delete(&EventId::from("does-not-exist"));

    assert_eq!(store.events(), before.as_slice());
}

#[tokio::test]
async fn test_export_width_ignores_display_scale() {
    let mut view = CalendarView::new(
        Month::new(2024, 6).unwrap(),
        EventStore::with_events([Event::new("Trip", date(2024, 6, 6), date(2024, 6, 11), None)]),
        CalendarSettings::default(),
        None,
    );
    let exporter = Exporter::default();

    for viewport in [640, 1280] {
        let mut surface = Surface::new(view.scene().unwrap(), viewport);
        let snapshot = exporter.render(&mut surface).await.unwrap();
        assert_eq!(snapshot.width, EXPORT_WIDTH * PIXEL_RATIO);
    }
}
