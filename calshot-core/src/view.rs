//! A calendar being edited: one month, its events and the gesture in progress.

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::CalShotResult;
use crate::interaction::{Command, GridGeometry, Input, InteractionController};
use crate::layout::{MonthLayout, RowMemo, layout_month};
use crate::month::{Month, MonthGrid};
use crate::scene::Scene;
use crate::settings::CalendarSettings;
use crate::store::EventStore;

/// Ties the store, layout and interaction state together.
///
/// The layout is recomputed lazily: store mutations mark it stale through a
/// store observer, and the next read lays the month out again seeded with the
/// previous pass's rows.
pub struct CalendarView {
    month: Month,
    today: Option<NaiveDate>,
    store: EventStore,
    settings: CalendarSettings,
    controller: InteractionController,
    layout: MonthLayout,
    stale: Rc<Cell<bool>>,
}

impl CalendarView {
    pub fn new(month: Month, mut store: EventStore, settings: CalendarSettings, today: Option<NaiveDate>) -> Self {
        let stale = Rc::new(Cell::new(false));
        let flag = Rc::clone(&stale);
        store.subscribe(move |_| flag.set(true));

        let layout = layout_month(&MonthGrid::new(month), store.events(), &RowMemo::new(), today);
        CalendarView {
            month,
            today,
            store,
            settings,
            controller: InteractionController::new(),
            layout,
            stale,
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut CalendarSettings {
        &mut self.settings
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn layout(&mut self) -> &MonthLayout {
        self.refresh();
        &self.layout
    }

    pub fn go_to(&mut self, month: Month) {
        if month != self.month {
            debug!(from = %self.month, to = %month, "navigate");
            self.month = month;
            self.controller.cancel();
            self.stale.set(true);
        }
    }

    pub fn next_month(&mut self) {
        self.go_to(self.month.next());
    }

    pub fn prev_month(&mut self) {
        self.go_to(self.month.prev());
    }

    /// Feed one input to the interaction controller.
    pub fn handle(&mut self, input: Input) -> Option<Command> {
        self.refresh();
        self.controller.handle(input, &self.layout, &mut self.store)
    }

    /// Hover at a pointer position within the scene drawn at `geometry`.
    pub fn hover_point(&mut self, geometry: &GridGeometry, x: f32, y: f32) {
        self.refresh();
        self.controller.hover_point(geometry, x, y, &self.layout, &mut self.store);
    }

    pub fn cancel(&mut self) {
        self.controller.cancel();
    }

    /// Canonical scene for the current state, including any resize ghost.
    pub fn scene(&mut self) -> CalShotResult<Scene> {
        self.refresh();
        let ghost = self.controller.state().ghost_preview(&self.layout.grid);
        Scene::build(&self.layout, self.store.events(), &self.settings, ghost.as_ref())
    }

    fn refresh(&mut self) {
        if !self.stale.replace(false) {
            return;
        }
        let grid = MonthGrid::new(self.month);
        self.layout = layout_month(&grid, self.store.events(), &self.layout.rows, self.today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::interaction::Interaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn view(events: Vec<Event>) -> CalendarView {
        CalendarView::new(
            Month::new(2024, 6).unwrap(),
            EventStore::with_events(events),
            CalendarSettings::default(),
            Some(date(2024, 6, 18)),
        )
    }

    #[test]
    fn test_store_changes_refresh_layout() {
        let mut view = view(vec![]);
        assert_eq!(view.layout().occupancy(date(2024, 6, 10)), 0);

        view.store_mut().quick_create("Launch", date(2024, 6, 10));

        assert_eq!(view.layout().occupancy(date(2024, 6, 10)), 1);
    }

    #[test]
    fn test_click_and_type_creates_event() {
        let mut view = view(vec![]);
        view.handle(Input::ClickCell(date(2024, 6, 10)));
        view.handle(Input::Text("Launch".into()));
        let command = view.handle(Input::Key(crate::interaction::Key::Enter));

        assert!(matches!(command, Some(Command::Create { .. })));
        assert_eq!(view.store().len(), 1);
        assert_eq!(view.layout().occupancy(date(2024, 6, 10)), 1);
    }

    #[test]
    fn test_navigation_cancels_gesture_and_relayouts() {
        let trip = Event::new("Trip", date(2024, 6, 28), date(2024, 7, 3), None);
        let id = trip.id.clone();
        let mut view = view(vec![trip]);
        view.handle(Input::GrabEvent(id.clone()));
        assert!(!view.controller().state().is_idle());

        view.next_month();

        assert_eq!(view.month(), Month::new(2024, 7).unwrap());
        assert_eq!(view.controller().state(), &Interaction::Idle);
        assert!(view.layout().occupies(date(2024, 7, 2), &id));
    }

    #[test]
    fn test_scene_carries_resize_ghost() {
        let trip = Event::new("Trip", date(2024, 6, 6), date(2024, 6, 7), None);
        let mut view = view(vec![trip.clone()]);
        let plain = view.scene().unwrap().commands.len();

        view.handle(Input::GrabResizeHandle {
            event_id: trip.id.clone(),
            start_date: trip.start_date,
        });
        view.handle(Input::Hover(Some(date(2024, 6, 12))));

        assert!(view.scene().unwrap().commands.len() > plain);
    }
}
