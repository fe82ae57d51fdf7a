//! Pointer and keyboard interaction on the month grid.
//!
//! Gestures are an explicit state machine. [`step`] is a pure transition
//! function: it takes the current state and one input and returns the next
//! state plus, when a gesture completes, the [`Command`] to run against the
//! store. [`InteractionController`] owns the state and applies commands.

use chrono::NaiveDate;
use tracing::debug;

use crate::event::{Event, EventId};
use crate::layout::{MAX_EVENTS_PER_DAY, MonthLayout};
use crate::month::{DAYS_PER_WEEK, MonthGrid};
use crate::store::EventStore;

/// What the drop predicates need to know about the current layout.
pub trait Occupancy {
    /// Whether `date` is a cell of the visible grid.
    fn contains(&self, date: NaiveDate) -> bool;
    /// Events covering `date`.
    fn occupancy(&self, date: NaiveDate) -> usize;
    /// Whether `id` covers `date`, shown or hidden by overflow.
    fn occupies(&self, date: NaiveDate, id: &EventId) -> bool;
}

impl Occupancy for MonthLayout {
    fn contains(&self, date: NaiveDate) -> bool {
        self.grid.contains(date)
    }

    fn occupancy(&self, date: NaiveDate) -> usize {
        MonthLayout::occupancy(self, date)
    }

    fn occupies(&self, date: NaiveDate, id: &EventId) -> bool {
        MonthLayout::occupies(self, date, id)
    }
}

/// The cell under the pointer during a move drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub date: NaiveDate,
    pub accepts: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Interaction {
    #[default]
    Idle,
    Moving {
        event_id: EventId,
        hover: Option<MoveTarget>,
    },
    Resizing {
        event_id: EventId,
        start_date: NaiveDate,
        hover: Option<NaiveDate>,
    },
    QuickCreating {
        date: NaiveDate,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Pointer down on an event body
    GrabEvent(EventId),
    /// Pointer down on an event's trailing-edge handle
    GrabResizeHandle {
        event_id: EventId,
        start_date: NaiveDate,
    },
    /// Pointer over a day cell, or over nothing
    Hover(Option<NaiveDate>),
    Release,
    ClickCell(NaiveDate),
    Text(String),
    Key(Key),
    Blur,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move { id: EventId, to: NaiveDate },
    Resize { id: EventId, end: NaiveDate },
    Create { title: String, date: NaiveDate },
}

/// A cell accepts a moved event if the event already covers that day or the
/// day still has a free row.
pub fn accepts_move(occupancy: &impl Occupancy, date: NaiveDate, id: &EventId) -> bool {
    occupancy.contains(date)
        && (occupancy.occupies(date, id) || occupancy.occupancy(date) < MAX_EVENTS_PER_DAY)
}

/// Advance the state machine by one input.
///
/// Inputs that make no sense in the current state leave it untouched; in
/// particular a grab while another gesture is active is ignored.
pub fn step(
    state: Interaction,
    input: Input,
    occupancy: &impl Occupancy,
) -> (Interaction, Option<Command>) {
    use Interaction::*;

    match (state, input) {
        (Idle, Input::GrabEvent(event_id)) => (Moving { event_id, hover: None }, None),
        (Idle, Input::GrabResizeHandle { event_id, start_date }) => (
            Resizing {
                event_id,
                start_date,
                hover: None,
            },
            None,
        ),
        (Idle, Input::ClickCell(date)) if occupancy.contains(date) && occupancy.occupancy(date) == 0 => {
            (
                QuickCreating {
                    date,
                    text: String::new(),
                },
                None,
            )
        }

        (Moving { event_id, .. }, Input::Hover(date)) => {
            let hover = date.map(|date| MoveTarget {
                date,
                accepts: accepts_move(occupancy, date, &event_id),
            });
            (Moving { event_id, hover }, None)
        }
        (Moving { event_id, hover }, Input::Release) => match hover {
            Some(MoveTarget { date, accepts: true }) => (Idle, Some(Command::Move { id: event_id, to: date })),
            _ => (Idle, None),
        },

        (Resizing { event_id, start_date, .. }, Input::Hover(date)) => {
            let hover = date.filter(|d| occupancy.contains(*d));
            (
                Resizing {
                    event_id,
                    start_date,
                    hover,
                },
                None,
            )
        }
        (Resizing { event_id, hover, .. }, Input::Release) => match hover {
            Some(end) => (Idle, Some(Command::Resize { id: event_id, end })),
            None => (Idle, None),
        },

        (QuickCreating { date, .. }, Input::Text(text)) => (QuickCreating { date, text }, None),
        (QuickCreating { date, text }, Input::Key(Key::Enter) | Input::Blur) => (
            Idle,
            Some(Command::Create {
                title: text.trim().to_string(),
                date,
            }),
        ),
        (QuickCreating { .. }, Input::Key(Key::Escape)) => (Idle, None),

        (state, _) => (state, None),
    }
}

/// Where a resize would land if released now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostPreview {
    pub event_id: EventId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// The logical range clipped to each week row it touches
    pub pieces: Vec<GhostPiece>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostPiece {
    pub week: usize,
    pub column_start: usize,
    pub column_span: usize,
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// Ghost preview for an active resize that hovers a cell.
    pub fn ghost_preview(&self, grid: &MonthGrid) -> Option<GhostPreview> {
        let Interaction::Resizing {
            event_id,
            start_date,
            hover: Some(hovered),
        } = self
        else {
            return None;
        };

        let start = *start_date;
        let end = (*hovered).max(start);

        let pieces = (0..grid.week_count())
            .filter_map(|week| {
                let week_start = grid.date_at(week, 0);
                let week_end = grid.date_at(week, DAYS_PER_WEEK - 1);
                let from = start.max(week_start);
                let to = end.min(week_end);
                (from <= to).then(|| GhostPiece {
                    week,
                    column_start: (from - week_start).num_days() as usize,
                    column_span: (to - from).num_days() as usize + 1,
                })
            })
            .collect();

        Some(GhostPreview {
            event_id: event_id.clone(),
            start,
            end,
            pieces,
        })
    }
}

/// Day-cell boundaries in output coordinates, for hit-testing the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Top-left corner of the first week row
    pub origin_x: f32,
    pub origin_y: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    pub weeks: usize,
}

impl GridGeometry {
    /// The same grid drawn at `factor` times its size.
    pub fn scaled(&self, factor: f32) -> Self {
        GridGeometry {
            origin_x: self.origin_x * factor,
            origin_y: self.origin_y * factor,
            cell_width: self.cell_width * factor,
            cell_height: self.cell_height * factor,
            weeks: self.weeks,
        }
    }

    /// `(week, column)` of the cell containing the point.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        if dx < 0.0 || dy < 0.0 || self.cell_width <= 0.0 || self.cell_height <= 0.0 {
            return None;
        }
        let column = (dx / self.cell_width) as usize;
        let week = (dy / self.cell_height) as usize;
        (column < DAYS_PER_WEEK && week < self.weeks).then_some((week, column))
    }

    pub fn date_at(&self, grid: &MonthGrid, x: f32, y: f32) -> Option<NaiveDate> {
        self.cell_at(x, y).map(|(week, column)| grid.date_at(week, column))
    }
}

/// Owns the gesture state and applies completed gestures to the store.
#[derive(Debug, Default)]
pub struct InteractionController {
    state: Interaction,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Interaction {
        &self.state
    }

    /// Feed one input; returns the command that was applied, if any.
    pub fn handle(
        &mut self,
        input: Input,
        layout: &MonthLayout,
        store: &mut EventStore,
    ) -> Option<Command> {
        let previous = std::mem::take(&mut self.state);
        let (next, command) = step(previous.clone(), input, layout);
        if next != previous {
            debug!(from = ?previous, to = ?next, "interaction state");
        }
        self.state = next;

        let command = command?;
        match &command {
            Command::Move { id, to } => store.move_event(id, *to),
            Command::Resize { id, end } => store.resize(id, *end),
            Command::Create { title, date } => {
                store.quick_create(title, *date);
            }
        }
        Some(command)
    }

    pub fn grab_event(&mut self, event: &Event, layout: &MonthLayout, store: &mut EventStore) {
        self.handle(Input::GrabEvent(event.id.clone()), layout, store);
    }

    pub fn grab_resize_handle(&mut self, event: &Event, layout: &MonthLayout, store: &mut EventStore) {
        let input = Input::GrabResizeHandle {
            event_id: event.id.clone(),
            start_date: event.start_date,
        };
        self.handle(input, layout, store);
    }

    /// Hover by pointer position, resolved against the cell boundaries.
    pub fn hover_point(
        &mut self,
        geometry: &GridGeometry,
        x: f32,
        y: f32,
        layout: &MonthLayout,
        store: &mut EventStore,
    ) {
        let date = geometry.date_at(&layout.grid, x, y);
        self.handle(Input::Hover(date), layout, store);
    }

    pub fn release(&mut self, layout: &MonthLayout, store: &mut EventStore) -> Option<Command> {
        self.handle(Input::Release, layout, store)
    }

    /// Abort whatever gesture is active without touching the store.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            debug!("interaction cancelled");
        }
        self.state = Interaction::Idle;
    }
}
