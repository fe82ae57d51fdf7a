//! In-memory event store.
//!
//! The store is the single owner of the canonical event list. Everything else
//! reads through [`EventStore::events`] or calls the mutation methods.

use chrono::NaiveDate;
use tracing::debug;

use crate::event::{Event, EventId, EventPatch};

/// What a mutation changed, sent to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Added(EventId),
    Updated(EventId),
    Deleted(EventId),
    Moved(EventId),
    Resized(EventId),
}

type Observer = Box<dyn FnMut(&StoreChange)>;

#[derive(Default)]
pub struct EventStore {
    events: Vec<Event>,
    observers: Vec<Observer>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        EventStore {
            events: events.into_iter().collect(),
            observers: Vec::new(),
        }
    }

    /// Register a callback invoked after every effective mutation.
    pub fn subscribe(&mut self, observer: impl FnMut(&StoreChange) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    // MUTATIONS:

    /// Append an event. The caller guarantees `start_date <= end_date`.
    pub fn add(&mut self, event: Event) -> EventId {
        let id = event.id.clone();
        debug!(id = %id, title = %event.title, start = %event.start_date, end = %event.end_date, "add event");
        self.events.push(event);
        self.notify(StoreChange::Added(id.clone()));
        id
    }

    /// Add a single-day event with no explicit color.
    pub fn quick_create(&mut self, title: &str, date: NaiveDate) -> EventId {
        self.add(Event::on(title, date))
    }

    /// Merge `patch` into the event. Unknown ids are ignored.
    pub fn update(&mut self, id: &EventId, patch: EventPatch) {
        let Some(event) = self.find_mut(id) else {
            debug!(id = %id, "update ignored, no such event");
            return;
        };
        patch.apply(event);
        debug!(id = %id, "update event");
        self.notify(StoreChange::Updated(id.clone()));
    }

    /// Remove the event. Unknown ids are ignored.
    pub fn delete(&mut self, id: &EventId) {
        let before = self.events.len();
        self.events.retain(|e| &e.id != id);
        if self.events.len() == before {
            debug!(id = %id, "delete ignored, no such event");
            return;
        }
        debug!(id = %id, "delete event");
        self.notify(StoreChange::Deleted(id.clone()));
    }

    /// Shift the event so it starts on `target`, keeping its duration.
    pub fn move_event(&mut self, id: &EventId, target: NaiveDate) {
        let Some(event) = self.find_mut(id) else {
            debug!(id = %id, "move ignored, no such event");
            return;
        };
        let day_delta = (target - event.start_date).num_days();
        event.shift(day_delta);
        debug!(id = %id, day_delta, start = %event.start_date, end = %event.end_date, "move event");
        self.notify(StoreChange::Moved(id.clone()));
    }

    /// Set the end date. A target on or before the start collapses the event
    /// to a single day.
    pub fn resize(&mut self, id: &EventId, target_end: NaiveDate) {
        let Some(event) = self.find_mut(id) else {
            debug!(id = %id, "resize ignored, no such event");
            return;
        };
        event.end_date = if target_end > event.start_date {
            target_end
        } else {
            event.start_date
        };
        debug!(id = %id, end = %event.end_date, "resize event");
        self.notify(StoreChange::Resized(id.clone()));
    }

    fn find_mut(&mut self, id: &EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| &e.id == id)
    }

    fn notify(&mut self, change: StoreChange) {
        for observer in &mut self.observers {
            observer(&change);
        }
    }
}
