//! Core types for calshot.
//!
//! This crate holds everything behind the month-view calendar:
//! - `store` owns the events and notifies observers of changes
//! - `month` and `layout` place events on the 5 or 6 week grid
//! - `interaction` turns pointer and keyboard input into store commands
//! - `scene`, `raster` and `export` turn a laid-out month into a PNG

pub mod color;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod interaction;
pub mod layout;
pub mod month;
pub mod raster;
pub mod scene;
pub mod settings;
pub mod store;
pub mod view;

// Re-export the main types at crate root for convenience
pub use config::CalshotConfig;
pub use error::{CalShotError, CalShotResult};
pub use event::{Event, EventId, EventPatch};
pub use export::{Clipboard, Exporter, Surface};
pub use interaction::{Command, Input, Interaction, InteractionController, Key};
pub use layout::{MonthLayout, RowMemo, layout_month};
pub use month::{Month, MonthGrid};
pub use scene::Scene;
pub use settings::{Background, CalendarSettings};
pub use store::{EventStore, StoreChange};
pub use view::CalendarView;
