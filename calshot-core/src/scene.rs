//! The calendar drawn as a display list.
//!
//! A [`Scene`] is built from a [`MonthLayout`] at the canonical frame size
//! and can be painted by any presenter. Export paints it as is; on-screen
//! copies are the same scene with a display scale applied.

use tracing::warn;

use crate::color::{Gradient, is_light_color, parse_hex};
use crate::error::CalShotResult;
use crate::event::{Event, EventId};
use crate::interaction::{GhostPreview, GridGeometry};
use crate::layout::{MAX_EVENTS_PER_DAY, MonthLayout};
use crate::month::{DAYS_PER_WEEK, WEEKDAY_LABELS};
use crate::settings::CalendarSettings;

/// Canonical export frame width (card plus padding on both sides).
pub const EXPORT_WIDTH: u32 = 1124;
/// The export frame is never shorter than this.
pub const MIN_EXPORT_HEIGHT: u32 = 724;
pub const CARD_WIDTH: u32 = 1024;
/// Card width / card height
pub const CARD_ASPECT: f32 = 1.64;
pub const FRAME_PADDING: u32 = 50;

const CARD_PADDING: f32 = 24.0;
const TITLE_HEIGHT: f32 = 56.0;
const HEADER_HEIGHT: f32 = 32.0;
const DAY_LABEL_HEIGHT: f32 = 30.0;
const EVENT_HEIGHT: f32 = 20.0;
const EVENT_GAP: f32 = 2.0;
const EVENT_INSET: f32 = 2.0;
const CORNER_RADIUS: f32 = 4.0;
const GRID_LINE: f32 = 1.0;

const CARD_FILL: Rgba = Rgba(255, 255, 255, 255);
const CARD_BORDER: Rgba = Rgba(229, 231, 235, 255);
const GRID_FILL: Rgba = Rgba(243, 244, 246, 255);
const SHADOW: Rgba = Rgba(0, 0, 0, 26);
const LABEL_TEXT: Rgba = Rgba(75, 85, 99, 255);
const TITLE_TEXT: Rgba = Rgba(31, 41, 55, 255);
const TODAY_FILL: Rgba = Rgba(17, 24, 39, 255);
const GHOST_FILL: Rgba = Rgba(17, 24, 39, 40);
const WHITE_TEXT: Rgba = Rgba(255, 255, 255, 255);
const BLACK_TEXT: Rgba = Rgba(0, 0, 0, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub fn from_hex(hex: &str) -> CalShotResult<Self> {
        let [r, g, b] = parse_hex(hex)?;
        Ok(Rgba(r, g, b, 255))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn inset(&self, by: f32) -> Self {
        Rect::new(
            self.x + by,
            self.y + by,
            (self.width - 2.0 * by).max(0.0),
            (self.height - 2.0 * by).max(0.0),
        )
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Rect::new(self.x * factor, self.y * factor, self.width * factor, self.height * factor)
    }
}

/// Which corners of a rectangle are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Corners {
    pub left: bool,
    pub right: bool,
    pub radius: f32,
}

impl Corners {
    pub fn all(radius: f32) -> Self {
        Corners {
            left: true,
            right: true,
            radius,
        }
    }

    pub fn none() -> Self {
        Corners::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    /// Stop colors are `#RRGGBB` strings, parsed at paint time
    Linear(Gradient),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Rect {
        rect: Rect,
        fill: Fill,
        corners: Corners,
    },
    /// `y` is the top of the line; `x` is its left edge or center per `align`.
    Text {
        x: f32,
        y: f32,
        size: f32,
        text: String,
        color: Rgba,
        align: TextAlign,
        /// Glyphs past this width are not drawn
        max_width: Option<f32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// Layout metrics of a built scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneMetrics {
    pub card: Rect,
    pub grid: GridGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub transparent: bool,
    pub metrics: SceneMetrics,
    pub commands: Vec<PaintCommand>,
}

impl Scene {
    /// Build the calendar frame at the canonical export width. Fails when an
    /// event carries a color that is not `#RRGGBB`.
    pub fn build(
        layout: &MonthLayout,
        events: &[Event],
        settings: &CalendarSettings,
        ghost: Option<&GhostPreview>,
    ) -> CalShotResult<Self> {
        SceneBuilder::new(layout, events, settings).build(ghost)
    }

    /// Hit-test geometry at a display scale.
    pub fn geometry(&self, scale: f32) -> GridGeometry {
        self.metrics.grid.scaled(scale)
    }
}

/// On-screen scale for a viewport: shrink to fit with some padding, but never
/// below 70% and never enlarge.
pub fn display_scale(viewport_width: u32) -> f32 {
    const CONTAINER_PADDING: f32 = 64.0;
    const BASE_WIDTH: f32 = 1200.0;
    ((viewport_width as f32 - CONTAINER_PADDING) / BASE_WIDTH).clamp(0.7, 1.0)
}

struct SceneBuilder<'a> {
    layout: &'a MonthLayout,
    events: &'a [Event],
    settings: &'a CalendarSettings,
    commands: Vec<PaintCommand>,
}

impl<'a> SceneBuilder<'a> {
    fn new(layout: &'a MonthLayout, events: &'a [Event], settings: &'a CalendarSettings) -> Self {
        SceneBuilder {
            layout,
            events,
            settings,
            commands: Vec::new(),
        }
    }

    fn build(mut self, ghost: Option<&GhostPreview>) -> CalShotResult<Scene> {
        let weeks = self.layout.weeks.len().max(1) as f32;
        let padding = FRAME_PADDING as f32;

        let card_height = (CARD_WIDTH as f32 / CARD_ASPECT).round();
        let width = EXPORT_WIDTH;
        let height = ((card_height + 2.0 * padding) as u32).max(MIN_EXPORT_HEIGHT);
        let card = Rect::new(padding, padding, CARD_WIDTH as f32, card_height);

        let grid_top = card.y + CARD_PADDING + TITLE_HEIGHT + HEADER_HEIGHT;
        let grid_left = card.x + CARD_PADDING;
        let cell_width = (card.width - 2.0 * CARD_PADDING) / DAYS_PER_WEEK as f32;
        let cell_height = (card.y + card.height - CARD_PADDING - grid_top) / weeks;
        let grid = GridGeometry {
            origin_x: grid_left,
            origin_y: grid_top,
            cell_width,
            cell_height,
            weeks: self.layout.weeks.len(),
        };

        self.background(width, height);
        self.card(card);
        self.title(card);
        self.weekday_header(&grid);
        self.cells(&grid);
        self.event_bars(&grid)?;
        if let Some(ghost) = ghost {
            self.ghost(&grid, ghost);
        }

        Ok(Scene {
            width,
            height,
            transparent: self.settings.is_transparent,
            metrics: SceneMetrics { card, grid },
            commands: self.commands,
        })
    }

    fn rect(&mut self, rect: Rect, fill: Fill, corners: Corners) {
        self.commands.push(PaintCommand::Rect { rect, fill, corners });
    }

    fn text(&mut self, x: f32, y: f32, size: f32, text: impl Into<String>, color: Rgba) {
        self.push_text(x, y, size, text.into(), color, TextAlign::Left, None);
    }

    fn centered_text(&mut self, x: f32, y: f32, size: f32, text: impl Into<String>, color: Rgba) {
        self.push_text(x, y, size, text.into(), color, TextAlign::Center, None);
    }

    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &mut self,
        x: f32,
        y: f32,
        size: f32,
        text: String,
        color: Rgba,
        align: TextAlign,
        max_width: Option<f32>,
    ) {
        self.commands.push(PaintCommand::Text {
            x,
            y,
            size,
            text,
            color,
            align,
            max_width,
        });
    }

    fn background(&mut self, width: u32, height: u32) {
        if self.settings.is_transparent {
            return;
        }
        let frame = Rect::new(0.0, 0.0, width as f32, height as f32);
        let fill = match (&self.settings.bg_gradient, self.settings.bg_color.as_deref()) {
            (Some(gradient), _) => Fill::Linear(gradient.clone()),
            (None, Some(color)) => match Rgba::from_hex(color) {
                Ok(rgba) => Fill::Solid(rgba),
                Err(e) => {
                    warn!(error = %e, "unusable background color, painting white");
                    Fill::Solid(CARD_FILL)
                }
            },
            (None, None) => Fill::Solid(CARD_FILL),
        };
        self.rect(frame, fill, Corners::none());
    }

    fn card(&mut self, card: Rect) {
        if self.settings.show_shadow {
            for spread in [12.0, 8.0, 4.0] {
                let shadow = Rect::new(card.x - spread / 2.0, card.y + spread, card.width + spread, card.height);
                self.rect(shadow, Fill::Solid(SHADOW), Corners::all(12.0 + spread));
            }
        }
        self.rect(card, Fill::Solid(CARD_BORDER), Corners::all(12.0));
        self.rect(card.inset(1.0), Fill::Solid(CARD_FILL), Corners::all(11.0));
    }

    fn title(&mut self, card: Rect) {
        let label = self.layout.grid.month().label().to_uppercase();
        self.centered_text(card.x + card.width / 2.0, card.y + CARD_PADDING + 4.0, 24.0, label, TITLE_TEXT);
    }

    fn weekday_header(&mut self, grid: &GridGeometry) {
        let y = grid.origin_y - HEADER_HEIGHT;
        self.rect(
            Rect::new(grid.origin_x, y, grid.cell_width * DAYS_PER_WEEK as f32, HEADER_HEIGHT),
            Fill::Solid(GRID_FILL),
            Corners::none(),
        );
        for (column, label) in WEEKDAY_LABELS.iter().enumerate() {
            let x = grid.origin_x + grid.cell_width * (column as f32 + 0.5);
            self.centered_text(x, y + 9.0, 14.0, *label, LABEL_TEXT);
        }
    }

    fn cells(&mut self, grid: &GridGeometry) {
        let days: Vec<_> = self
            .layout
            .weeks
            .iter()
            .flat_map(|w| w.days.iter().enumerate().map(move |(c, d)| (w.index, c, d)))
            .collect();

        for (week, column, day) in days {
            let cell = cell_rect(grid, week, column);
            self.rect(cell, Fill::Solid(GRID_FILL), Corners::none());
            self.rect(cell.inset(GRID_LINE / 2.0), Fill::Solid(CARD_FILL), Corners::none());

            if !day.in_month {
                continue;
            }
            let number = day.date.format("%-d").to_string();
            let (nx, ny) = (cell.x + 8.0, cell.y + 8.0);
            if self.settings.show_today && day.is_today {
                self.rect(Rect::new(nx - 2.0, ny - 2.0, 24.0, 24.0), Fill::Solid(TODAY_FILL), Corners::all(12.0));
                self.centered_text(nx + 10.0, ny + 4.5, 11.0, number, WHITE_TEXT);
            } else {
                self.centered_text(nx + 10.0, ny + 4.5, 11.0, number, LABEL_TEXT);
            }

            if day.hidden() > 0 {
                let y = cell.y + DAY_LABEL_HEIGHT + MAX_EVENTS_PER_DAY as f32 * (EVENT_HEIGHT + EVENT_GAP);
                self.text(cell.x + 8.0, y, 11.0, format!("+{} more", day.hidden()), LABEL_TEXT);
            }
        }
    }

    fn event_bars(&mut self, grid: &GridGeometry) -> CalShotResult<()> {
        let palette = self.settings.palette();
        let segments: Vec<_> = self.layout.segments().cloned().collect();

        for segment in segments {
            let Some(event) = self.find(&segment.event_id) else {
                continue;
            };
            let color = event.color.clone().unwrap_or_else(|| palette.default_color().to_string());
            let title = event.display_title().to_string();

            let cell = cell_rect(grid, segment.week, segment.column_start);
            let bar = Rect::new(
                cell.x + EVENT_INSET,
                cell.y + DAY_LABEL_HEIGHT + segment.row as f32 * (EVENT_HEIGHT + EVENT_GAP),
                grid.cell_width * segment.column_span as f32 - 2.0 * EVENT_INSET,
                EVENT_HEIGHT,
            );
            let corners = Corners {
                left: segment.is_start,
                right: segment.is_end,
                radius: CORNER_RADIUS,
            };

            self.rect(bar, Fill::Solid(Rgba::from_hex(&color)?), corners);

            if segment.is_start {
                let text_color = if is_light_color(&color) { BLACK_TEXT } else { WHITE_TEXT };
                let room = (bar.width - 16.0).max(0.0);
                self.push_text(bar.x + 8.0, bar.y + 4.0, 12.0, title, text_color, TextAlign::Left, Some(room));
            }
        }
        Ok(())
    }

    fn ghost(&mut self, grid: &GridGeometry, ghost: &GhostPreview) {
        let row = self.layout.rows.get(&ghost.event_id).unwrap_or(0) as f32;
        for piece in &ghost.pieces {
            let cell = cell_rect(grid, piece.week, piece.column_start);
            let rect = Rect::new(
                cell.x + EVENT_INSET,
                cell.y + DAY_LABEL_HEIGHT + row * (EVENT_HEIGHT + EVENT_GAP),
                grid.cell_width * piece.column_span as f32 - 2.0 * EVENT_INSET,
                EVENT_HEIGHT,
            );
            self.rect(rect, Fill::Solid(GHOST_FILL), Corners::all(CORNER_RADIUS));
        }
    }

    fn find(&self, id: &EventId) -> Option<&'a Event> {
        self.events.iter().find(|e| &e.id == id)
    }
}

fn cell_rect(grid: &GridGeometry, week: usize, column: usize) -> Rect {
    Rect::new(
        grid.origin_x + grid.cell_width * column as f32,
        grid.origin_y + grid.cell_height * week as f32,
        grid.cell_width,
        grid.cell_height,
    )
}
