//! Presentation settings for a calendar.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::color::{EventColors, Gradient, generate_gradient, get_event_color};
use crate::error::{CalShotError, CalShotResult};
use crate::event::Event;

/// Background choices offered by the background picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Transparent,
    Blue,
    Purple,
    Red,
    Green,
    Orange,
}

impl Background {
    pub const ALL: [Background; 6] = [
        Background::Transparent,
        Background::Blue,
        Background::Purple,
        Background::Red,
        Background::Green,
        Background::Orange,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Background::Transparent => "transparent",
            Background::Blue => "blue",
            Background::Purple => "purple",
            Background::Red => "red",
            Background::Green => "green",
            Background::Orange => "orange",
        }
    }

    /// Base color and gradient angle; `None` for transparent.
    pub fn swatch(&self) -> Option<(&'static str, f64)> {
        match self {
            Background::Transparent => None,
            Background::Blue => Some(("#3B82F6", 45.0)),
            Background::Purple => Some(("#8B5CF6", 135.0)),
            Background::Red => Some(("#EF4444", 225.0)),
            Background::Green => Some(("#10B981", 315.0)),
            Background::Orange => Some(("#F59E0B", 180.0)),
        }
    }
}

impl FromStr for Background {
    type Err = CalShotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Background::ALL
            .into_iter()
            .find(|b| b.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let available: Vec<_> = Background::ALL.iter().map(|b| b.id()).collect();
                CalShotError::Config(format!(
                    "Unknown background '{}'. Available: {}",
                    s,
                    available.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSettings {
    pub show_today: bool,
    pub is_transparent: bool,
    pub bg_color: Option<String>,
    pub bg_gradient: Option<Gradient>,
    pub show_shadow: bool,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        CalendarSettings {
            show_today: true,
            is_transparent: true,
            bg_color: Some(crate::color::WHITE.to_string()),
            bg_gradient: None,
            show_shadow: true,
        }
    }
}

impl CalendarSettings {
    pub fn with_background(mut self, background: Background) -> CalShotResult<Self> {
        self.apply_background(background)?;
        Ok(self)
    }

    pub fn apply_background(&mut self, background: Background) -> CalShotResult<()> {
        match background.swatch() {
            None => {
                self.is_transparent = true;
                self.bg_color = None;
                self.bg_gradient = None;
            }
            Some((color, angle)) => {
                self.bg_gradient = Some(generate_gradient(color, angle)?);
                self.bg_color = Some(color.to_string());
                self.is_transparent = false;
            }
        }
        Ok(())
    }

    /// The preset matching the current background, transparent when none does.
    pub fn background(&self) -> Background {
        if self.is_transparent {
            return Background::Transparent;
        }
        Background::ALL
            .into_iter()
            .find(|b| {
                b.swatch()
                    .zip(self.bg_color.as_deref())
                    .is_some_and(|((color, _), bg)| color.eq_ignore_ascii_case(bg))
            })
            .unwrap_or(Background::Transparent)
    }

    pub fn toggle_today(&mut self) {
        self.show_today = !self.show_today;
    }

    pub fn toggle_shadow(&mut self) {
        self.show_shadow = !self.show_shadow;
    }

    /// Event palette seeded by the background color.
    pub fn palette(&self) -> EventColors {
        get_event_color(self.bg_color.as_deref())
    }

    /// The event's own color, or the palette default.
    pub fn resolve_event_color(&self, event: &Event) -> String {
        event
            .color
            .clone()
            .unwrap_or_else(|| self.palette().default_color().to_string())
    }
}
