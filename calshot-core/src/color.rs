//! Event color palettes derived from the calendar background.
//!
//! Everything here is pure: the same background always yields the same
//! palette.

use serde::{Deserialize, Serialize};

use crate::error::{CalShotError, CalShotResult};

pub const WHITE: &str = "#ffffff";
pub const BLACK: &str = "#000000";

const DEFAULT_PALETTE: [&str; 4] = ["#3B82F6", "#F43F5E", "#10B981", "#8B5CF6"];
const MONOTONE_PALETTE: [&str; 4] = ["#374151", "#4B5563", "#6B7280", "#9CA3AF"];
const EVENT_BOX_SHADOW: &str = "inset 0 0 0 1px rgba(0,0,0,0.1)";

/// Colors for drawing events on a given background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventColors {
    /// Ordered palette; `colors[0]` is the default event color
    pub colors: Vec<String>,
    pub text_color: String,
    pub box_shadow: String,
}

impl EventColors {
    pub fn default_color(&self) -> &str {
        self.colors.first().map(String::as_str).unwrap_or(DEFAULT_PALETTE[0])
    }
}

/// Palette for events drawn over `background`.
///
/// A non-white background yields the background color plus its 90°, 180° and
/// 270° hue rotations; otherwise the built-in vibrant palette is used.
pub fn get_event_color(background: Option<&str>) -> EventColors {
    let background = background.filter(|bg| !bg.is_empty() && !bg.eq_ignore_ascii_case(WHITE));

    let Some(base) = background else {
        return EventColors {
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            text_color: WHITE.to_string(),
            box_shadow: EVENT_BOX_SHADOW.to_string(),
        };
    };

    match complementary_colors(base) {
        Ok(colors) => EventColors {
            colors,
            text_color: if is_light_color(base) { BLACK } else { WHITE }.to_string(),
            box_shadow: EVENT_BOX_SHADOW.to_string(),
        },
        Err(_) => EventColors {
            colors: MONOTONE_PALETTE.iter().map(|c| c.to_string()).collect(),
            text_color: WHITE.to_string(),
            box_shadow: EVENT_BOX_SHADOW.to_string(),
        },
    }
}

fn complementary_colors(base: &str) -> CalShotResult<Vec<String>> {
    let mut colors: Vec<String> = Vec::with_capacity(4);
    for color in [
        base.to_string(),
        adjust_hue(base, 90.0)?,
        adjust_hue(base, 180.0)?,
        adjust_hue(base, 270.0)?,
    ] {
        if !colors.iter().any(|c| c.eq_ignore_ascii_case(&color)) {
            colors.push(color);
        }
    }
    Ok(colors)
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex(color: &str) -> CalShotResult<[u8; 3]> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CalShotError::InvalidColor(color.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| CalShotError::InvalidColor(color.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// YIQ brightness above the midpoint. Unparseable colors count as dark.
pub fn is_light_color(color: &str) -> bool {
    let Ok([r, g, b]) = parse_hex(color) else {
        return false;
    };
    let brightness = (r as f64 * 299.0 + g as f64 * 587.0 + b as f64 * 114.0) / 1000.0;
    brightness > 128.0
}

/// Rotate the hue of `color` by `degrees`, keeping saturation and lightness.
pub fn adjust_hue(color: &str, degrees: f64) -> CalShotResult<String> {
    let [r, g, b] = parse_hex(color)?;
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let hue = (h + degrees).rem_euclid(360.0);
    Ok(to_hex(hsl_to_rgb(hue, s, l)))
}

/// Scale every channel by `1 + percent / 100`, clamped to the valid range.
pub fn adjust_brightness(color: &str, percent: f64) -> CalShotResult<String> {
    let factor = 1.0 + percent / 100.0;
    let rgb = parse_hex(color)?.map(|c| (c as f64 * factor).round().clamp(0.0, 255.0) as u8);
    Ok(to_hex(rgb))
}

/// A linear gradient: angle in CSS degrees (0 = to top, clockwise) and stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub angle: f64,
    /// `(color, position in 0.0..=1.0)`, ascending
    pub stops: Vec<(String, f64)>,
}

impl Gradient {
    /// CSS `linear-gradient(...)` form.
    pub fn to_css(&self) -> String {
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|(color, pos)| format!("{} {}%", color, (pos * 100.0).round()))
            .collect();
        format!("linear-gradient({}deg, {})", self.angle, stops.join(", "))
    }
}

/// Five-stop gradient from 45% darker to 45% lighter around `base`.
pub fn generate_gradient(base: &str, angle: f64) -> CalShotResult<Gradient> {
    Ok(Gradient {
        angle,
        stops: vec![
            (adjust_brightness(base, -45.0)?, 0.0),
            (adjust_brightness(base, -30.0)?, 0.25),
            (to_hex(parse_hex(base)?), 0.5),
            (adjust_brightness(base, 30.0)?, 0.75),
            (adjust_brightness(base, 45.0)?, 1.0),
        ],
    })
}

/// Returns `(hue in degrees, saturation, lightness)`.
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0 * 360.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h / 360.0;
    [h + 1.0 / 3.0, h, h - 1.0 / 3.0].map(|t| (hue_to_rgb(p, q, t) * 255.0).round().clamp(0.0, 255.0) as u8)
}
