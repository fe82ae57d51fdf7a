//! Read-only events file used to fill the store for one run.
//!
//! ```toml
//! [[events]]
//! title = "Team offsite"
//! start = "2024-06-10"
//! end = "2024-06-12"
//! color = "#10B981"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use calshot_core::Event;
use calshot_core::color::parse_hex;
use calshot_core::event::parse_date;
use serde::Deserialize;

#[derive(Deserialize)]
struct SeedFile {
    #[serde(default)]
    events: Vec<SeedEvent>,
}

#[derive(Deserialize)]
struct SeedEvent {
    #[serde(default)]
    title: String,
    start: String,
    /// Defaults to `start`
    end: Option<String>,
    color: Option<String>,
}

pub fn load(path: &Path) -> Result<Vec<Event>> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

fn parse(content: &str) -> Result<Vec<Event>> {
    let file: SeedFile = toml::from_str(content)?;

    file.events
        .into_iter()
        .enumerate()
        .map(|(i, seed)| {
            seed.into_event()
                .with_context(|| format!("Invalid event #{}", i + 1))
        })
        .collect()
}

impl SeedEvent {
    fn into_event(self) -> Result<Event> {
        let start = parse_date(&self.start)?;
        let end = match &self.end {
            Some(end) => parse_date(end)?,
            None => start,
        };
        if end < start {
            anyhow::bail!("end {} is before start {}", end, start);
        }
        if let Some(color) = &self.color {
            parse_hex(color)?;
        }
        Ok(Event::new(self.title, start, end, self.color))
    }
}
