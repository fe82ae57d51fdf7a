use std::path::PathBuf;

use anyhow::{Context, Result};
use calshot_core::{CalendarView, Exporter, Surface};
use owo_colors::OwoColorize;

use crate::clipboard::StdoutClipboard;

pub async fn run(mut view: CalendarView, dir: PathBuf, copy: bool, viewport: u32) -> Result<()> {
    let mut surface = Surface::new(view.scene()?, viewport);
    let exporter = Exporter::default();

    if copy {
        exporter.copy(&mut surface, &StdoutClipboard).await?;
        return Ok(());
    }

    std::fs::create_dir_all(&dir).with_context(|| format!("Could not create {}", dir.display()))?;
    let path = exporter.download(&mut surface, view.month(), &dir).await?;
    println!("{}", format!("Saved {}", path.display()).green());

    Ok(())
}
