use anyhow::Result;
use calshot_core::CalendarView;
use owo_colors::OwoColorize;

use crate::render::{MonthRender, Render};

pub fn run(mut view: CalendarView) -> Result<()> {
    let layout = view.layout().clone();
    println!("{}", layout.render(view.store().events(), view.settings()));

    let visible: Vec<_> = view
        .store()
        .events()
        .iter()
        .filter(|e| e.start_date <= layout.grid.last_day() && e.end_date >= layout.grid.first_day())
        .collect();

    if visible.is_empty() {
        println!("\n{}", "No events this month".dimmed());
        return Ok(());
    }

    println!();
    for event in visible {
        println!("   {}", event.render());
    }

    Ok(())
}
