use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calshot_core::color::parse_hex;
use calshot_core::event::parse_date;
use calshot_core::{
    Background, CalendarView, Event, EventId, EventPatch, Exporter, Input, Interaction, Key, Surface,
};
use chrono::NaiveDate;
use dialoguer::{Confirm, Input as Prompt, Select};
use owo_colors::OwoColorize;

use crate::render::{MonthRender, Render};

/// Viewport the session pretends to be shown in; only affects hit-testing.
const SESSION_VIEWPORT: u32 = 1280;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Add,
    QuickCreate,
    Edit,
    Move,
    Resize,
    Delete,
    Previous,
    Next,
    Background,
    ToggleToday,
    ToggleShadow,
    Export,
    Quit,
}

impl Action {
    const ALL: [Action; 13] = [
        Action::Add,
        Action::QuickCreate,
        Action::Edit,
        Action::Move,
        Action::Resize,
        Action::Delete,
        Action::Previous,
        Action::Next,
        Action::Background,
        Action::ToggleToday,
        Action::ToggleShadow,
        Action::Export,
        Action::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            Action::Add => "Add event",
            Action::QuickCreate => "Quick-create on an empty day",
            Action::Edit => "Edit event",
            Action::Move => "Move event",
            Action::Resize => "Resize event",
            Action::Delete => "Delete event",
            Action::Previous => "Previous month",
            Action::Next => "Next month",
            Action::Background => "Background",
            Action::ToggleToday => "Toggle today marker",
            Action::ToggleShadow => "Toggle shadow",
            Action::Export => "Export PNG",
            Action::Quit => "Quit",
        }
    }

    /// Actions that need an existing event to act on.
    fn needs_event(&self) -> bool {
        matches!(self, Action::Edit | Action::Move | Action::Resize | Action::Delete)
    }
}

pub async fn run(mut view: CalendarView, export_dir: PathBuf) -> Result<()> {
    let exporter = Exporter::default();

    loop {
        print_month(&mut view);

        let labels: Vec<_> = Action::ALL.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("  What next?")
            .items(&labels)
            .default(0)
            .interact()?;
        let action = Action::ALL[choice];

        if action.needs_event() && view.store().is_empty() {
            println!("   {}", "No events yet".dimmed());
            continue;
        }

        let result = match action {
            Action::Add => add_event(&mut view),
            Action::QuickCreate => quick_create(&mut view),
            Action::Edit => edit_event(&mut view),
            Action::Move => move_event(&mut view),
            Action::Resize => resize_event(&mut view),
            Action::Delete => delete_event(&mut view),
            Action::Previous => {
                view.prev_month();
                Ok(())
            }
            Action::Next => {
                view.next_month();
                Ok(())
            }
            Action::Background => pick_background(&mut view),
            Action::ToggleToday => {
                view.settings_mut().toggle_today();
                Ok(())
            }
            Action::ToggleShadow => {
                view.settings_mut().toggle_shadow();
                Ok(())
            }
            Action::Export => export(&mut view, &exporter, &export_dir).await,
            Action::Quit => return Ok(()),
        };

        if let Err(e) = result {
            println!("   {}", format!("{e:#}").red());
        }
    }
}

fn print_month(view: &mut CalendarView) {
    let layout = view.layout().clone();
    println!();
    println!("{}", layout.render(view.store().events(), view.settings()));
    println!();
}

fn add_event(view: &mut CalendarView) -> Result<()> {
    let title: String = Prompt::new()
        .with_prompt("  Title")
        .allow_empty(true)
        .interact_text()?;
    let start = prompt_date("  Start (YYYY-MM-DD)", None)?;
    let end = prompt_date("  End (YYYY-MM-DD)", Some(start))?;
    if end < start {
        anyhow::bail!("End {} is before start {}", end, start);
    }

    let color: String = Prompt::new()
        .with_prompt("  Color (#RRGGBB, skip)")
        .default(String::new())
        .show_default(false)
        .validate_with(|c: &String| -> Result<(), String> {
            if c.is_empty() {
                return Ok(());
            }
            parse_hex(c).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;
    let color = if color.is_empty() { None } else { Some(color) };

    let event = Event::new(title, start, end, color);
    println!("   {}", format!("Added: {}", event).green());
    view.store_mut().add(event);
    Ok(())
}

fn quick_create(view: &mut CalendarView) -> Result<()> {
    let date = prompt_date("  Day (YYYY-MM-DD)", None)?;

    view.handle(Input::ClickCell(date));
    if !matches!(view.controller().state(), Interaction::QuickCreating { .. }) {
        anyhow::bail!("{} is not an empty day on this month's grid", date);
    }

    let title: String = Prompt::new()
        .with_prompt("  Title")
        .allow_empty(true)
        .interact_text()?;
    view.handle(Input::Text(title));
    view.handle(Input::Key(Key::Enter));
    Ok(())
}

fn edit_event(view: &mut CalendarView) -> Result<()> {
    let Some(id) = pick_event(view, "  Edit which event?")? else {
        return Ok(());
    };
    let event = view.store().get(&id).cloned().context("Event disappeared")?;

    let title: String = Prompt::new()
        .with_prompt("  Title")
        .default(event.title.clone())
        .allow_empty(true)
        .interact_text()?;
    let start = prompt_date("  Start (YYYY-MM-DD)", Some(event.start_date))?;
    let end = prompt_date("  End (YYYY-MM-DD)", Some(event.end_date.max(start)))?;

    let colors = view.settings().palette().colors;
    let items: Vec<String> = colors.iter().map(|c| swatch(c)).collect();
    let choice = Select::new()
        .with_prompt("  Color")
        .items(&items)
        .default(color_choice(&colors, event.color.as_deref()))
        .interact()?;

    let patch = edit_patch(&event, title, start, end, colors.get(choice).cloned())?;
    if patch == EventPatch::default() {
        println!("   {}", "Nothing changed".dimmed());
        return Ok(());
    }
    view.store_mut().update(&id, patch);
    println!("   {}", format!("Updated: {}", view.store().get(&id).map(|e| e.to_string()).unwrap_or_default()).green());
    Ok(())
}

/// Palette entry preselected for an event: its own color when the palette has
/// it, otherwise the first entry.
fn color_choice(colors: &[String], current: Option<&str>) -> usize {
    current
        .and_then(|current| colors.iter().position(|c| c.eq_ignore_ascii_case(current)))
        .unwrap_or(0)
}

/// Patch holding only the fields that differ from `event`.
fn edit_patch(
    event: &Event,
    title: String,
    start: NaiveDate,
    end: NaiveDate,
    color: Option<String>,
) -> Result<EventPatch> {
    if end < start {
        anyhow::bail!("End {} is before start {}", end, start);
    }

    let mut patch = EventPatch::default();
    if title != event.title {
        patch = patch.title(title);
    }
    if (start, end) != (event.start_date, event.end_date) {
        patch = patch.dates(start, end);
    }
    let unchanged = match (&color, &event.color) {
        (Some(new), Some(old)) => new.eq_ignore_ascii_case(old),
        (None, _) => true,
        (Some(_), None) => false,
    };
    if !unchanged {
        patch = patch.color(color);
    }
    Ok(patch)
}

fn swatch(color: &str) -> String {
    match parse_hex(color) {
        Ok([r, g, b]) => format!("{} {}", "■".truecolor(r, g, b), color),
        Err(_) => color.to_string(),
    }
}

fn move_event(view: &mut CalendarView) -> Result<()> {
    let Some(id) = pick_event(view, "  Move which event?")? else {
        return Ok(());
    };
    let target = prompt_date("  New start (YYYY-MM-DD)", None)?;

    view.handle(Input::GrabEvent(id));
    view.handle(Input::Hover(Some(target)));
    if view.handle(Input::Release).is_none() {
        anyhow::bail!("Can't drop on {}: the day is full or outside this month's grid", target);
    }
    Ok(())
}

fn resize_event(view: &mut CalendarView) -> Result<()> {
    let Some(id) = pick_event(view, "  Resize which event?")? else {
        return Ok(());
    };
    let start_date = view
        .store()
        .get(&id)
        .map(|e| e.start_date)
        .context("Event disappeared")?;
    let end = prompt_date("  New end (YYYY-MM-DD)", None)?;

    view.handle(Input::GrabResizeHandle {
        event_id: id,
        start_date,
    });
    view.handle(Input::Hover(Some(end)));
    if view.handle(Input::Release).is_none() {
        anyhow::bail!("{} is outside this month's grid", end);
    }
    Ok(())
}

fn delete_event(view: &mut CalendarView) -> Result<()> {
    let Some(id) = pick_event(view, "  Delete which event?")? else {
        return Ok(());
    };
    let title = view.store().get(&id).map(|e| e.to_string()).unwrap_or_default();

    let confirmed = Confirm::new()
        .with_prompt(format!("Delete \"{}\"?", title))
        .default(false)
        .interact()?;
    if confirmed {
        view.store_mut().delete(&id);
        println!("   {}", format!("Deleted: {}", title).red());
    }
    Ok(())
}

fn pick_background(view: &mut CalendarView) -> Result<()> {
    let current = view.settings().background();
    let items: Vec<_> = Background::ALL.iter().map(|b| b.render()).collect();
    let default = Background::ALL.iter().position(|b| *b == current).unwrap_or(0);

    let choice = Select::new()
        .with_prompt("  Background")
        .items(&items)
        .default(default)
        .interact()?;
    view.settings_mut().apply_background(Background::ALL[choice])?;
    Ok(())
}

async fn export(view: &mut CalendarView, exporter: &Exporter, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;
    let mut surface = Surface::new(view.scene()?, SESSION_VIEWPORT);
    let path = exporter.download(&mut surface, view.month(), dir).await?;
    println!("   {}", format!("Saved {}", path.display()).green());
    Ok(())
}

/// Choose an event; `None` when the user backs out.
fn pick_event(view: &CalendarView, prompt: &str) -> Result<Option<EventId>> {
    let events = view.store().events();
    let mut items: Vec<String> = events.iter().map(|e| e.render()).collect();
    items.push("Cancel".dimmed().to_string());

    let choice = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;
    Ok(events.get(choice).map(|e| e.id.clone()))
}

fn prompt_date(prompt: &str, default: Option<NaiveDate>) -> Result<NaiveDate> {
    let mut input = Prompt::<String>::new().with_prompt(prompt).validate_with(|s: &String| -> Result<(), String> {
        parse_date(s).map(|_| ()).map_err(|e| e.to_string())
    });
    if let Some(default) = default {
        input = input.default(default.format("%Y-%m-%d").to_string());
    }
    let text = input.interact_text()?;
    Ok(parse_date(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_a_label() {
        let labels: std::collections::HashSet<_> = Action::ALL.iter().map(|a| a.label()).collect();
        assert_eq!(labels.len(), Action::ALL.len());
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn offsite() -> Event {
        Event::new("Offsite", date(2024, 6, 10), date(2024, 6, 12), None)
    }

    #[test]
    fn test_edit_patch_keeps_unchanged_fields_out() {
        let event = offsite();
        let patch = edit_patch(&event, "Offsite".into(), event.start_date, event.end_date, None).unwrap();
        assert_eq!(patch, EventPatch::default());
    }

    #[test]
    fn test_edit_patch_applies_new_values() {
        let mut store = calshot_core::EventStore::new();
        let id = store.add(offsite());
        let event = store.get(&id).unwrap().clone();

        let patch = edit_patch(
            &event,
            "Team offsite".into(),
            date(2024, 6, 11),
            date(2024, 6, 14),
            Some("#10B981".into()),
        )
        .unwrap();
        store.update(&id, patch);

        let edited = store.get(&id).unwrap();
        assert_eq!(edited.title, "Team offsite");
        assert_eq!((edited.start_date, edited.end_date), (date(2024, 6, 11), date(2024, 6, 14)));
        assert_eq!(edited.color.as_deref(), Some("#10B981"));
    }

    #[test]
    fn test_edit_patch_rejects_end_before_start() {
        let event = offsite();
        let err = edit_patch(&event, "Offsite".into(), date(2024, 6, 12), date(2024, 6, 10), None).unwrap_err();
        assert!(err.to_string().contains("before start"));
    }

    #[test]
    fn test_color_choice_defaults_to_first_palette_entry() {
        let colors = calshot_core::CalendarSettings::default().palette().colors;
        assert_eq!(color_choice(&colors, None), 0);
        assert_eq!(color_choice(&colors, Some("#10b981")), 2);
        assert_eq!(color_choice(&colors, Some("#123456")), 0);
    }

    #[test]
    fn test_event_actions() {
        assert!(Action::Edit.needs_event());
        assert!(Action::Delete.needs_event());
        assert!(!Action::QuickCreate.needs_event());
        assert_eq!(Action::ALL.last(), Some(&Action::Quit));
    }
}
