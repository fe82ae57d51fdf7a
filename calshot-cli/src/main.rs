mod clipboard;
mod commands;
mod render;
mod seed;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calshot_core::{Background, CalendarSettings, CalendarView, CalshotConfig, EventStore, Month};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calshot")]
#[command(about = "Lay out, edit and export month-view calendars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the month grid to the terminal
    Show {
        #[command(flatten)]
        calendar: CalendarArgs,
    },
    /// Export the month as a PNG
    Export {
        #[command(flatten)]
        calendar: CalendarArgs,

        /// Directory to save into (defaults to export_dir from the config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write the PNG bytes to stdout instead of a file (pipe into wl-copy, pbcopy, ...)
        #[arg(long)]
        copy: bool,

        /// Viewport width the calendar is shown at; never changes the image size
        #[arg(long, default_value_t = 1280)]
        viewport: u32,
    },
    /// Edit the month interactively
    Session {
        #[command(flatten)]
        calendar: CalendarArgs,
    },
}

/// Options shared by every command.
#[derive(Args)]
struct CalendarArgs {
    /// Month to show (YYYY-MM, defaults to the current month)
    month: Option<String>,

    /// TOML file with [[events]] to load
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Background preset (transparent, blue, purple, red, green, orange)
    #[arg(short, long)]
    background: Option<Background>,

    /// Don't highlight today's date
    #[arg(long)]
    no_today: bool,

    /// Don't draw the card shadow
    #[arg(long)]
    no_shadow: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("calshot=warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CalshotConfig::load()?;

    match cli.command {
        Commands::Show { calendar } => {
            let view = open_view(&calendar, &config)?;
            commands::show::run(view)
        }
        Commands::Export {
            calendar,
            out,
            copy,
            viewport,
        } => {
            let view = open_view(&calendar, &config)?;
            let dir = out.unwrap_or_else(|| config.export_dir());
            commands::export::run(view, dir, copy, viewport).await
        }
        Commands::Session { calendar } => {
            let view = open_view(&calendar, &config)?;
            commands::session::run(view, config.export_dir()).await
        }
    }
}

/// Build the calendar from config, flags and the optional events file.
fn open_view(args: &CalendarArgs, config: &CalshotConfig) -> Result<CalendarView> {
    let today = Local::now().date_naive();

    let month = match &args.month {
        Some(m) => Month::parse(m)?,
        None => Month::containing(today),
    };

    let events = match &args.events {
        Some(path) => seed::load(path).with_context(|| format!("Could not load events from {}", path.display()))?,
        None => Vec::new(),
    };

    let settings = calendar_settings(args, config)?;
    debug!(%month, events = events.len(), background = settings.background().id(), "opening calendar");

    Ok(CalendarView::new(month, EventStore::with_events(events), settings, Some(today)))
}

/// Config values with command-line flags taking precedence.
fn calendar_settings(args: &CalendarArgs, config: &CalshotConfig) -> Result<CalendarSettings> {
    let mut settings = config.settings()?;
    if let Some(background) = args.background {
        settings.apply_background(background)?;
    }
    if args.no_today {
        settings.show_today = false;
    }
    if args.no_shadow {
        settings.show_shadow = false;
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(background: Option<Background>, no_today: bool) -> CalendarArgs {
        CalendarArgs {
            month: None,
            events: None,
            background,
            no_today,
            no_shadow: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = CalshotConfig {
            background: Background::Green,
            ..CalshotConfig::default()
        };

        let settings = calendar_settings(&args(Some(Background::Transparent), true), &config).unwrap();
        assert!(settings.is_transparent);
        assert!(!settings.show_today);
        assert!(settings.show_shadow);

        let settings = calendar_settings(&args(None, false), &config).unwrap();
        assert_eq!(settings.background(), Background::Green);
    }

    #[test]
    fn test_cli_parses_export() {
        let cli = Cli::try_parse_from(["calshot", "export", "2024-06", "--background", "purple", "--copy"]).unwrap();
        let Commands::Export { calendar, copy, viewport, .. } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(calendar.month.as_deref(), Some("2024-06"));
        assert_eq!(calendar.background, Some(Background::Purple));
        assert!(copy);
        assert_eq!(viewport, 1280);
    }
}
