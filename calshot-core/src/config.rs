//! Global calshot configuration.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalShotError, CalShotResult};
use crate::settings::{Background, CalendarSettings};

static DEFAULT_EXPORT_DIR: &str = "~/Pictures";

fn default_export_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_DIR)
}

fn is_default_export_dir(p: &PathBuf) -> bool {
    *p == default_export_dir()
}

fn default_background() -> Background {
    Background::Transparent
}

fn default_true() -> bool {
    true
}

/// Global configuration at ~/.config/calshot/config.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalshotConfig {
    #[serde(default = "default_export_dir", skip_serializing_if = "is_default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default = "default_background")]
    pub background: Background,

    #[serde(default = "default_true")]
    pub show_today: bool,

    #[serde(default = "default_true")]
    pub show_shadow: bool,
}

impl Default for CalshotConfig {
    fn default() -> Self {
        CalshotConfig {
            export_dir: default_export_dir(),
            background: default_background(),
            show_today: true,
            show_shadow: true,
        }
    }
}

impl CalshotConfig {
    pub fn config_path() -> CalShotResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalShotError::Config("Could not determine config directory".into()))?
            .join("calshot");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/calshot/config.toml, creating a commented default on
    /// first run.
    pub fn load() -> CalShotResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path. Missing files yield the defaults.
    pub fn load_from(path: &Path) -> CalShotResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| CalShotError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalShotError::Config(e.to_string()))
    }

    /// Save to ~/.config/calshot/config.toml
    pub fn save(&self) -> CalShotResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> CalShotResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CalShotError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| CalShotError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Export directory with `~` expanded.
    pub fn export_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.export_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    /// Calendar settings seeded from this config.
    pub fn settings(&self) -> CalShotResult<CalendarSettings> {
        let mut settings = CalendarSettings::default().with_background(self.background)?;
        settings.show_today = self.show_today;
        settings.show_shadow = self.show_shadow;
        Ok(settings)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalShotResult<()> {
        let available: Vec<_> = Background::ALL.iter().map(|b| b.id()).collect();
        let contents = format!(
            "\
# calshot configuration

# Where exported images are saved:
# export_dir = \"{}\"

# Background behind the calendar card ({}):
# background = \"transparent\"

# Highlight today's date:
# show_today = true

# Drop shadow under the calendar card:
# show_shadow = true
",
            DEFAULT_EXPORT_DIR,
            available.join(", ")
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CalShotError::Config(format!("Could not create config directory: {e}")))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalShotError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
