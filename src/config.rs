use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "triangles.toml";
pub const FONT_ENV: &str = "TRIANGLES_FONT";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub window: WindowConfig,
    pub timing: TimingConfig,
    pub font: FontConfig,
    pub triangle: TriangleConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Right Angle Triangle".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub frames_per_second: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30,
        }
    }
}

/// Label font. Without a `path` the font bundled with egui is used.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    pub path: Option<PathBuf>,
    pub size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            size: 16.0,
        }
    }
}

/// Startup measurements. Exactly two should be set; a `[triangle]` table
/// replaces the default pair entirely.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TriangleConfig {
    pub opposite: Option<f64>,
    pub adjacent: Option<f64>,
    pub hypotenuse: Option<f64>,
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            opposite: Some(400.0),
            adjacent: Some(400.0),
            hypotenuse: None,
        }
    }
}

impl Settings {
    /// Reads `triangles.toml` next to the executable, then from the working
    /// directory, falling back to defaults when neither exists.
    pub fn load() -> Result<Self> {
        let exe_config = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)));

        let mut settings = match exe_config
            .into_iter()
            .chain(std::iter::once(PathBuf::from(CONFIG_FILE)))
            .find(|path| path.exists())
        {
            Some(path) => Self::from_file(&path)?,
            None => {
                log::info!("No {} found, using default settings", CONFIG_FILE);
                Self::default()
            }
        };

        if let Ok(font) = std::env::var(FONT_ENV) {
            settings.font.path = Some(PathBuf::from(font));
        }

        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.window.width, self.window.height)
    }
}
