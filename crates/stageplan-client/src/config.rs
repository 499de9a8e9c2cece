use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StageplanError};
use crate::timeline::{Resolution, ZoomLevel};

/// RGB color values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Theme color palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    /// Secondary text, axis labels and lane separators
    pub muted: Rgb,
    /// Confirmed edits
    pub success: Rgb,
    /// Edits waiting on the backend
    pub warning: Rgb,
    /// Failed commits and rollbacks
    pub error: Rgb,
    /// "Now" marker
    pub info: Rgb,
    /// Item bars
    pub bar: Rgb,
    /// Selected item
    pub selected: Rgb,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            muted: Rgb::new(140, 140, 140),
            success: Rgb::new(134, 239, 172),
            warning: Rgb::new(253, 224, 71),
            error: Rgb::new(252, 129, 129),
            info: Rgb::new(147, 197, 253),
            bar: Rgb::new(216, 180, 254),
            selected: Rgb::new(253, 224, 71),
        }
    }
}

impl ThemeColors {
    /// Catppuccin Macchiato theme
    pub fn catppuccin_macchiato() -> Self {
        Self {
            muted: Rgb::new(165, 173, 203),    // Subtext0
            success: Rgb::new(166, 218, 149),  // Green
            warning: Rgb::new(238, 212, 159),  // Yellow
            error: Rgb::new(237, 135, 150),    // Red
            info: Rgb::new(138, 173, 244),     // Blue
            bar: Rgb::new(198, 160, 246),      // Mauve
            selected: Rgb::new(245, 169, 127), // Peach
        }
    }

    /// Catppuccin Mocha theme
    pub fn catppuccin_mocha() -> Self {
        Self {
            muted: Rgb::new(166, 173, 200),    // Subtext0
            success: Rgb::new(166, 227, 161),  // Green
            warning: Rgb::new(249, 226, 175),  // Yellow
            error: Rgb::new(243, 139, 168),    // Red
            info: Rgb::new(137, 180, 250),     // Blue
            bar: Rgb::new(203, 166, 247),      // Mauve
            selected: Rgb::new(250, 179, 135), // Peach
        }
    }

    /// Catppuccin Latte theme (light theme)
    pub fn catppuccin_latte() -> Self {
        Self {
            muted: Rgb::new(108, 111, 133),   // Subtext0
            success: Rgb::new(64, 160, 43),   // Green
            warning: Rgb::new(223, 142, 29),  // Yellow
            error: Rgb::new(210, 15, 57),     // Red
            info: Rgb::new(30, 102, 245),     // Blue
            bar: Rgb::new(136, 57, 239),      // Mauve
            selected: Rgb::new(254, 100, 11), // Peach
        }
    }

    /// High contrast theme for accessibility
    pub fn high_contrast() -> Self {
        Self {
            muted: Rgb::new(200, 200, 200),
            success: Rgb::new(0, 255, 0),
            warning: Rgb::new(255, 255, 0),
            error: Rgb::new(255, 0, 0),
            info: Rgb::new(0, 255, 255),
            bar: Rgb::new(255, 0, 255),
            selected: Rgb::new(255, 255, 255),
        }
    }

    /// Get theme by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "default" => Some(Self::default()),
            "catppuccinmacchiato" => Some(Self::catppuccin_macchiato()),
            "catppuccinmocha" => Some(Self::catppuccin_mocha()),
            "catppuccinlatte" => Some(Self::catppuccin_latte()),
            "highcontrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }
}

/// Theme configuration - either a preset name or custom colors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeConfig {
    Preset(String),
    Custom(ThemeColors),
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig::Preset("default".to_string())
    }
}

impl ThemeConfig {
    /// Resolve to actual theme colors
    pub fn resolve(&self) -> ThemeColors {
        match self {
            ThemeConfig::Preset(name) => ThemeColors::from_name(name).unwrap_or_default(),
            ThemeConfig::Custom(colors) => colors.clone(),
        }
    }
}

/// Sync configuration for remote server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_server_url")]
    pub server_url: String,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_url: default_server_url(),
        }
    }
}

/// Initial timeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default)]
    pub zoom: ZoomLevel,

    /// Pixels represented by one terminal column
    #[serde(default = "default_cell_width_px")]
    pub cell_width_px: u16,

    /// Default range printed by `sp layout`
    #[serde(default = "default_span_days")]
    pub span_days: u32,
}

fn default_cell_width_px() -> u16 {
    10
}

fn default_span_days() -> u32 {
    14
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            zoom: ZoomLevel::default(),
            cell_width_px: default_cell_width_px(),
            span_days: default_span_days(),
        }
    }
}

/// Configuration settings for stageplan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_data_directory")]
    pub data_directory: String,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub timeline: TimelineConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_directory() -> String {
    "~".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            theme: ThemeConfig::default(),
            sync: SyncConfig::default(),
            timeline: TimelineConfig::default(),
            log_level: default_log_level(),
        }
    }
}

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| StageplanError::Config("could not find home directory".to_string()))
}

/// Expand a leading `~` to the home directory
pub(crate) fn expand_home(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix('~') {
        let rest = rest.trim_start_matches('/');
        let home = home_dir()?;
        return Ok(if rest.is_empty() { home } else { home.join(rest) });
    }
    Ok(PathBuf::from(path))
}

impl Config {
    /// Get the config file path (~/.stageplan.json)
    fn config_file_path() -> Result<PathBuf> {
        Ok(home_dir()?.join(".stageplan.json"))
    }

    /// Load configuration from `~/.stageplan.json`, creating it with
    /// defaults if missing.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            Config::default().save_to(&path)?;
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| StageplanError::Config(format!("{}: {e}", path.display())))?;

        if config.timeline.cell_width_px == 0 {
            return Err(StageplanError::Config(
                "timeline.cellWidthPx must be at least 1".to_string(),
            ));
        }

        if config.data_directory.starts_with('~') {
            config.data_directory = expand_home(&config.data_directory)?
                .to_string_lossy()
                .to_string();
        }

        Ok(config)
    }

    /// Load configuration, falling back to defaults with a warning on failure.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Warning: failed to load config: {err}, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "logLevel": "debug" }"#).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_directory, "~");
        assert_eq!(config.timeline.resolution, Resolution::Day);
        assert_eq!(config.timeline.zoom.factor(), 1.0);
        assert_eq!(config.timeline.cell_width_px, 10);
        assert!(!config.sync.enabled);
    }

    #[test]
    fn test_timeline_section_parses() {
        let json = r#"{
            "timeline": { "resolution": "week", "zoom": 2.0, "cellWidthPx": 8, "spanDays": 60 },
            "theme": "catppuccin-mocha"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeline.resolution, Resolution::Week);
        assert_eq!(config.timeline.zoom.factor(), 2.0);
        assert_eq!(config.timeline.span_days, 60);
        assert_eq!(config.theme.resolve(), ThemeColors::catppuccin_mocha());
    }

    #[test]
    fn test_custom_theme_colors() {
        let json = r#"{ "theme": {
            "muted": {"r": 1, "g": 2, "b": 3},
            "success": {"r": 0, "g": 0, "b": 0},
            "warning": {"r": 0, "g": 0, "b": 0},
            "error": {"r": 0, "g": 0, "b": 0},
            "info": {"r": 0, "g": 0, "b": 0},
            "bar": {"r": 0, "g": 0, "b": 0},
            "selected": {"r": 0, "g": 0, "b": 0}
        } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.theme.resolve().muted, Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let theme = ThemeConfig::Preset("solarized".into());
        assert_eq!(theme.resolve(), ThemeColors::default());
    }

    #[test]
    fn test_load_from_rejects_zero_cell_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "timeline": { "cellWidthPx": 0 } }"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(StageplanError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.data_directory = dir.path().to_string_lossy().to_string();
        config.sync.enabled = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.sync.enabled);
        assert_eq!(loaded.data_directory, config.data_directory);
    }
}
