use log::{debug, error, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};

use crate::i18n::Language;

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "manga-reader";

/// Reading mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// One page at a time with previous/next navigation
    #[default]
    Single,
    /// Every page stacked in one scrolling column
    Vertical,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Single => "single",
            ViewMode::Vertical => "vertical",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(ViewMode::Single),
            "vertical" => Ok(ViewMode::Vertical),
            other => Err(format!("unknown reading mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default, deserialize_with = "lenient")]
    pub theme: Theme,

    #[serde(default, deserialize_with = "lenient")]
    pub language: Language,

    #[serde(default, deserialize_with = "lenient")]
    pub mode: ViewMode,

    /// Gaps and page tags between pages in vertical mode
    #[serde(default = "default_true")]
    pub show_vertical_spacing: bool,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

/// Unknown values fall back to the field's default instead of failing the file.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|_| {
        warn!("Ignoring unknown settings value '{raw}'");
        T::default()
    }))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: Theme::default(),
            language: Language::default(),
            mode: ViewMode::default(),
            show_vertical_spacing: true,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Loads the global settings from the default location, creating the file
/// with defaults when it does not exist yet.
pub fn load_settings() {
    let Some(path) = default_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    if let Some(settings) = read_settings(path) {
        if let Ok(mut global) = SETTINGS.write() {
            *global = settings;
        }
    }
}

/// Parses a settings file, migrating and rewriting it when it is outdated.
/// Returns `None` (after logging) when the file cannot be read or parsed.
pub fn read_settings(path: &Path) -> Option<Settings> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            return None;
        }
    };

    match serde_yaml::from_str::<Settings>(&content) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");
            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, path);
            }
            Some(settings)
        }
        Err(e) => {
            error!("Failed to parse settings file {path:?}: {e}");
            None
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 files predate the spacing toggle; serde already filled in its default.
    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let Some(path) = default_config_path() else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match fs::write(path, generate_settings_yaml(settings)) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();
    content.push_str(SETTINGS_HEADER);
    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!("theme: {}\n", settings.theme.as_str()));
    content.push_str(&format!("language: {}\n", settings.language.code()));
    content.push_str(&format!("mode: {}\n", settings.mode.as_str()));
    content.push_str(&format!(
        "show_vertical_spacing: {}\n",
        settings.show_vertical_spacing
    ));
    content
}

const SETTINGS_HEADER: &str = r#"# manga-reader preferences
#   theme: dark | light
#   language: en | th
#   mode: single | vertical
#   show_vertical_spacing: gaps and page tags between pages in vertical mode

"#;

// Public API for accessing/modifying settings

pub fn get_theme() -> Theme {
    SETTINGS.read().map(|s| s.theme).unwrap_or_default()
}

pub fn set_theme(theme: Theme) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.theme = theme;
    }
    save_settings();
}

pub fn get_language() -> Language {
    SETTINGS.read().map(|s| s.language).unwrap_or_default()
}

pub fn set_language(language: Language) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.language = language;
    }
    save_settings();
}

pub fn get_mode() -> ViewMode {
    SETTINGS.read().map(|s| s.mode).unwrap_or_default()
}

pub fn set_mode(mode: ViewMode) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.mode = mode;
    }
    save_settings();
}

pub fn is_vertical_spacing_shown() -> bool {
    SETTINGS
        .read()
        .map(|s| s.show_vertical_spacing)
        .unwrap_or(true)
}

pub fn set_vertical_spacing_shown(shown: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.show_vertical_spacing = shown;
    }
    save_settings();
}
