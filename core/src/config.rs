//! # Session Settings
//!
//! Presentation settings the host passes into the core: display locale,
//! colour theme, overlay layout, export parameters and logging. The core
//! never reads browser storage or environment state for these; the host owns
//! the values and may persist them as TOML with [`Settings::to_toml`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::export::ExportConfig;
use crate::overlay::OverlayConfig;

/// Display language of the host UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum Locale {
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::ZhTw => "zh-TW",
            Locale::EnUs => "en-US",
        }
    }

    /// Map a BCP 47 language tag to a supported locale. Any Chinese variant
    /// maps to `zh-TW`, everything else to `en-US`.
    pub fn from_language_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("zh") {
            Locale::ZhTw
        } else {
            Locale::EnUs
        }
    }

    /// A saved preference wins over the browser language.
    pub fn resolve(saved: Option<&str>, browser_language: &str) -> Self {
        match saved {
            Some("zh-TW") => Locale::ZhTw,
            Some("en-US") => Locale::EnUs,
            _ => Self::from_language_tag(browser_language),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// A saved preference wins over the system colour scheme.
    pub fn resolve(saved: Option<&str>, system_prefers_dark: bool) -> Self {
        match saved {
            Some(name) => {
                if name == "dark" {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            }
            None if system_prefers_dark => Theme::Dark,
            None => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `diveoverlay_core=debug,warn`
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub locale: Locale,
    pub theme: Theme,
    pub overlay: OverlayConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Load settings from a TOML file.
    /// Falls back to defaults if the file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(settings) => {
                    info!(path = %path.display(), "loaded settings");
                    settings
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                info!(path = %path.display(), error = %e, "no settings file, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        fs::write(path.as_ref(), contents).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayField, OverlayPosition};

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.locale, Locale::EnUs);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.export.frame_rate, 30);
        assert!(settings.overlay.is_enabled(OverlayField::Depth));
    }

    #[test]
    fn test_locale_resolution() {
        assert_eq!(Locale::from_language_tag("zh-CN"), Locale::ZhTw);
        assert_eq!(Locale::from_language_tag("zh"), Locale::ZhTw);
        assert_eq!(Locale::from_language_tag("fr-FR"), Locale::EnUs);
        assert_eq!(Locale::resolve(Some("en-US"), "zh-TW"), Locale::EnUs);
        assert_eq!(Locale::resolve(None, "zh-HK"), Locale::ZhTw);
        assert_eq!(Locale::resolve(Some("de-DE"), "en-GB"), Locale::EnUs);
        assert_eq!(Locale::ZhTw.tag(), "zh-TW");
    }

    #[test]
    fn test_theme_resolution() {
        assert_eq!(Theme::resolve(Some("dark"), false), Theme::Dark);
        assert_eq!(Theme::resolve(Some("light"), true), Theme::Light);
        assert_eq!(Theme::resolve(None, true), Theme::Dark);
        assert_eq!(Theme::resolve(None, false), Theme::Light);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().name(), "dark");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut settings = Settings {
            locale: Locale::ZhTw,
            theme: Theme::Dark,
            ..Settings::default()
        };
        settings.overlay.toggle_field(OverlayField::AscentRate);
        settings.export.frame_rate = 60;

        let toml_str = settings.to_toml().unwrap();
        let parsed = Settings::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = Settings::from_toml_str(
            r#"
locale = "zh-TW"

[export]
resolution = "1280x720"
frame_rate = 24
bitrate = "2500k"
overlay_position = "top-right"
overlay_opacity = 0.5
"#,
        )
        .unwrap();

        assert_eq!(parsed.locale, Locale::ZhTw);
        assert_eq!(parsed.theme, Theme::Light);
        assert_eq!(parsed.export.dimensions().unwrap(), (1280, 720));
        assert_eq!(parsed.export.overlay_position, OverlayPosition::TopRight);
        assert_eq!(parsed.overlay, OverlayConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Settings::from_toml_str("locale = 42").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let settings = Settings::load_from_path("/nonexistent/path/settings.toml");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let settings = Settings {
            theme: Theme::Dark,
            ..Settings::default()
        };

        settings.save_to_path(&path).unwrap();
        assert_eq!(Settings::load_from_path(&path), settings);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "this is not toml [").unwrap();
        assert_eq!(Settings::load_from_path(&path), Settings::default());
    }
}
