//! User preferences: default resolution, A4 fitting and output format.
//!
//! Preferences are loaded once at startup and turned into an explicit
//! [`RenderOptions`] value; render calls never read them directly.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PhotonError, Result};
use crate::geometry::{self, DEFAULT_DPI};
use crate::renderer::RenderOptions;
use crate::surface::{Color, OutputFormat, DEFAULT_JPEG_QUALITY};

const APP_NAME: &str = "photonpdf";
const PREFS_FILENAME: &str = "prefs.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPreference {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    #[serde(default, rename = "forceA4")]
    pub force_a4: bool,

    #[serde(default)]
    pub format: FormatPreference,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,

    #[serde(default)]
    pub background: Color,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_jpeg_quality() -> f32 {
    DEFAULT_JPEG_QUALITY
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            force_a4: false,
            format: FormatPreference::Png,
            jpeg_quality: default_jpeg_quality(),
            background: Color::WHITE,
            output_dir: None,
        }
    }
}

/// `<config dir>/photonpdf/prefs.json`, if the platform has a config dir.
pub fn default_prefs_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(PREFS_FILENAME))
}

impl Preferences {
    /// Load from the default location. Missing or unreadable files give the
    /// defaults.
    pub fn load() -> Self {
        match default_prefs_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("Could not determine config directory, using default preferences");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No preferences at {:?} ({}), using defaults", path, e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Preferences>(&content) {
            Ok(prefs) => {
                debug!("Loaded preferences from {:?}", path);
                prefs.sanitized()
            }
            Err(e) => {
                warn!("Ignoring corrupt preferences at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = default_prefs_path()
            .ok_or_else(|| PhotonError::Config("no config directory on this platform".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PhotonError::Config(format!("create {parent:?}: {e}")))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PhotonError::Config(e.to_string()))?;
        fs::write(path, json).map_err(|e| PhotonError::Config(format!("write {path:?}: {e}")))?;
        debug!("Saved preferences to {:?}", path);
        Ok(())
    }

    /// Bring out-of-range values back into range.
    pub fn sanitized(self) -> Self {
        let jpeg_quality = if self.jpeg_quality.is_finite() {
            self.jpeg_quality.clamp(0.0, 1.0)
        } else {
            DEFAULT_JPEG_QUALITY
        };
        Self {
            dpi: geometry::clamp_dpi(self.dpi),
            jpeg_quality,
            ..self
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            FormatPreference::Png => OutputFormat::Png,
            FormatPreference::Jpg => OutputFormat::Jpeg {
                quality: self.jpeg_quality,
            },
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::new(self.dpi)
            .fit_to_a4(self.force_a4)
            .with_background(self.background)
            .with_format(self.output_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.dpi, 120);
        assert!(!prefs.force_a4);
        let options = prefs.render_options();
        assert_eq!(options.dpi, 120);
        assert_eq!(options.format, OutputFormat::Png);
        assert_eq!(options.background, Color::WHITE);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let prefs = Preferences::load_from(&tmp.path().join("nope.json"));
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PREFS_FILENAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Preferences::load_from(&path), Preferences::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PREFS_FILENAME);
        fs::write(&path, r#"{"dpi": 300, "forceA4": true}"#).unwrap();

        let prefs = Preferences::load_from(&path);
        assert_eq!(prefs.dpi, 300);
        assert!(prefs.force_a4);
        assert_eq!(prefs.format, FormatPreference::Png);
        assert_eq!(prefs.jpeg_quality, DEFAULT_JPEG_QUALITY);
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(PREFS_FILENAME);
        let prefs = Preferences {
            dpi: 200,
            force_a4: true,
            format: FormatPreference::Jpg,
            jpeg_quality: 0.8,
            background: Color::rgb(0xee, 0xee, 0xee),
            output_dir: Some(PathBuf::from("/tmp/exports")),
        };
        prefs.save_to(&path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"forceA4\": true"));
        assert!(json.contains("\"background\": \"#eeeeee\""));
        assert_eq!(Preferences::load_from(&path), prefs);
    }

    #[test]
    fn test_sanitizes_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PREFS_FILENAME);
        fs::write(&path, r#"{"dpi": 10, "jpeg_quality": 4.0, "format": "jpeg"}"#).unwrap();

        let prefs = Preferences::load_from(&path);
        assert_eq!(prefs.dpi, geometry::MIN_DPI);
        assert_eq!(prefs.jpeg_quality, 1.0);
        assert_eq!(prefs.output_format(), OutputFormat::Jpeg { quality: 1.0 });
    }
}
