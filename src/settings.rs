// Settings - user defaults for new timelines, stored as RON

use std::path::{Path, PathBuf};

use ron::{from_str as ron_from_str, ser::PrettyConfig};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::timeline::TimelineKind;

const SETTINGS_DIR: &str = "timeline_annotations";
const SETTINGS_FILE: &str = "settings.ron";

/// Defaults applied when a timeline is created without explicit options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub marker_height: u32,
    pub hierarchy_height: u32,
    pub beat_height: u32,
    pub harmony_height: u32,
    pub pdf_height: u32,
    pub score_height: u32,
    pub slider_height: u32,
    /// Beats per measure cycle for new beat timelines
    pub default_beat_pattern: Vec<usize>,
    /// Show every n-th measure number on beat timelines
    pub measure_number_display_period: u32,
    pub default_harmony_levels: u32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            marker_height: 30,
            hierarchy_height: 50,
            beat_height: 30,
            harmony_height: 40,
            pdf_height: 30,
            score_height: 100,
            slider_height: 16,
            default_beat_pattern: vec![4],
            measure_number_display_period: 1,
            default_harmony_levels: 1,
        }
    }
}

impl TimelineSettings {
    pub fn default_height(&self, kind: TimelineKind) -> u32 {
        match kind {
            TimelineKind::Marker => self.marker_height,
            TimelineKind::Hierarchy => self.hierarchy_height,
            TimelineKind::Beat => self.beat_height,
            TimelineKind::Harmony => self.harmony_height,
            TimelineKind::Pdf => self.pdf_height,
            TimelineKind::Score => self.score_height,
            TimelineKind::Slider => self.slider_height,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.default_beat_pattern.is_empty() || self.default_beat_pattern.contains(&0) {
            return Err(SettingsError::Invalid(format!(
                "default_beat_pattern must hold positive counts, got {:?}",
                self.default_beat_pattern
            )));
        }
        if self.measure_number_display_period == 0 {
            return Err(SettingsError::Invalid(
                "measure_number_display_period must be at least 1".to_string(),
            ));
        }
        if self.default_harmony_levels == 0 {
            return Err(SettingsError::Invalid(
                "default_harmony_levels must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_ron_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron_from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Write the settings, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Load from `path`, falling back to defaults if it is missing or broken
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings, cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// `<config dir>/timeline_annotations/settings.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(SETTINGS_FILE);

        let settings = TimelineSettings {
            default_beat_pattern: vec![3, 3, 2],
            measure_number_display_period: 4,
            ..TimelineSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = TimelineSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.default_height(TimelineKind::Score), 100);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = TimelineSettings::from_ron_str("(beat_height: 44)").unwrap();
        assert_eq!(settings.beat_height, 44);
        assert_eq!(settings.default_beat_pattern, vec![4]);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            TimelineSettings::from_ron_str("(default_beat_pattern: [])"),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            TimelineSettings::from_ron_str("(beat_height: \"tall\")"),
            Err(SettingsError::Ron(_))
        ));
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let settings = TimelineSettings::load_or_default(temp_dir.path().join("missing.ron"));
        assert_eq!(settings, TimelineSettings::default());
    }
}
