//! User settings, persisted in the OS config directory.

use std::path::{Path, PathBuf};

use crate::model::WindowSpan;

/// Persisted view settings. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// How far ahead the timeline reaches.
    pub window_span: WindowSpan,
    /// Overrides where projects and todos are stored.
    pub data_dir: Option<PathBuf>,
}

impl AppSettings {
    /// Path of `settings.json`, or a local fallback when no config dir exists.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "StreamTimeline")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("settings.json"))
    }

    /// Unreadable or malformed settings load as defaults.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let settings = AppSettings {
            window_span: WindowSpan::TwelveWeeks,
            data_dir: Some(tmp.path().join("data")),
        };
        settings.save(&path).unwrap();
        assert_eq!(AppSettings::load(&path), settings);
    }

    #[test]
    fn malformed_settings_fall_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        assert_eq!(AppSettings::load(&path), AppSettings::default());
        std::fs::write(&path, r#"{ "window_span": "FortyWeeks" }"#).unwrap();
        assert_eq!(AppSettings::load(&path), AppSettings::default());
        std::fs::write(&path, r#"{ "window_span": "EightWeeks" }"#).unwrap();
        assert_eq!(AppSettings::load(&path).window_span, WindowSpan::EightWeeks);
    }
}
