//! Planner configuration, read from `config.json` in the OS config directory.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "TimelinePlanner";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Key the task list is stored under.
    pub storage_key: String,
    /// Quiet period before a search query is applied to the list.
    pub search_debounce_ms: u64,
    pub timeline: TimelineConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            storage_key: "timelinePlanner_tasks".into(),
            search_debounce_ms: 300,
            timeline: TimelineConfig::default(),
        }
    }
}

// ─── Timeline ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Pixels per hour at 100% zoom.
    pub base_pixels_per_hour: f32,
    pub default_zoom: u32,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub zoom_step: u32,
    /// Bars never render narrower than this, so short tasks stay clickable.
    pub min_bar_width: f32,
    /// Bars this far outside the visible range are still laid out.
    pub render_margin_hours: f64,
    pub row_height: f32,
    pub bar_height: f32,
    pub child_bar_height: f32,
    pub child_indent: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_pixels_per_hour: 100.0,
            default_zoom: 100,
            min_zoom: 50,
            max_zoom: 200,
            zoom_step: 25,
            min_bar_width: 80.0,
            render_margin_hours: 24.0,
            row_height: 60.0,
            bar_height: 45.0,
            child_bar_height: 35.0,
            child_indent: 30.0,
        }
    }
}

impl PlannerConfig {
    /// Load the config from the OS config directory, falling back to defaults.
    pub fn load() -> Self {
        let path = config_dir().join(CONFIG_FILE);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                info!("no config at {:?}, using defaults", path);
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => {
                info!("loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory the task store writes into.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlannerConfig::load_from(&dir.path().join("nope.json"));
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "timeline": { "max_zoom": 400 } }"#).unwrap();

        let config = PlannerConfig::load_from(&path);
        assert_eq!(config.timeline.max_zoom, 400);
        assert_eq!(config.timeline.min_zoom, 50);
        assert_eq!(config.storage_key, "timelinePlanner_tasks");
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(PlannerConfig::load_from(&path), PlannerConfig::default());
    }
}
