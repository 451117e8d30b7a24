//! Recognizer tuning — thresholds, silence window, buffer size, tick period.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Note-ons softer than this are shown as ghost notes. Display only.
    pub velocity_threshold: u8,
    /// A run must be longer than this to be reported.
    pub run_length_threshold: u32,
    /// Ticks of total silence before in-progress runs are flushed.
    pub silence_window_ticks: u64,
    /// Number of note-on pitches kept in the history buffer.
    pub buffer_capacity: usize,
    /// Host display-loop period. Not used by the recognizer itself.
    pub tick_interval_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 5,
            run_length_threshold: 4,
            silence_window_ticks: 10,
            buffer_capacity: 1500,
            tick_interval_ms: 20,
        }
    }
}

impl GestureConfig {
    /// Load from a JSON file. Returns None if file is absent or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(c) => {
                info!("Loaded config from {:?}", path);
                Some(c)
            }
            Err(e) => {
                warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)?;
        info!("Config saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = GestureConfig::default();
        assert_eq!(c.velocity_threshold, 5);
        assert_eq!(c.run_length_threshold, 4);
        assert_eq!(c.silence_window_ticks, 10);
        assert_eq!(c.buffer_capacity, 1500);
        assert_eq!(c.tick_interval_ms, 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c: GestureConfig = serde_json::from_str(r#"{"run_length_threshold": 2}"#).unwrap();
        assert_eq!(c.run_length_threshold, 2);
        assert_eq!(c.silence_window_ticks, 10);
        assert_eq!(c.buffer_capacity, 1500);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("gesture-config-{}.json", std::process::id()));
        let c = GestureConfig { silence_window_ticks: 25, ..GestureConfig::default() };
        c.save(&path).unwrap();
        let loaded = GestureConfig::load(&path).unwrap();
        assert_eq!(loaded, c);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(GestureConfig::load(Path::new("/nonexistent/gesture.json")).is_none());
    }
}
