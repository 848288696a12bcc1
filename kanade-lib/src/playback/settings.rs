//! Output configuration.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PERIOD_FRAMES, DEFAULT_QUEUE_PERIODS};

/// How periods reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One render thread mixes every track into a single device stream.
    Mixed,
    /// One device voice per track; the device performs the additive sum.
    PerVoice,
}

/// Tunables for the device output layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Frames per period handed to the device.
    pub period_frames: usize,
    /// Periods queued ahead of playback before the render thread idles.
    pub queue_periods: usize,
    pub mode: OutputMode,
}

impl Default for OutputSettings {
    fn default() -> OutputSettings {
        OutputSettings {
            period_frames: DEFAULT_PERIOD_FRAMES,
            queue_periods: DEFAULT_QUEUE_PERIODS,
            mode: OutputMode::Mixed,
        }
    }
}

impl OutputSettings {
    /// Clamp unusable values back to workable ones.
    pub fn sanitized(mut self) -> OutputSettings {
        if self.period_frames == 0 {
            self.period_frames = DEFAULT_PERIOD_FRAMES;
        }
        self.queue_periods = self.queue_periods.max(1);
        self
    }

    /// Load settings from a JSON file.
    ///
    /// Missing fields fall back to their defaults; a missing or invalid
    /// file falls back entirely, with a warning, so a bad config never
    /// keeps the host from booting.
    pub fn from_json_file(path: &Path) -> OutputSettings {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!("could not read {}: {}", path.display(), err);
                return OutputSettings::default();
            }
        };
        match serde_json::from_str::<OutputSettings>(&text) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!("invalid settings in {}: {}", path.display(), err);
                OutputSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: OutputSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, OutputSettings::default());

        let settings: OutputSettings =
            serde_json::from_str(r#"{ "period_frames": 4410 }"#).unwrap();
        assert_eq!(settings.period_frames, 4410);
        assert_eq!(settings.queue_periods, DEFAULT_QUEUE_PERIODS);
        assert_eq!(settings.mode, OutputMode::Mixed);
    }

    #[test]
    fn mode_names_are_snake_case() {
        let settings: OutputSettings =
            serde_json::from_str(r#"{ "mode": "per_voice" }"#).unwrap();
        assert_eq!(settings.mode, OutputMode::PerVoice);

        let text = serde_json::to_string(&OutputSettings::default()).unwrap();
        assert!(text.contains(r#""mode":"mixed""#));
    }

    #[test]
    fn sanitize_rejects_zero_sizes() {
        let settings = OutputSettings {
            period_frames: 0,
            queue_periods: 0,
            mode: OutputMode::Mixed,
        }
        .sanitized();
        assert_eq!(settings.period_frames, DEFAULT_PERIOD_FRAMES);
        assert_eq!(settings.queue_periods, 1);
    }

    #[test]
    fn unreadable_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(OutputSettings::from_json_file(&missing), OutputSettings::default());

        let garbled = dir.path().join("garbled.json");
        fs::write(&garbled, "{ not json").unwrap();
        assert_eq!(OutputSettings::from_json_file(&garbled), OutputSettings::default());
    }

    #[test]
    fn valid_files_parse_and_sanitize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(
            &path,
            r#"{ "period_frames": 5512, "queue_periods": 0, "mode": "per_voice" }"#,
        )
        .unwrap();

        let settings = OutputSettings::from_json_file(&path);
        assert_eq!(settings.period_frames, 5512);
        assert_eq!(settings.queue_periods, 1);
        assert_eq!(settings.mode, OutputMode::PerVoice);
    }
}
