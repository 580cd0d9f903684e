use serde::{Deserialize, Serialize};
use std::path::Path;

use morsewave_core::{DecoderConfig, KeyerConfig, FRAME_DURATION_MS, SAMPLE_RATE};

/// Settings file shape; every field is optional and falls back to the defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub frame_ms: u32,
    pub decoder: DecoderConfig,
    pub keyer: KeyerConfig,
    pub capture: CaptureSettings,
}

/// Input device used by the live commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    /// Device name; the host default when unset
    pub device: Option<String>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            device: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_ms: FRAME_DURATION_MS,
            decoder: DecoderConfig::default(),
            keyer: KeyerConfig::default(),
            capture: CaptureSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let settings: Settings = serde_json::from_str(&text)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "frame_ms": 20, "decoder": { "thresholds": { "dot": 0.1 } } }"#,
        )
        .unwrap();
        assert_eq!(settings.frame_ms, 20);
        assert_eq!(settings.decoder.thresholds.dot, 0.1);
        assert_eq!(settings.decoder.thresholds.dash, 0.5);
        assert_eq!(settings.keyer, KeyerConfig::default());
        assert_eq!(settings.capture, CaptureSettings::default());
    }

    #[test]
    fn test_capture_settings_independent_of_keyer() {
        let settings: Settings = serde_json::from_str(
            r#"{ "keyer": { "sample_rate": 8000 }, "capture": { "sample_rate": 48000, "device": "USB Audio" } }"#,
        )
        .unwrap();
        assert_eq!(settings.keyer.sample_rate, 8000);
        assert_eq!(settings.capture.sample_rate, 48000);
        assert_eq!(settings.capture.device.as_deref(), Some("USB Audio"));
    }

    #[test]
    fn test_timestamp_source_names() {
        let settings: Settings =
            serde_json::from_str(r#"{ "decoder": { "timestamp_source": "wall_clock" } }"#).unwrap();
        assert_eq!(
            settings.decoder.timestamp_source,
            morsewave_core::TimestampSource::WallClock
        );
    }
}
