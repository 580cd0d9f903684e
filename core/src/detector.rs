use serde::{Deserialize, Serialize};

use crate::error::{MorseError, Result};
use crate::frame::AudioFrame;
use crate::spectrum::SpectralAnalyzer;
use crate::{AMPLITUDE_THRESHOLD, FREQ_MAX_HZ, FREQ_MIN_HZ};

/// Inclusive frequency band a tone must fall into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyRange {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl FrequencyRange {
    pub fn new(min_hz: f32, max_hz: f32) -> Result<Self> {
        let range = Self { min_hz, max_hz };
        range.validate()?;
        Ok(range)
    }

    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.min_hz && freq <= self.max_hz
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_hz.is_finite() || !self.max_hz.is_finite() || self.min_hz < 0.0 {
            return Err(MorseError::InvalidConfig(format!(
                "frequency range {}..{} Hz is not a valid band",
                self.min_hz, self.max_hz
            )));
        }
        if self.min_hz > self.max_hz {
            return Err(MorseError::InvalidConfig(format!(
                "frequency range minimum {} Hz exceeds maximum {} Hz",
                self.min_hz, self.max_hz
            )));
        }
        Ok(())
    }
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self {
            min_hz: FREQ_MIN_HZ,
            max_hz: FREQ_MAX_HZ,
        }
    }
}

/// How frame energy is measured before the band check
///
/// `L2Norm` is the plain Euclidean norm of the samples and grows with frame
/// length; the default threshold is calibrated against it. `Rms` divides out
/// the length and is comparable across frame sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeMetric {
    #[default]
    L2Norm,
    Rms,
}

impl AmplitudeMetric {
    pub fn measure(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        match self {
            AmplitudeMetric::L2Norm => sum_sq.sqrt(),
            AmplitudeMetric::Rms => (sum_sq / samples.len() as f32).sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub amplitude_threshold: f32,
    pub amplitude_metric: AmplitudeMetric,
    pub freq_range: FrequencyRange,
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.amplitude_threshold.is_finite() || self.amplitude_threshold < 0.0 {
            return Err(MorseError::InvalidConfig(format!(
                "amplitude threshold {} must be a non-negative number",
                self.amplitude_threshold
            )));
        }
        self.freq_range.validate()
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            amplitude_threshold: AMPLITUDE_THRESHOLD,
            amplitude_metric: AmplitudeMetric::default(),
            freq_range: FrequencyRange::default(),
        }
    }
}

/// Per-frame detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneObservation {
    pub present: bool,
    pub timestamp: f64,
    pub amplitude: f32,
    /// `None` when the frame was too quiet to run the spectrum
    pub frequency: Option<f32>,
}

/// Decides whether a frame carries a tone in the configured band
pub struct SignalDetector {
    config: DetectorConfig,
    analyzer: SpectralAnalyzer,
}

impl SignalDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            analyzer: SpectralAnalyzer::new(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Measure the frame and stamp the result with `timestamp`
    pub fn observe(&mut self, frame: &AudioFrame, timestamp: f64) -> Result<ToneObservation> {
        if frame.is_empty() {
            return Err(MorseError::InvalidFrame("frame has no samples".into()));
        }

        let amplitude = self.config.amplitude_metric.measure(frame.samples());
        if amplitude <= self.config.amplitude_threshold {
            return Ok(ToneObservation {
                present: false,
                timestamp,
                amplitude,
                frequency: None,
            });
        }

        let freq = self.analyzer.dominant_frequency(frame)?;
        Ok(ToneObservation {
            present: self.config.freq_range.contains(freq),
            timestamp,
            amplitude,
            frequency: Some(freq),
        })
    }
}

/// One-shot tone check with the default L2 amplitude measure
pub fn tone_present(
    frame: &AudioFrame,
    amplitude_threshold: f32,
    freq_range: FrequencyRange,
) -> Result<bool> {
    frame.validate()?;
    let mut detector = SignalDetector::new(DetectorConfig {
        amplitude_threshold,
        amplitude_metric: AmplitudeMetric::L2Norm,
        freq_range,
    })?;
    Ok(detector.observe(frame, 0.0)?.present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32) -> AudioFrame {
        let samples = (0..2205)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / 44100.0).sin())
            .collect();
        AudioFrame::new(samples, 44100)
    }

    #[test]
    fn test_tone_in_band() {
        let frame = sine(430.0, 0.5);
        assert!(tone_present(&frame, 0.01, FrequencyRange::default()).unwrap());
    }

    #[test]
    fn test_tone_out_of_band() {
        let frame = sine(1000.0, 0.5);
        assert!(!tone_present(&frame, 0.01, FrequencyRange::default()).unwrap());
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        // 400 and 440 sit exactly on 20Hz bins
        let range = FrequencyRange::new(400.0, 440.0).unwrap();
        assert!(tone_present(&sine(400.0, 0.5), 0.01, range).unwrap());
        assert!(tone_present(&sine(440.0, 0.5), 0.01, range).unwrap());
        assert!(!tone_present(&sine(460.0, 0.5), 0.01, range).unwrap());
    }

    #[test]
    fn test_quiet_frame_skips_spectrum() {
        let mut detector = SignalDetector::new(DetectorConfig::default()).unwrap();
        let obs = detector.observe(&AudioFrame::new(vec![0.0; 2205], 44100), 1.5).unwrap();
        assert!(!obs.present);
        assert_eq!(obs.frequency, None);
        assert_eq!(obs.timestamp, 1.5);
    }

    #[test]
    fn test_amplitude_equal_to_threshold_is_absent() {
        // L2 norm of four samples of 0.5 is exactly 1.0
        let frame = AudioFrame::new(vec![0.5; 4], 44100);
        let range = FrequencyRange::new(0.0, 22050.0).unwrap();
        assert!(!tone_present(&frame, 1.0, range).unwrap());
        assert!(tone_present(&frame, 0.99, range).unwrap());
    }

    #[test]
    fn test_metrics() {
        let samples = vec![0.5; 4];
        assert!((AmplitudeMetric::L2Norm.measure(&samples) - 1.0).abs() < 1e-6);
        assert!((AmplitudeMetric::Rms.measure(&samples) - 0.5).abs() < 1e-6);
        assert_eq!(AmplitudeMetric::Rms.measure(&[]), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(FrequencyRange::new(450.0, 400.0).is_err());
        let config = DetectorConfig {
            amplitude_threshold: -1.0,
            ..Default::default()
        };
        assert!(SignalDetector::new(config).is_err());
    }

    #[test]
    fn test_malformed_quiet_frames_are_invalid() {
        let nan = AudioFrame::new(vec![0.0, f32::NAN, 0.0], 44100);
        let no_rate = AudioFrame::new(vec![0.0; 16], 0);
        for frame in [nan, no_rate] {
            assert!(matches!(
                tone_present(&frame, 0.01, FrequencyRange::default()),
                Err(MorseError::InvalidFrame(_))
            ));
        }
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = AudioFrame::new(vec![], 44100);
        assert!(matches!(
            tone_present(&frame, 0.01, FrequencyRange::default()),
            Err(MorseError::InvalidFrame(_))
        ));
    }
}
