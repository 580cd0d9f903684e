//! Dominant-frequency estimation over a single frame
//!
//! The frame is run through a real-input FFT and only the non-negative half of
//! the spectrum is inspected: bins `0 .. N/2`, i.e. the Nyquist bin of an
//! even-length frame is not considered. Frequency resolution is
//! `sample_rate / N`, so the frame length decides how close two tones may be
//! and still land in different bins.
//!
//! A silent frame has a flat (all zero) spectrum and reports 0 Hz. That value
//! carries no information; callers gate on amplitude before trusting it.

use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

use crate::error::{MorseError, Result};
use crate::frame::AudioFrame;

pub struct SpectralAnalyzer {
    planner: RealFftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
        }
    }

    /// Frequency in Hz of the strongest non-negative bin. Ties go to the lowest bin.
    pub fn dominant_frequency(&mut self, frame: &AudioFrame) -> Result<f32> {
        let samples = frame.samples();
        if samples.is_empty() {
            return Err(MorseError::InvalidFrame("cannot analyze an empty frame".into()));
        }
        if frame.sample_rate() == 0 {
            return Err(MorseError::InvalidFrame("sample rate is zero".into()));
        }

        let n = samples.len();
        let half = n / 2;
        if half == 0 {
            return Ok(0.0);
        }

        let spectrum = self.spectrum(samples)?;

        let mut best_bin = 0;
        let mut best_mag = f32::NEG_INFINITY;
        for (bin, value) in spectrum.iter().take(half).enumerate() {
            let mag = value.norm();
            if mag > best_mag {
                best_mag = mag;
                best_bin = bin;
            }
        }

        Ok(best_bin as f32 * frame.sample_rate() as f32 / n as f32)
    }

    /// Magnitude of each non-negative bin, `N/2` values
    pub fn magnitudes(&mut self, frame: &AudioFrame) -> Result<Vec<f32>> {
        if frame.is_empty() {
            return Err(MorseError::InvalidFrame("cannot analyze an empty frame".into()));
        }
        let half = frame.len() / 2;
        let spectrum = self.spectrum(frame.samples())?;
        Ok(spectrum.iter().take(half).map(|c| c.norm()).collect())
    }

    fn spectrum(&mut self, samples: &[f32]) -> Result<Vec<Complex<f32>>> {
        let r2c = self.planner.plan_fft_forward(samples.len());
        let mut input = samples.to_vec();
        let mut output = r2c.make_output_vec();
        r2c.process(&mut input, &mut output)
            .map_err(|e| MorseError::FftError(format!("forward FFT failed: {:?}", e)))?;
        Ok(output)
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Bin spacing in Hz for this frame's length and sample rate
pub fn resolution_hz(frame: &AudioFrame) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.sample_rate() as f32 / frame.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32, len: usize, sample_rate: u32) -> AudioFrame {
        let samples = (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        AudioFrame::new(samples, sample_rate)
    }

    #[test]
    fn test_detects_bin_centered_tone() {
        let mut analyzer = SpectralAnalyzer::new();
        // 2205 samples at 44.1kHz gives 20Hz bins, 440Hz sits on bin 22
        let frame = sine(440.0, 0.5, 2205, 44100);
        let freq = analyzer.dominant_frequency(&frame).unwrap();
        assert!((freq - 440.0).abs() < 1e-3, "got {}", freq);
    }

    #[test]
    fn test_off_bin_tone_lands_on_neighbour() {
        let mut analyzer = SpectralAnalyzer::new();
        let frame = sine(430.0, 0.5, 2205, 44100);
        let freq = analyzer.dominant_frequency(&frame).unwrap();
        assert!(freq == 420.0 || freq == 440.0, "got {}", freq);
    }

    #[test]
    fn test_silent_frame_reports_zero() {
        let mut analyzer = SpectralAnalyzer::new();
        let frame = AudioFrame::new(vec![0.0; 1024], 44100);
        assert_eq!(analyzer.dominant_frequency(&frame).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let mut analyzer = SpectralAnalyzer::new();
        let frame = AudioFrame::new(vec![], 44100);
        assert!(matches!(
            analyzer.dominant_frequency(&frame),
            Err(MorseError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_single_sample_frame() {
        let mut analyzer = SpectralAnalyzer::new();
        let frame = AudioFrame::new(vec![0.7], 44100);
        assert_eq!(analyzer.dominant_frequency(&frame).unwrap(), 0.0);
    }

    #[test]
    fn test_magnitudes_half_spectrum() {
        let mut analyzer = SpectralAnalyzer::new();
        let frame = sine(1000.0, 1.0, 1000, 8000);
        let mags = analyzer.magnitudes(&frame).unwrap();
        assert_eq!(mags.len(), 500);
        let peak = mags
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 125);
        assert_eq!(resolution_hz(&frame), 8.0);
    }
}
