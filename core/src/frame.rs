use crate::error::{MorseError, Result};
use crate::{FRAME_SAMPLES, SAMPLE_RATE};

/// A single-channel block of normalized samples as delivered by a capture source
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    sample_rate: u32,
    timestamp: Option<f64>,
}

impl AudioFrame {
    /// Frame without a capture timestamp; the engine stamps it on receipt
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            timestamp: None,
        }
    }

    /// Frame stamped by the capture source, `timestamp` in seconds
    pub fn with_timestamp(samples: Vec<f32>, sample_rate: u32, timestamp: f64) -> Self {
        Self {
            samples,
            sample_rate,
            timestamp: Some(timestamp),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by the frame in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Reject frames no analysis can run on
    pub fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(MorseError::InvalidFrame("frame has no samples".into()));
        }
        if self.sample_rate == 0 {
            return Err(MorseError::InvalidFrame("sample rate is zero".into()));
        }
        if let Some(ts) = self.timestamp {
            if !ts.is_finite() {
                return Err(MorseError::InvalidFrame(format!("timestamp {} is not finite", ts)));
            }
        }
        if self.samples.iter().any(|s| !s.is_finite()) {
            return Err(MorseError::InvalidFrame("frame contains non-finite samples".into()));
        }
        Ok(())
    }
}

/// Cuts a continuous sample buffer into fixed-size frames stamped by sample offset
///
/// The trailing partial frame is kept so the end of a recording still reaches
/// the decoder.
pub struct FrameSplitter {
    frame_samples: usize,
    sample_rate: u32,
}

impl FrameSplitter {
    pub fn new(frame_samples: usize, sample_rate: u32) -> Result<Self> {
        if frame_samples == 0 {
            return Err(MorseError::InvalidConfig("frame size must be non-zero".into()));
        }
        if sample_rate == 0 {
            return Err(MorseError::InvalidConfig("sample rate must be non-zero".into()));
        }
        Ok(Self {
            frame_samples,
            sample_rate,
        })
    }

    /// Frame size for `frame_ms` milliseconds at `sample_rate`
    pub fn for_duration(frame_ms: u32, sample_rate: u32) -> Result<Self> {
        let frame_samples = (sample_rate as usize * frame_ms as usize) / 1000;
        Self::new(frame_samples, sample_rate)
    }

    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    pub fn split(&self, samples: &[f32]) -> Vec<AudioFrame> {
        samples
            .chunks(self.frame_samples)
            .enumerate()
            .map(|(i, chunk)| {
                let offset = i * self.frame_samples;
                let timestamp = offset as f64 / self.sample_rate as f64;
                AudioFrame::with_timestamp(chunk.to_vec(), self.sample_rate, timestamp)
            })
            .collect()
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self {
            frame_samples: FRAME_SAMPLES,
            sample_rate: SAMPLE_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_and_zero_rate() {
        assert!(AudioFrame::new(vec![], 44100).validate().is_err());
        assert!(AudioFrame::new(vec![0.0; 10], 0).validate().is_err());
        assert!(AudioFrame::new(vec![0.0, f32::NAN], 44100).validate().is_err());
        assert!(AudioFrame::with_timestamp(vec![0.0], 44100, f64::INFINITY)
            .validate()
            .is_err());
        assert!(AudioFrame::new(vec![0.0; 10], 44100).validate().is_ok());
    }

    #[test]
    fn test_splitter_stamps_by_sample_offset() {
        let splitter = FrameSplitter::new(100, 1000).unwrap();
        let frames = splitter.split(&vec![0.25; 350]);

        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].timestamp(), Some(0.0));
        assert!((frames[1].timestamp().unwrap() - 0.1).abs() < 1e-12);
        assert!((frames[3].timestamp().unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(frames[3].len(), 50);
    }

    #[test]
    fn test_default_splitter_is_50ms() {
        let splitter = FrameSplitter::for_duration(50, 44100).unwrap();
        assert_eq!(splitter.frame_samples(), 2205);
        assert_eq!(FrameSplitter::default().frame_samples(), FRAME_SAMPLES);
        assert!(FrameSplitter::new(0, 44100).is_err());
    }
}
