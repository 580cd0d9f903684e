use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::accumulator::{Diagnostic, SymbolAccumulator};
use crate::detector::{DetectorConfig, SignalDetector};
use crate::error::{MorseError, Result};
use crate::frame::AudioFrame;
use crate::morse_table::MorseTable;
use crate::timing::{SignalState, TimingClassifier, TimingEvent, TimingThresholds};

/// Where a frame's timestamp comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// Use the capture timestamp carried by the frame
    Frame,
    /// Count samples: each frame is stamped at its first sample
    #[default]
    SampleClock,
    /// Stamp on receipt with a monotonic clock started by the first frame
    WallClock,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub detector: DetectorConfig,
    pub thresholds: TimingThresholds,
    pub timestamp_source: TimestampSource,
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.thresholds.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DecoderStats {
    pub frames: u64,
    pub tone_frames: u64,
    pub symbols: u64,
    pub letters: u64,
    pub unknown_letters: u64,
    pub anomalies: u64,
    pub rejected_frames: u64,
}

/// Seconds of audio received, kept as a sample count so frame edges stay exact
#[derive(Debug, Clone, Copy, Default)]
struct SampleCounter {
    base: f64,
    rate: u32,
    samples: u64,
}

impl SampleCounter {
    fn now(&self) -> f64 {
        if self.rate == 0 {
            return self.base;
        }
        self.base + self.samples as f64 / self.rate as f64
    }

    fn advance(&mut self, samples: usize, rate: u32) {
        if rate == 0 {
            return;
        }
        if rate != self.rate {
            self.base = self.now();
            self.rate = rate;
            self.samples = 0;
        }
        self.samples += samples as u64;
    }
}

/// One decoding session
///
/// Owns the classifier state, the letter being built and the decoded text.
/// Frames must arrive in temporal order through [`DecoderEngine::ingest`];
/// [`DecoderEngine::finalize`] ends the session.
pub struct DecoderEngine {
    config: DecoderConfig,
    detector: SignalDetector,
    classifier: TimingClassifier,
    accumulator: SymbolAccumulator,
    stats: DecoderStats,
    sample_clock: SampleCounter,
    signal_end: Option<f64>,
    wall_start: Option<Instant>,
    finalized: Option<String>,
}

impl DecoderEngine {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: SignalDetector::new(config.detector)?,
            classifier: TimingClassifier::new(config.thresholds)?,
            accumulator: SymbolAccumulator::new(MorseTable::new()),
            stats: DecoderStats::default(),
            sample_clock: SampleCounter::default(),
            signal_end: None,
            wall_start: None,
            finalized: None,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Process one frame and return the diagnostics it produced
    ///
    /// A failing frame is counted as rejected and leaves the decoding state as
    /// it was. Its samples still count toward the sample clock, so later
    /// durations keep their true length.
    pub fn ingest(&mut self, frame: &AudioFrame) -> Result<Vec<Diagnostic>> {
        if self.finalized.is_some() {
            return Err(MorseError::SessionClosed);
        }

        let result = self.process(frame);
        self.sample_clock.advance(frame.len(), frame.sample_rate());

        match result {
            Ok((diagnostics, now)) => {
                self.signal_end = Some(match self.config.timestamp_source {
                    TimestampSource::SampleClock => self.sample_clock.now(),
                    _ => now + frame.duration(),
                });
                Ok(diagnostics)
            }
            Err(e) => {
                self.stats.rejected_frames += 1;
                log::warn!("frame rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Returns the diagnostics and the timestamp the frame was stamped with
    fn process(&mut self, frame: &AudioFrame) -> Result<(Vec<Diagnostic>, f64)> {
        frame.validate()?;
        let now = self.timestamp(frame)?;
        self.classifier.check_time(now)?;

        let observation = self.detector.observe(frame, now)?;
        log::trace!(
            "t={:.3}s amp={:.4} freq={:?} tone={}",
            now,
            observation.amplitude,
            observation.frequency,
            observation.present
        );

        let events = self.classifier.step(observation.present, now)?;

        self.stats.frames += 1;
        if observation.present {
            self.stats.tone_frames += 1;
        }

        Ok((self.route(events), now))
    }

    fn timestamp(&mut self, frame: &AudioFrame) -> Result<f64> {
        match self.config.timestamp_source {
            TimestampSource::Frame => frame.timestamp().ok_or(MorseError::MissingTimestamp),
            TimestampSource::SampleClock => Ok(self.sample_clock.now()),
            TimestampSource::WallClock => {
                let start = *self.wall_start.get_or_insert_with(Instant::now);
                Ok(start.elapsed().as_secs_f64())
            }
        }
    }

    fn route(&mut self, events: Vec<TimingEvent>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for event in events {
            match event {
                TimingEvent::Symbol(_) => self.stats.symbols += 1,
                TimingEvent::LetterFlush if !self.accumulator.pending().is_empty() => {
                    self.stats.letters += 1
                }
                TimingEvent::Anomaly(_) => self.stats.anomalies += 1,
                _ => {}
            }
            if let Some(diagnostic) = self.accumulator.apply(event) {
                if let Diagnostic::UnknownSymbol { .. } = diagnostic {
                    self.stats.unknown_letters += 1;
                }
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }

    /// Decoded text so far, without the letter still being keyed
    pub fn snapshot(&self) -> String {
        self.accumulator.message().to_string()
    }

    /// Dots and dashes of the letter still being keyed
    pub fn pending_code(&self) -> &str {
        self.accumulator.pending()
    }

    pub fn state(&self) -> SignalState {
        self.classifier.state()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Flush what is pending, close the session and return the trimmed text.
    /// Later calls return the same text and change nothing.
    pub fn finalize(&mut self) -> String {
        if let Some(message) = &self.finalized {
            return message.clone();
        }

        // Close at the end of the last accepted frame, not its first sample
        let events = match self.signal_end {
            Some(end) => self.classifier.finalize_at(end),
            None => self.classifier.finalize(),
        };
        for diagnostic in self.route(events) {
            log::warn!("at finalize: {:?}", diagnostic);
        }

        let message = self.accumulator.message().trim().to_string();
        log::debug!("session finalized: {:?}", message);
        self.finalized = Some(message.clone());
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant frames standing in for tone/silence: the DC bin is the dominant one
    fn config() -> DecoderConfig {
        DecoderConfig {
            detector: DetectorConfig {
                freq_range: crate::detector::FrequencyRange {
                    min_hz: 0.0,
                    max_hz: 10.0,
                },
                ..Default::default()
            },
            thresholds: TimingThresholds::default(),
            timestamp_source: TimestampSource::Frame,
        }
    }

    fn frame(on: bool, t: f64) -> AudioFrame {
        let level = if on { 0.5 } else { 0.0 };
        AudioFrame::with_timestamp(vec![level; 64], 1000, t)
    }

    fn run(engine: &mut DecoderEngine, pattern: &[(bool, f64)]) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for &(on, t) in pattern {
            diags.extend(engine.ingest(&frame(on, t)).unwrap());
        }
        diags
    }

    #[test]
    fn test_decodes_letter_and_word() {
        let mut engine = DecoderEngine::new(config()).unwrap();
        let diags = run(
            &mut engine,
            &[(true, 0.0), (false, 0.2), (true, 0.4), (false, 0.8), (false, 1.7), (false, 2.4)],
        );
        assert!(diags.is_empty());
        assert_eq!(engine.snapshot(), "A ");
        assert_eq!(engine.finalize(), "A");
    }

    #[test]
    fn test_finalize_is_idempotent_and_closes() {
        let mut engine = DecoderEngine::new(config()).unwrap();
        run(&mut engine, &[(true, 0.0), (false, 0.1)]);
        assert_eq!(engine.pending_code(), ".");

        let first = engine.finalize();
        assert_eq!(first, "E");
        let stats = engine.stats();
        assert_eq!(engine.finalize(), first);
        assert_eq!(engine.stats(), stats);
        assert!(engine.is_finalized());
        assert_eq!(
            engine.ingest(&frame(true, 5.0)),
            Err(MorseError::SessionClosed)
        );
    }

    #[test]
    fn test_bad_frames_leave_state_intact() {
        let mut engine = DecoderEngine::new(config()).unwrap();
        run(&mut engine, &[(true, 1.0)]);

        let empty = AudioFrame::with_timestamp(vec![], 1000, 1.05);
        assert!(matches!(engine.ingest(&empty), Err(MorseError::InvalidFrame(_))));
        assert!(matches!(
            engine.ingest(&frame(false, 0.5)),
            Err(MorseError::NonMonotonicTimestamp { .. })
        ));
        let unstamped = AudioFrame::new(vec![0.0; 64], 1000);
        assert_eq!(engine.ingest(&unstamped), Err(MorseError::MissingTimestamp));

        assert_eq!(engine.state(), SignalState::ToneOn { start: 1.0 });
        assert_eq!(engine.stats().rejected_frames, 3);

        run(&mut engine, &[(false, 1.1), (false, 2.0)]);
        assert_eq!(engine.snapshot(), "E");
    }

    #[test]
    fn test_long_signal_reported() {
        let mut engine = DecoderEngine::new(config()).unwrap();
        let diags = run(&mut engine, &[(true, 0.0), (false, 0.7), (false, 2.0)]);
        assert_eq!(diags, vec![Diagnostic::LongSignal { duration: 0.7 }]);
        assert_eq!(engine.stats().anomalies, 1);
        assert_eq!(engine.finalize(), "");
    }

    #[test]
    fn test_sample_clock_stamps_frames() {
        let cfg = DecoderConfig {
            timestamp_source: TimestampSource::SampleClock,
            ..config()
        };
        let mut engine = DecoderEngine::new(cfg).unwrap();
        // 100-sample frames at 1kHz are 0.1s each; two on, ten off
        for i in 0..12 {
            let level = if i < 2 { 0.5 } else { 0.0 };
            engine.ingest(&AudioFrame::new(vec![level; 100], 1000)).unwrap();
        }
        assert_eq!(engine.snapshot(), "E");
        let stats = engine.stats();
        assert_eq!(stats.frames, 12);
        assert_eq!(stats.tone_frames, 2);
        assert_eq!(stats.symbols, 1);
        assert_eq!(stats.letters, 1);
    }

    #[test]
    fn test_rejected_frame_keeps_sample_clock_running() {
        let cfg = DecoderConfig {
            timestamp_source: TimestampSource::SampleClock,
            ..config()
        };
        let mut engine = DecoderEngine::new(cfg).unwrap();
        // 0.1s frames: tone for 0.3s with a corrupt middle frame, then silence
        engine.ingest(&AudioFrame::new(vec![0.5; 100], 1000)).unwrap();
        let mut corrupt = vec![0.5; 100];
        corrupt[10] = f32::NAN;
        assert!(engine.ingest(&AudioFrame::new(corrupt, 1000)).is_err());
        engine.ingest(&AudioFrame::new(vec![0.5; 100], 1000)).unwrap();
        engine.ingest(&AudioFrame::new(vec![0.0; 100], 1000)).unwrap();

        // 0.3s lands on a dash; losing the rejected frame would make it a dot
        assert_eq!(engine.pending_code(), "-");
        assert_eq!(engine.stats().rejected_frames, 1);
    }

    #[test]
    fn test_finalize_closes_tone_at_frame_end() {
        let cfg = DecoderConfig {
            timestamp_source: TimestampSource::SampleClock,
            ..config()
        };
        let mut engine = DecoderEngine::new(cfg).unwrap();
        // Five 50ms frames of tone and nothing after: 0.25s is a dash
        for _ in 0..5 {
            engine.ingest(&AudioFrame::new(vec![0.5; 50], 1000)).unwrap();
        }
        assert_eq!(engine.finalize(), "T");
    }

    #[test]
    fn test_wall_clock_accepts_unstamped_frames() {
        let cfg = DecoderConfig {
            timestamp_source: TimestampSource::WallClock,
            ..config()
        };
        let mut engine = DecoderEngine::new(cfg).unwrap();
        for _ in 0..3 {
            engine.ingest(&AudioFrame::new(vec![0.0; 64], 1000)).unwrap();
        }
        assert_eq!(engine.stats().frames, 3);
        assert_eq!(engine.finalize(), "");
    }

    #[test]
    fn test_invalid_config() {
        let mut cfg = config();
        cfg.thresholds.dash = 0.1;
        assert!(matches!(
            DecoderEngine::new(cfg),
            Err(MorseError::InvalidConfig(_))
        ));
    }
}
