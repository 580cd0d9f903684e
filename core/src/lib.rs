//! Morse code decoder for audio tone bursts
//!
//! Frames of samples are checked for a tone in a narrow band, tone on/off
//! edges are timed into dots, dashes and gaps, and the gaps resolve letters
//! and words into text.

pub mod error;
pub mod morse_table;
pub mod frame;
pub mod spectrum;
pub mod detector;
pub mod timing;
pub mod accumulator;
pub mod engine;
pub mod keyer;

pub use accumulator::{Diagnostic, SymbolAccumulator};
pub use detector::{tone_present, AmplitudeMetric, DetectorConfig, FrequencyRange, SignalDetector, ToneObservation};
pub use engine::{DecoderConfig, DecoderEngine, DecoderStats, TimestampSource};
pub use error::{MorseError, Result};
pub use frame::{AudioFrame, FrameSplitter};
pub use keyer::{KeyElement, KeyerConfig, MorseKeyer};
pub use morse_table::{MorseTable, UNKNOWN_CHAR};
pub use spectrum::SpectralAnalyzer;
pub use timing::{Anomaly, SignalState, Symbol, TimingClassifier, TimingEvent, TimingThresholds};

// Capture configuration
pub const SAMPLE_RATE: u32 = 44100;
pub const FRAME_DURATION_MS: u32 = 50;
pub const FRAME_SAMPLES: usize = (SAMPLE_RATE as usize * FRAME_DURATION_MS as usize) / 1000; // 2205

// Detection configuration
pub const AMPLITUDE_THRESHOLD: f32 = 0.01;
pub const FREQ_MIN_HZ: f32 = 400.0;
pub const FREQ_MAX_HZ: f32 = 450.0;

// Timing thresholds (seconds)
pub const DOT_THRESHOLD: f64 = 0.25;
pub const DASH_THRESHOLD: f64 = 0.5;
pub const LETTER_SPACE_THRESHOLD: f64 = 0.75;
pub const WORD_SPACE_THRESHOLD: f64 = 1.5;

// Sender configuration
pub const TONE_FREQUENCY_HZ: f32 = 430.0;
pub const TONE_AMPLITUDE: f32 = 0.5;
pub const UNIT_SECONDS: f64 = 0.2;
