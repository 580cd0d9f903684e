use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{MorseError, Result};
use crate::morse_table::MorseTable;
use crate::{SAMPLE_RATE, TONE_AMPLITUDE, TONE_FREQUENCY_HZ, UNIT_SECONDS};

/// Units of key-down / key-up time in the sending convention
const DOT_UNITS: f64 = 1.0;
const DASH_UNITS: f64 = 3.0;
const SYMBOL_GAP_UNITS: f64 = 1.0;
const LETTER_GAP_UNITS: f64 = 3.0;
const WORD_GAP_UNITS: f64 = 7.0;

/// Longest accepted unit; a dot this long is already far outside hand keying
pub const MAX_UNIT_SECONDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyerConfig {
    pub frequency_hz: f32,
    pub amplitude: f32,
    pub unit_seconds: f64,
    pub sample_rate: u32,
}

impl KeyerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_seconds > 0.0 && self.unit_seconds <= MAX_UNIT_SECONDS) {
            return Err(MorseError::InvalidConfig(format!(
                "unit duration {}s must lie in (0, {}]s",
                self.unit_seconds, MAX_UNIT_SECONDS
            )));
        }
        if self.sample_rate == 0 {
            return Err(MorseError::InvalidConfig("sample rate must be non-zero".into()));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if !(self.frequency_hz > 0.0 && self.frequency_hz < nyquist) {
            return Err(MorseError::InvalidConfig(format!(
                "tone frequency {} Hz must lie in (0, {}) Hz",
                self.frequency_hz, nyquist
            )));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(MorseError::InvalidConfig(format!(
                "amplitude {} must lie in (0, 1]",
                self.amplitude
            )));
        }
        Ok(())
    }
}

impl Default for KeyerConfig {
    fn default() -> Self {
        Self {
            frequency_hz: TONE_FREQUENCY_HZ,
            amplitude: TONE_AMPLITUDE,
            unit_seconds: UNIT_SECONDS,
            sample_rate: SAMPLE_RATE,
        }
    }
}

/// One key-down (`on`) or key-up stretch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyElement {
    pub on: bool,
    pub seconds: f64,
}

/// Turns text into tone bursts at a single frequency
///
/// Dot is 1 unit, dash 3 units; 1 unit of silence separates symbols, 3 units
/// separate letters and 7 units separate words. Whitespace in the text marks a
/// word boundary and unsupported characters are skipped. The sequence ends
/// with a word gap so a receiver sees the last letter close.
pub struct MorseKeyer {
    config: KeyerConfig,
    table: MorseTable,
}

impl MorseKeyer {
    pub fn new(config: KeyerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: MorseTable::new(),
        })
    }

    pub fn config(&self) -> &KeyerConfig {
        &self.config
    }

    pub fn timing(&self, text: &str) -> Vec<KeyElement> {
        let unit = self.config.unit_seconds;
        let mut elements = Vec::new();

        for word in text.split_whitespace() {
            let codes = self.table.encode(word);
            if codes.is_empty() {
                continue;
            }
            if !elements.is_empty() {
                elements.push(KeyElement {
                    on: false,
                    seconds: WORD_GAP_UNITS * unit,
                });
            }
            for (i, code) in codes.iter().enumerate() {
                if i > 0 {
                    elements.push(KeyElement {
                        on: false,
                        seconds: LETTER_GAP_UNITS * unit,
                    });
                }
                for (j, symbol) in code.chars().enumerate() {
                    if j > 0 {
                        elements.push(KeyElement {
                            on: false,
                            seconds: SYMBOL_GAP_UNITS * unit,
                        });
                    }
                    let units = if symbol == '-' { DASH_UNITS } else { DOT_UNITS };
                    elements.push(KeyElement {
                        on: true,
                        seconds: units * unit,
                    });
                }
            }
        }

        if !elements.is_empty() {
            elements.push(KeyElement {
                on: false,
                seconds: WORD_GAP_UNITS * unit,
            });
        }
        elements
    }

    /// Render key elements to samples; every burst starts at phase zero
    pub fn render(&self, elements: &[KeyElement]) -> Vec<f32> {
        let sample_rate = self.config.sample_rate as f32;
        let mut samples = Vec::new();

        for element in elements {
            let len = (element.seconds * self.config.sample_rate as f64).round() as usize;
            if element.on {
                samples.extend((0..len).map(|i| {
                    let t = i as f32 / sample_rate;
                    self.config.amplitude * (2.0 * PI * self.config.frequency_hz * t).sin()
                }));
            } else {
                samples.extend(std::iter::repeat(0.0f32).take(len));
            }
        }
        samples
    }

    pub fn encode(&self, text: &str) -> Vec<f32> {
        self.render(&self.timing(text))
    }
}

impl Default for MorseKeyer {
    fn default() -> Self {
        Self {
            config: KeyerConfig::default(),
            table: MorseTable::new(),
        }
    }
}
