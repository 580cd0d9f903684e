//! Duration-based classification of tone on/off transitions
//!
//! The classifier sees one `(tone_present, now)` pair per frame and turns the
//! edges into symbol events, and the silences between them into letter and
//! word boundaries:
//!
//! ```text
//!            tone                      no tone (classify on-duration)
//!   Idle ─────────────▶ ToneOn ─────────────────────────────────▶ Silent
//!                          ▲                                         │
//!                          └──────────────── tone ───────────────────┘
//! ```
//!
//! While `Silent`, the elapsed silence is re-checked on every frame so a
//! trailing gap that is never followed by another tone still flushes. Each
//! flush kind fires at most once per silence run.

use serde::{Deserialize, Serialize};

use crate::error::{MorseError, Result};
use crate::{DASH_THRESHOLD, DOT_THRESHOLD, LETTER_SPACE_THRESHOLD, WORD_SPACE_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Dot,
    Dash,
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Dot => '.',
            Symbol::Dash => '-',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anomaly {
    /// Tone held for at least the dash threshold; it contributes no symbol
    LongSignal { duration: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingEvent {
    Symbol(Symbol),
    LetterFlush,
    WordFlush,
    Anomaly(Anomaly),
}

/// Duration boundaries in seconds
///
/// Symbols use strict `<`: an on-time equal to `dot` is a dash, equal to
/// `dash` is a long signal. Gaps use strict `>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingThresholds {
    pub dot: f64,
    pub dash: f64,
    pub letter_space: f64,
    pub word_space: f64,
}

impl TimingThresholds {
    /// Midpoints of the sender convention for a given unit length:
    /// dot 1u / dash 3u / long 7u+, and gaps of 1u / 3u / 7u.
    pub fn from_unit(unit: f64) -> Result<Self> {
        let thresholds = Self {
            dot: unit * 2.0,
            dash: unit * 5.0,
            letter_space: unit * 2.0,
            word_space: unit * 5.0,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.dot, self.dash, self.letter_space, self.word_space];
        if all.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(MorseError::InvalidConfig(format!(
                "timing thresholds must be positive, got {:?}",
                self
            )));
        }
        if self.dot >= self.dash {
            return Err(MorseError::InvalidConfig(format!(
                "dot threshold {}s must be below dash threshold {}s",
                self.dot, self.dash
            )));
        }
        if self.letter_space >= self.word_space {
            return Err(MorseError::InvalidConfig(format!(
                "letter space threshold {}s must be below word space threshold {}s",
                self.letter_space, self.word_space
            )));
        }
        Ok(())
    }

    pub fn classify_tone(&self, on_duration: f64) -> TimingEvent {
        if on_duration < self.dot {
            TimingEvent::Symbol(Symbol::Dot)
        } else if on_duration < self.dash {
            TimingEvent::Symbol(Symbol::Dash)
        } else {
            TimingEvent::Anomaly(Anomaly::LongSignal {
                duration: on_duration,
            })
        }
    }
}

impl Default for TimingThresholds {
    fn default() -> Self {
        Self {
            dot: DOT_THRESHOLD,
            dash: DASH_THRESHOLD,
            letter_space: LETTER_SPACE_THRESHOLD,
            word_space: WORD_SPACE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalState {
    Idle,
    ToneOn {
        start: f64,
    },
    Silent {
        since: f64,
        letter_flushed: bool,
        word_flushed: bool,
    },
}

pub struct TimingClassifier {
    thresholds: TimingThresholds,
    state: SignalState,
    last_time: Option<f64>,
}

impl TimingClassifier {
    pub fn new(thresholds: TimingThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            state: SignalState::Idle,
            last_time: None,
        })
    }

    pub fn thresholds(&self) -> &TimingThresholds {
        &self.thresholds
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// Fails without touching state when `now` is not finite or goes backwards
    pub fn check_time(&self, now: f64) -> Result<()> {
        if !now.is_finite() {
            return Err(MorseError::InvalidFrame(format!("timestamp {} is not finite", now)));
        }
        if let Some(previous) = self.last_time {
            if now < previous {
                return Err(MorseError::NonMonotonicTimestamp {
                    previous,
                    current: now,
                });
            }
        }
        Ok(())
    }

    /// Advance by one frame
    pub fn step(&mut self, tone_present: bool, now: f64) -> Result<Vec<TimingEvent>> {
        self.check_time(now)?;
        self.last_time = Some(now);

        let mut events = Vec::new();
        match (self.state, tone_present) {
            (SignalState::Idle, true) | (SignalState::Silent { .. }, true) => {
                self.state = SignalState::ToneOn { start: now };
            }
            (SignalState::ToneOn { start }, false) => {
                events.push(self.thresholds.classify_tone(now - start));
                self.state = SignalState::Silent {
                    since: now,
                    letter_flushed: false,
                    word_flushed: false,
                };
            }
            (SignalState::Silent { .. }, false) => {
                self.check_silence(now, &mut events);
            }
            (SignalState::ToneOn { .. }, true) | (SignalState::Idle, false) => {}
        }
        Ok(events)
    }

    fn check_silence(&mut self, now: f64, events: &mut Vec<TimingEvent>) {
        if let SignalState::Silent {
            since,
            letter_flushed,
            word_flushed,
        } = &mut self.state
        {
            let silence = now - *since;
            if silence > self.thresholds.letter_space && !*letter_flushed {
                *letter_flushed = true;
                events.push(TimingEvent::LetterFlush);
            }
            if silence > self.thresholds.word_space && !*word_flushed {
                *word_flushed = true;
                events.push(TimingEvent::WordFlush);
            }
        }
    }

    /// Force out whatever is pending, closing an open tone at the last seen timestamp
    pub fn finalize(&mut self) -> Vec<TimingEvent> {
        self.finalize_at(self.last_time.unwrap_or(0.0))
    }

    /// Force out whatever is pending regardless of elapsed silence
    ///
    /// `end` is where the observed signal stops, typically the end of the last
    /// frame rather than its first sample. An open tone is closed there and
    /// classified, then the letter is flushed unless this silence run already
    /// did so. No word flush is emitted: the session ends on a letter
    /// boundary either way.
    pub fn finalize_at(&mut self, end: f64) -> Vec<TimingEvent> {
        let mut events = Vec::new();
        let end = match self.last_time {
            Some(last) if !(end >= last) => last,
            _ => end,
        };

        let letter_flushed = match self.state {
            SignalState::Idle => false,
            SignalState::ToneOn { start } => {
                events.push(self.thresholds.classify_tone(end - start));
                false
            }
            SignalState::Silent { letter_flushed, .. } => letter_flushed,
        };

        if !letter_flushed {
            events.push(TimingEvent::LetterFlush);
        }

        self.state = SignalState::Idle;
        events
    }
}
