use serde::Serialize;

use crate::morse_table::{MorseTable, UNKNOWN_CHAR};
use crate::timing::{Anomaly, TimingEvent};

/// Non-fatal conditions reported back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Tone longer than the dash threshold, dropped
    LongSignal { duration: f64 },
    /// Letter code not in the table, decoded as `?`
    UnknownSymbol { code: String },
}

/// Builds letters out of symbols and appends them to the decoded message
pub struct SymbolAccumulator {
    table: MorseTable,
    buffer: String,
    message: String,
}

impl SymbolAccumulator {
    pub fn new(table: MorseTable) -> Self {
        Self {
            table,
            buffer: String::new(),
            message: String::new(),
        }
    }

    /// Code of the letter currently being built
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn apply(&mut self, event: TimingEvent) -> Option<Diagnostic> {
        match event {
            TimingEvent::Symbol(symbol) => {
                self.buffer.push(symbol.as_char());
                None
            }
            TimingEvent::LetterFlush => self.flush_letter(),
            TimingEvent::WordFlush => {
                if !self.message.ends_with(' ') {
                    self.message.push(' ');
                    log::debug!("word gap: {:?}", self.message.trim());
                }
                None
            }
            TimingEvent::Anomaly(Anomaly::LongSignal { duration }) => {
                log::warn!("long signal ignored: {:.2}s", duration);
                Some(Diagnostic::LongSignal { duration })
            }
        }
    }

    fn flush_letter(&mut self) -> Option<Diagnostic> {
        if self.buffer.is_empty() {
            return None;
        }

        let code = std::mem::take(&mut self.buffer);
        match self.table.lookup(&code) {
            Some(ch) => {
                log::debug!("letter {} -> {}", code, ch);
                self.message.push(ch);
                None
            }
            None => {
                log::debug!("unknown code {}", code);
                self.message.push(UNKNOWN_CHAR);
                Some(Diagnostic::UnknownSymbol { code })
            }
        }
    }
}

impl Default for SymbolAccumulator {
    fn default() -> Self {
        Self::new(MorseTable::new())
    }
}
