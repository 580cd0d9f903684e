//! Per-frame dominant frequency log

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use morsewave_core::{AudioFrame, SpectralAnalyzer};

/// Prints one line per frame and mirrors it, wall-clock stamped, to an optional file
pub struct FrequencyLog {
    analyzer: SpectralAnalyzer,
    file: Option<File>,
}

impl FrequencyLog {
    pub fn new(log_file: Option<&Path>) -> io::Result<Self> {
        let file = match log_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Some(OpenOptions::new().create(true).append(true).open(path)?)
            }
            None => None,
        };
        Ok(Self {
            analyzer: SpectralAnalyzer::new(),
            file,
        })
    }

    pub fn record(&mut self, frame: &AudioFrame) -> io::Result<()> {
        let offset = frame.timestamp().unwrap_or(0.0);
        let line = match self.analyzer.dominant_frequency(frame) {
            Ok(freq) => format!("[{:8.3}s] Detected frequency: {:.2} Hz", offset, freq),
            Err(e) => format!("[{:8.3}s] [ERROR] {}", offset, e),
        };
        println!("{}", line);

        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", stamped(&line))?;
        }
        Ok(())
    }
}

fn stamped(line: &str) -> String {
    format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), line)
}
