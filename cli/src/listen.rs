//! Live decoding and frequency monitoring from an input device

use morsewave_core::{AudioFrame, DecoderEngine};

use crate::capture::{capture_until_interrupted, FrameSink};
use crate::config::Settings;
use crate::monitor::FrequencyLog;

struct LiveDecoder {
    engine: DecoderEngine,
    shown: String,
}

impl FrameSink for LiveDecoder {
    fn frame(&mut self, frame: AudioFrame) {
        match self.engine.ingest(&frame) {
            Ok(diagnostics) => {
                for diagnostic in diagnostics {
                    log::warn!("{:?}", diagnostic);
                }
            }
            Err(e) => log::warn!("Frame rejected: {}", e),
        }

        let snapshot = self.engine.snapshot();
        if snapshot != self.shown {
            if snapshot.ends_with(' ') {
                log::info!("[WORD GAP] {}", snapshot.trim());
            }
            self.shown = snapshot;
        }
    }
}

pub fn listen_command(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let sink = LiveDecoder {
        engine: DecoderEngine::new(settings.decoder)?,
        shown: String::new(),
    };

    println!(
        "Listening for Morse ({}-{} Hz)... Press Ctrl+C to stop.",
        settings.decoder.detector.freq_range.min_hz, settings.decoder.detector.freq_range.max_hz
    );
    let mut sink = capture_until_interrupted(&settings.capture, settings.frame_ms, sink)?;

    let message = sink.engine.finalize();
    println!("\nFinal Decoded Message: {}", message);
    Ok(())
}

impl FrameSink for FrequencyLog {
    fn frame(&mut self, frame: AudioFrame) {
        if let Err(e) = self.record(&frame) {
            log::error!("Failed to write frequency log: {}", e);
        }
    }
}

pub fn monitor_live(
    settings: &Settings,
    frame_ms: u32,
    freq_log: FrequencyLog,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Monitoring input frequencies... Press Ctrl+C to stop.");
    capture_until_interrupted(&settings.capture, frame_ms, freq_log)?;
    Ok(())
}
