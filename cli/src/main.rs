#[cfg(feature = "live")]
mod capture;
mod config;
#[cfg(feature = "live")]
mod listen;
mod monitor;
mod wav;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use config::Settings;
use monitor::FrequencyLog;
use morsewave_core::{
    DecoderEngine, DecoderStats, Diagnostic, FrameSplitter, MorseKeyer, TimestampSource,
    TimingThresholds,
};

#[derive(Parser)]
#[command(name = "morsewave")]
#[command(about = "Send and decode Morse code carried as audio tones")]
struct Cli {
    /// JSON settings file (frame size, decoder and keyer configuration)
    #[arg(long, global = true, value_name = "FILE.JSON")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Key text into a WAV file of tone bursts
    Encode {
        /// Message to send
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Tone frequency in Hz
        #[arg(long)]
        frequency: Option<f32>,

        /// Unit (dot) duration in seconds
        #[arg(long)]
        unit: Option<f64>,
    },

    /// Decode Morse from a WAV recording
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        #[command(flatten)]
        tuning: Tuning,

        /// Print a JSON report instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Log the dominant frequency of each frame, from a recording or the input device
    Monitor {
        /// Input WAV file; omit to capture live (needs the `live` feature)
        #[arg(value_name = "INPUT.WAV")]
        input: Option<PathBuf>,

        /// Frame length in milliseconds
        #[arg(long, default_value = "500")]
        frame_ms: u32,

        /// Append wall-clock stamped log lines to this file as well
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,
    },

    /// Decode from the default input device until Ctrl-C
    #[cfg(feature = "live")]
    Listen {
        #[command(flatten)]
        tuning: Tuning,

        /// Stamp frames with the wall clock instead of counting samples
        #[arg(long)]
        wall_clock: bool,
    },
}

/// Decoder overrides shared by the decoding commands
#[derive(Args)]
struct Tuning {
    /// Lower edge of the tone band in Hz
    #[arg(long)]
    min_freq: Option<f32>,

    /// Upper edge of the tone band in Hz
    #[arg(long)]
    max_freq: Option<f32>,

    /// Amplitude a frame must exceed to count as a tone
    #[arg(long)]
    threshold: Option<f32>,

    /// Derive timing thresholds from the sender's unit duration in seconds
    #[arg(long)]
    unit: Option<f64>,

    /// Frame length in milliseconds
    #[arg(long)]
    frame_ms: Option<u32>,
}

impl Tuning {
    fn apply(&self, settings: &mut Settings) -> Result<(), Box<dyn std::error::Error>> {
        let detector = &mut settings.decoder.detector;
        if let Some(min) = self.min_freq {
            detector.freq_range.min_hz = min;
        }
        if let Some(max) = self.max_freq {
            detector.freq_range.max_hz = max;
        }
        if let Some(threshold) = self.threshold {
            detector.amplitude_threshold = threshold;
        }
        if let Some(unit) = self.unit {
            settings.decoder.thresholds = TimingThresholds::from_unit(unit)?;
        }
        if let Some(frame_ms) = self.frame_ms {
            settings.frame_ms = frame_ms;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DecodeReport {
    message: String,
    diagnostics: Vec<Diagnostic>,
    stats: DecoderStats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode {
            text,
            output,
            frequency,
            unit,
        } => {
            if let Some(frequency) = frequency {
                settings.keyer.frequency_hz = frequency;
            }
            if let Some(unit) = unit {
                settings.keyer.unit_seconds = unit;
            }
            encode_command(&settings, &text, &output)?
        }
        Commands::Decode {
            input,
            tuning,
            json,
        } => {
            tuning.apply(&mut settings)?;
            decode_command(&settings, &input, json)?
        }
        Commands::Monitor {
            input,
            frame_ms,
            log_file,
        } => {
            let freq_log = FrequencyLog::new(log_file.as_deref())?;
            match input {
                Some(input) => monitor_command(&input, frame_ms, freq_log)?,
                None => monitor_live(&settings, frame_ms, freq_log)?,
            }
        }
        #[cfg(feature = "live")]
        Commands::Listen { tuning, wall_clock } => {
            tuning.apply(&mut settings)?;
            // Capture stamps frames by device sample position, dropped chunks included
            settings.decoder.timestamp_source = if wall_clock {
                TimestampSource::WallClock
            } else {
                TimestampSource::Frame
            };
            listen::listen_command(&settings)?
        }
    }

    Ok(())
}

fn encode_command(
    settings: &Settings,
    text: &str,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let keyer = MorseKeyer::new(settings.keyer)?;
    let samples = keyer.encode(text);
    if samples.is_empty() {
        return Err(format!("nothing to send in {:?}", text).into());
    }
    log::info!(
        "Keyed {:?} at {} Hz, {}s unit: {} samples",
        text,
        settings.keyer.frequency_hz,
        settings.keyer.unit_seconds,
        samples.len()
    );

    wav::write_wav(output_path, &samples, settings.keyer.sample_rate)?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

fn decode_command(
    settings: &Settings,
    input_path: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let audio = wav::read_wav(input_path)?;
    log::info!("Extracted {} samples", audio.samples.len());

    let mut decoder_config = settings.decoder;
    // Offline audio has no capture clock; count samples unless frames are pre-stamped
    if decoder_config.timestamp_source == TimestampSource::WallClock {
        decoder_config.timestamp_source = TimestampSource::SampleClock;
    }

    let splitter = FrameSplitter::for_duration(settings.frame_ms, audio.sample_rate)?;
    let mut engine = DecoderEngine::new(decoder_config)?;
    let mut diagnostics = Vec::new();

    for frame in splitter.split(&audio.samples) {
        match engine.ingest(&frame) {
            Ok(found) => diagnostics.extend(found),
            Err(e) => log::warn!("Skipping frame: {}", e),
        }
    }

    let message = engine.finalize();
    let stats = engine.stats();
    log::info!(
        "Decoded {} letters from {} frames ({} with tone)",
        stats.letters,
        stats.frames,
        stats.tone_frames
    );

    if json {
        let report = DecodeReport {
            message,
            diagnostics,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", message);
    }
    Ok(())
}

fn monitor_command(
    input_path: &Path,
    frame_ms: u32,
    mut freq_log: FrequencyLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let audio = wav::read_wav(input_path)?;
    let splitter = FrameSplitter::for_duration(frame_ms, audio.sample_rate)?;
    for frame in splitter.split(&audio.samples) {
        freq_log.record(&frame)?;
    }
    Ok(())
}

#[cfg(feature = "live")]
fn monitor_live(
    settings: &Settings,
    frame_ms: u32,
    freq_log: FrequencyLog,
) -> Result<(), Box<dyn std::error::Error>> {
    listen::monitor_live(settings, frame_ms, freq_log)
}

#[cfg(not(feature = "live"))]
fn monitor_live(
    _settings: &Settings,
    _frame_ms: u32,
    _freq_log: FrequencyLog,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("no input file given; live capture needs the `live` feature".into())
}
