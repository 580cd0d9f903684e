use hound::{SampleFormat, WavSpec};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV I/O error: {0}")]
    Hound(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
}

/// Mono samples plus the rate they were recorded at
pub struct WavAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Read a WAV file, keeping only the first channel
pub fn read_wav(path: &Path) -> Result<WavAudio, WavError> {
    let file = File::open(path)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    log::info!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => {
            let int_samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            int_samples?.into_iter().map(|s| s as f32 / 32768.0).collect()
        }
        (SampleFormat::Float, 32) => {
            let float_samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            float_samples?
        }
        (_, bits) => return Err(WavError::UnsupportedBitDepth(bits)),
    };

    let channels = spec.channels.max(1) as usize;
    let samples = interleaved.iter().step_by(channels).copied().collect();

    Ok(WavAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Write mono 16-bit PCM
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let file = File::create(path)?;
    let mut writer = hound::WavWriter::new(std::io::BufWriter::new(file), spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
