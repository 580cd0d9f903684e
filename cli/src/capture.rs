//! Device capture shared by the live commands
//!
//! The cpal callback only copies samples into a bounded channel. When the
//! channel is full the chunk is dropped and its length is carried on the next
//! chunk that gets through, so the worker can keep frame timestamps on the
//! device's sample timeline. A single worker thread cuts chunks into frames
//! and hands them to a [`FrameSink`]. Ctrl-C stops the stream, and the worker
//! drains what is still queued before returning the sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use morsewave_core::AudioFrame;

use crate::config::CaptureSettings;

const CHANNEL_DEPTH: usize = 64;

/// Consumer of captured frames, run on the worker thread
pub trait FrameSink: Send + 'static {
    fn frame(&mut self, frame: AudioFrame);
}

/// Samples that reached the channel, after `gap` dropped samples
struct Chunk {
    gap: usize,
    samples: Vec<f32>,
}

/// Cuts chunks into frames stamped by device sample position
struct Framer {
    frame_samples: usize,
    sample_rate: u32,
    /// Device position of the first sample in `buf`
    position: u64,
    buf: Vec<f32>,
    dropped: u64,
}

impl Framer {
    fn new(frame_samples: usize, sample_rate: u32) -> Self {
        Self {
            frame_samples,
            sample_rate,
            position: 0,
            buf: Vec::with_capacity(frame_samples * 2),
            dropped: 0,
        }
    }

    fn push(&mut self, chunk: Chunk, sink: &mut impl FrameSink) {
        if chunk.gap > 0 {
            log::warn!(
                "Audio capture: decoder lagging, {} samples dropped",
                chunk.gap
            );
            // Samples before the gap are not contiguous with what follows
            self.flush(sink);
            self.position += chunk.gap as u64;
            self.dropped += chunk.gap as u64;
        }

        self.buf.extend_from_slice(&chunk.samples);
        while self.buf.len() >= self.frame_samples {
            let samples: Vec<f32> = self.buf.drain(..self.frame_samples).collect();
            self.emit(samples, sink);
        }
    }

    /// Emit the partial frame, if any
    fn flush(&mut self, sink: &mut impl FrameSink) {
        if !self.buf.is_empty() {
            let samples = std::mem::take(&mut self.buf);
            self.emit(samples, sink);
        }
    }

    fn emit(&mut self, samples: Vec<f32>, sink: &mut impl FrameSink) {
        let timestamp = self.position as f64 / self.sample_rate as f64;
        self.position += samples.len() as u64;
        sink.frame(AudioFrame::with_timestamp(samples, self.sample_rate, timestamp));
    }
}

/// Capture from the configured device until Ctrl-C, feeding `sink` frame by frame
pub fn capture_until_interrupted<S: FrameSink>(
    settings: &CaptureSettings,
    frame_ms: u32,
    mut sink: S,
) -> Result<S, Box<dyn std::error::Error>> {
    let sample_rate = settings.sample_rate;
    let frame_samples = (sample_rate as usize * frame_ms as usize) / 1000;
    if frame_samples == 0 {
        return Err("frame length must be at least one sample".into());
    }

    let host = cpal::default_host();
    let device = match settings.device {
        Some(ref name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
            .ok_or_else(|| format!("audio input device '{}' not found", name))?,
        None => host
            .default_input_device()
            .ok_or("no default audio input device")?,
    };
    log::info!(
        "Audio capture: using device '{}' ({} Hz, {} ms frames)",
        device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        frame_ms
    );

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let (chunk_tx, chunk_rx) = sync_channel::<Chunk>(CHANNEL_DEPTH);
    let mut gap = 0usize;
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let chunk = Chunk {
                gap,
                samples: data.to_vec(),
            };
            match chunk_tx.try_send(chunk) {
                Ok(()) => gap = 0,
                Err(_) => gap += data.len(),
            }
        },
        |err| log::error!("Audio input stream error: {}", err),
        None,
    )?;

    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let stop = stop.clone();
        thread::spawn(move || {
            let mut framer = Framer::new(frame_samples, sample_rate);
            run_worker(&mut framer, &chunk_rx, &mut sink, &stop);
            if framer.dropped > 0 {
                log::warn!("Audio capture: {} samples dropped in total", framer.dropped);
            }
            sink
        })
    };

    stream.play()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(tokio::signal::ctrl_c())?;

    drop(stream);
    stop.store(true, Ordering::SeqCst);

    let sink = worker.join().map_err(|_| "capture worker panicked")?;
    Ok(sink)
}

fn run_worker(
    framer: &mut Framer,
    rx: &Receiver<Chunk>,
    sink: &mut impl FrameSink,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => framer.push(chunk, sink),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Whatever was queued before the stream stopped still belongs to the session
    while let Ok(chunk) = rx.try_recv() {
        framer.push(chunk, sink);
    }
    framer.flush(sink);
}
