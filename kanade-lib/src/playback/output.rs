//! Device output in both real-time styles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::audio::period::PeriodBuffer;
use crate::constants::{CHANNELS, SAMPLE_RATE, TRACK_COUNT};

use super::engine::{MixEngine, MixScratch};
use super::settings::{OutputMode, OutputSettings};
use super::sink::TrackVoice;

const OPEN_RETRIES: u32 = 3;
const OPEN_RETRY_MS: u64 = 100;

enum Backend {
    /// A render thread mixes all tracks and pushes periods at the device.
    Mixed {
        sink: Arc<Sink>,
        exit: Arc<AtomicBool>,
        render: Option<JoinHandle<()>>,
    },
    /// One voice per track; rodio's thread pulls periods through each
    /// [`TrackVoice`] and sums the voices itself.
    PerVoice { sinks: Vec<Sink> },
}

/// Owns the device stream and whichever real-time side feeds it.
pub struct AudioOutput {
    backend: Backend,
    // Declared after `backend` so every sink drops before the stream they
    // feed into.
    _stream: OutputStream,
}

impl AudioOutput {
    /// Open the default device and start the configured backend.
    ///
    /// `None` means no usable device; callers run silent rather than fail.
    pub fn open(engine: Arc<MixEngine>, settings: &OutputSettings) -> Option<AudioOutput> {
        let stream = open_output_stream_with_retry()?;
        let mixer = stream.mixer().clone();

        let backend = match settings.mode {
            OutputMode::Mixed => {
                let sink = Arc::new(Sink::connect_new(&mixer));
                let exit = Arc::new(AtomicBool::new(false));
                let render = spawn_render_thread(
                    engine,
                    sink.clone(),
                    exit.clone(),
                    settings.queue_periods.max(1),
                );
                Backend::Mixed {
                    sink,
                    exit,
                    render: Some(render),
                }
            }
            OutputMode::PerVoice => {
                let mut sinks = Vec::with_capacity(TRACK_COUNT);
                for track in 0..TRACK_COUNT {
                    let sink = Sink::connect_new(&mixer);
                    sink.append(TrackVoice::new(engine.clone(), track));
                    sinks.push(sink);
                }
                Backend::PerVoice { sinks }
            }
        };

        Some(AudioOutput {
            backend,
            _stream: stream,
        })
    }

    /// Stop device-side consumption without touching track state.
    pub fn pause(&self) {
        match &self.backend {
            Backend::Mixed { sink, .. } => sink.pause(),
            Backend::PerVoice { sinks } => {
                for sink in sinks {
                    sink.pause();
                }
            }
        }
    }

    /// Resume after [`AudioOutput::pause`].
    pub fn resume(&self) {
        match &self.backend {
            Backend::Mixed { sink, .. } => sink.play(),
            Backend::PerVoice { sinks } => {
                for sink in sinks {
                    sink.play();
                }
            }
        }
    }

    fn shutdown(&mut self) {
        if let Backend::Mixed { exit, render, .. } = &mut self.backend {
            exit.store(true, Ordering::SeqCst);
            if let Some(handle) = render.take() {
                if handle.join().is_err() {
                    warn!("render thread panicked during join");
                }
            }
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Open the default output stream with bounded retry behavior.
///
/// Retries are kept short: a host booting without a device should find out
/// quickly and keep going, not stall its own startup.
fn open_output_stream_with_retry() -> Option<OutputStream> {
    for attempt in 1..=OPEN_RETRIES {
        match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => return Some(stream),
            Err(err) => {
                if attempt == OPEN_RETRIES {
                    error!(
                        "failed to open default output stream after {} attempts: {}",
                        OPEN_RETRIES, err
                    );
                    return None;
                }
                warn!(
                    "open_default_stream attempt {}/{} failed: {}",
                    attempt, OPEN_RETRIES, err
                );
                thread::sleep(Duration::from_millis(OPEN_RETRY_MS));
            }
        }
    }
    None
}

/// Mix periods ahead of the device until told to exit.
///
/// The loop sleeps while the sink holds `queue_periods` periods or is
/// paused, and yields between appends so a cooperative scheduler never
/// starves the logic thread against a hot producer.
fn spawn_render_thread(
    engine: Arc<MixEngine>,
    sink: Arc<Sink>,
    exit: Arc<AtomicBool>,
    queue_periods: usize,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let period_frames = engine.period_frames();
        let mut scratch = MixScratch::new(period_frames);
        let mut period = PeriodBuffer::new(period_frames);
        let backoff = Duration::from_millis(
            (period_frames as u64 * 250 / SAMPLE_RATE as u64).max(1),
        );

        #[cfg(feature = "debug")]
        log::info!(
            "render thread started: {} frames per period, {} periods queued",
            period_frames,
            queue_periods
        );

        while !exit.load(Ordering::SeqCst) {
            if sink.len() >= queue_periods || sink.is_paused() {
                thread::sleep(backoff);
                continue;
            }

            engine.mix_period(&mut scratch, period.frames_mut());
            sink.append(SamplesBuffer::new(
                CHANNELS,
                SAMPLE_RATE,
                period.to_f32_samples(),
            ));

            thread::yield_now();
        }

        #[cfg(feature = "debug")]
        log::info!("render thread exiting");
    })
}
