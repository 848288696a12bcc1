//! Endless rodio source feeding one track from a [`RefillSink`].

use std::sync::Arc;
use std::time::Duration;

use rodio::source::{SeekError, Source};

use crate::constants::{CHANNELS, SAMPLE_RATE};

use super::engine::RefillSink;

/// One device voice worth of samples.
///
/// rodio's playback thread drives the pull: each time the queued period is
/// exhausted the voice asks the sink for the next one, which is exactly the
/// callback-pulled contract. The voice never ends on its own; an idle track
/// simply yields silence until something is played on it.
pub struct TrackVoice<S: RefillSink> {
    sink: Arc<S>,
    track: usize,
    period: Vec<f32>,
    cursor: usize,
}

impl<S: RefillSink> TrackVoice<S> {
    pub fn new(sink: Arc<S>, track: usize) -> TrackVoice<S> {
        TrackVoice {
            sink,
            track,
            period: Vec::new(),
            cursor: 0,
        }
    }
}

impl<S: RefillSink> Iterator for TrackVoice<S> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.period.len() {
            self.period = self.sink.on_period_needed(self.track).to_f32_samples();
            self.cursor = 0;
            if self.period.is_empty() {
                return Some(0.0);
            }
        }
        let sample = self.period[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl<S: RefillSink> Source for TrackVoice<S> {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }

    fn try_seek(&mut self, _pos: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: "TrackVoice",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::period::PeriodBuffer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSink {
        calls: AtomicUsize,
    }

    impl StubSink {
        fn new() -> StubSink {
            StubSink {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RefillSink for StubSink {
        fn on_period_needed(&self, _track: usize) -> PeriodBuffer {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            let mut period = PeriodBuffer::new(4);
            for (i, frame) in period.frames_mut().iter_mut().enumerate() {
                let value = (call * 100 + i + 1) as i16;
                *frame = [value, -value];
            }
            period
        }
    }

    #[test]
    fn voice_pulls_one_period_per_drain() {
        let sink = Arc::new(StubSink::new());
        let mut voice = TrackVoice::new(sink.clone(), 0);

        for _ in 0..8 {
            voice.next();
        }
        assert_eq!(sink.calls.load(Ordering::Relaxed), 1);

        voice.next();
        assert_eq!(sink.calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn voice_interleaves_left_then_right() {
        let sink = Arc::new(StubSink::new());
        let mut voice = TrackVoice::new(sink, 0);

        let left = voice.next().unwrap();
        let right = voice.next().unwrap();
        assert!(left > 0.0 || right < 0.0);
        assert_eq!(left, -right);
    }

    #[test]
    fn voice_never_ends() {
        let sink = Arc::new(StubSink::new());
        let voice = TrackVoice::new(sink, 3);
        assert_eq!(voice.take(1000).count(), 1000);
    }

    #[test]
    fn voice_reports_the_fixed_output_format() {
        let voice = TrackVoice::new(Arc::new(StubSink::new()), 0);
        assert_eq!(voice.channels(), CHANNELS);
        assert_eq!(voice.sample_rate(), SAMPLE_RATE);
        assert_eq!(voice.total_duration(), None);
    }
}
