//! One slot of the engine's fixed track array.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::audio::gain;
use crate::audio::period::Frame;
use crate::source::PcmSource;

/// At most one source, a volume, a finished flag.
///
/// The logic thread swaps `source` under the mutex; the real-time side
/// holds the same mutex for one period refill at most and never across a
/// blocking call. Volume rides in an atomic so reads and writes of it
/// never wait on a refill in progress. `finished` is written with release
/// ordering by the real-time side and read with acquire by pollers.
pub(super) struct TrackSlot {
    source: Mutex<Option<PcmSource>>,
    volume_bits: AtomicU32,
    finished: AtomicBool,
}

impl TrackSlot {
    pub(super) fn new() -> TrackSlot {
        TrackSlot {
            source: Mutex::new(None),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            finished: AtomicBool::new(true),
        }
    }

    /// Install a new source, cutting whatever was playing.
    pub(super) fn install(&self, source: PcmSource) {
        let mut slot = self.source.lock().unwrap();
        *slot = Some(source);
        self.finished.store(false, Ordering::Release);
    }

    /// Drop the active source. Idempotent.
    pub(super) fn clear(&self) {
        let mut slot = self.source.lock().unwrap();
        *slot = None;
        self.finished.store(true, Ordering::Release);
    }

    /// Store the volume used for the next refill. Survives `install` and
    /// `clear`, so a volume chosen before the first play still applies.
    pub(super) fn set_volume(&self, vol: f32) {
        let vol = vol.clamp(0.0, 1.0);
        self.volume_bits.store(vol.to_bits(), Ordering::Relaxed);
    }

    pub(super) fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    pub(super) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Pull one period, scale it, and report how many frames are real.
    ///
    /// An idle slot writes silence. Terminal end-of-stream drops the source
    /// and flips `finished` before the lock is released, so a poll that
    /// observes `finished` never races a live source.
    pub(super) fn refill(&self, out: &mut [Frame]) -> usize {
        let mut slot = self.source.lock().unwrap();
        let (got, done) = match slot.as_mut() {
            Some(source) => {
                let got = source.pull(out);
                (got, got < out.len() || source.eos())
            }
            None => {
                for frame in out.iter_mut() {
                    *frame = [0, 0];
                }
                return 0;
            }
        };

        let k = gain::scale(self.volume());
        gain::scale_frames(&mut out[..got], k);
        if done {
            *slot = None;
            self.finished.store(true, Ordering::Release);
        }
        got
    }

    /// Pull one period into `scratch` and add it, scaled but unclamped,
    /// into the wide accumulator. Idle slots contribute nothing.
    pub(super) fn mix_into(&self, acc: &mut [[i32; 2]], scratch: &mut [Frame]) {
        let mut slot = self.source.lock().unwrap();
        let source = match slot.as_mut() {
            Some(source) => source,
            None => return,
        };

        let got = source.pull(scratch);
        let done = got < scratch.len() || source.eos();
        let k = gain::scale(self.volume());
        gain::accumulate(&mut acc[..got], &scratch[..got], k);
        if done {
            *slot = None;
            self.finished.store(true, Ordering::Release);
        }
    }
}
