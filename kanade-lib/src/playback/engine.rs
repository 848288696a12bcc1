//! The fixed track array and the period mixer.

use std::array;

use crate::audio::gain;
use crate::audio::period::{Frame, PeriodBuffer};
use crate::constants::TRACK_COUNT;
use crate::source::PcmSource;

use super::track::TrackSlot;

/// Callback seam between the engine and a platform sink.
///
/// Pulled backends call this from the device callback whenever a queued
/// period drains; pushed backends call it from their own timer loop. The
/// implementation must return promptly: one period of decode work, no
/// unbounded waits.
pub trait RefillSink: Send + Sync {
    /// Produce the next period for one track.
    fn on_period_needed(&self, track: usize) -> PeriodBuffer;
}

/// All track slots plus the refill entry points the real-time side calls.
///
/// Methods take `&self`; the engine is meant to sit in an `Arc` shared
/// between the logic thread and whichever real-time side is active.
pub struct MixEngine {
    tracks: [TrackSlot; TRACK_COUNT],
    period_frames: usize,
}

/// Reusable mix buffers, one set per render thread.
pub struct MixScratch {
    acc: Vec<[i32; 2]>,
    pull: Vec<Frame>,
}

impl MixScratch {
    pub fn new(period_frames: usize) -> MixScratch {
        MixScratch {
            acc: vec![[0, 0]; period_frames],
            pull: vec![[0, 0]; period_frames],
        }
    }
}

impl MixEngine {
    pub fn new(period_frames: usize) -> MixEngine {
        MixEngine {
            tracks: array::from_fn(|_| TrackSlot::new()),
            period_frames: period_frames.max(1),
        }
    }

    /// Frames per period handed to the platform sink.
    pub fn period_frames(&self) -> usize {
        self.period_frames
    }

    /// Install `source` on `track`, replacing whatever is there.
    ///
    /// The old stream is cut, not faded. The new source is visible to the
    /// real-time side no later than its next refill. False only for an
    /// out-of-range index.
    pub fn play(&self, track: usize, source: PcmSource) -> bool {
        match self.tracks.get(track) {
            Some(slot) => {
                slot.install(source);
                true
            }
            None => false,
        }
    }

    /// Stop `track`. Idempotent; false only for an out-of-range index.
    pub fn stop(&self, track: usize) -> bool {
        match self.tracks.get(track) {
            Some(slot) => {
                slot.clear();
                true
            }
            None => false,
        }
    }

    /// Set the volume applied to `track`'s next period.
    ///
    /// Remembered across `play` and `stop`, so a volume chosen before the
    /// first play shapes its first period. Never blocks on a refill.
    pub fn set_volume(&self, track: usize, vol: f32) -> bool {
        match self.tracks.get(track) {
            Some(slot) => {
                slot.set_volume(vol);
                true
            }
            None => false,
        }
    }

    /// Non-blocking poll: true once nothing is playing on `track`.
    pub fn is_finished(&self, track: usize) -> bool {
        match self.tracks.get(track) {
            Some(slot) => slot.is_finished(),
            None => true,
        }
    }

    /// True once every track is idle.
    pub fn all_finished(&self) -> bool {
        self.tracks.iter().all(|slot| slot.is_finished())
    }

    /// Fill `out` with one track's next period, scaled and clamped.
    ///
    /// Returns how many frames are real; the rest is silence. Idle and
    /// out-of-range tracks produce a whole period of silence.
    pub fn refill_period(&self, track: usize, out: &mut [Frame]) -> usize {
        match self.tracks.get(track) {
            Some(slot) => slot.refill(out),
            None => {
                for frame in out.iter_mut() {
                    *frame = [0, 0];
                }
                0
            }
        }
    }

    /// Mix one period of every track into `out`.
    ///
    /// Tracks accumulate into a wide buffer and the result clamps once,
    /// after the sum, so two loud tracks saturate instead of wrapping and
    /// a single track is never double-clipped.
    pub fn mix_period(&self, scratch: &mut MixScratch, out: &mut [Frame]) {
        for sample in scratch.acc.iter_mut() {
            *sample = [0, 0];
        }
        for slot in &self.tracks {
            slot.mix_into(&mut scratch.acc, &mut scratch.pull);
        }
        gain::write_clamped(&scratch.acc, out);
    }

    #[cfg(test)]
    pub(crate) fn track_volume(&self, track: usize) -> f32 {
        self.tracks[track].volume()
    }
}

impl RefillSink for MixEngine {
    fn on_period_needed(&self, track: usize) -> PeriodBuffer {
        let mut period = PeriodBuffer::new(self.period_frames);
        self.refill_period(track, period.frames_mut());
        period
    }
}
