//! Streaming PCM sources.
//!
//! This module glues together several submodules:
//!
//! - `convert`: decoded packets into interleaved stereo frames
//! - `reader`: the [`PcmRead`] seam and the Symphonia-backed reader
//!
//! [`PcmSource`] layers loop bookkeeping on top of a reader so the playback
//! side only ever sees a flat "fill this buffer" surface.

mod convert;
mod reader;

pub use reader::{LoopTags, PcmRead, StreamReader};

use std::path::Path;

use crate::audio::period::Frame;

/// Frames skipped per decode call while repositioning to a loop start.
const SKIP_CHUNK: usize = 512;

/// Loop policy requested by the caller.
///
/// `start` and `length` are frame offsets into the stream; a `length` of
/// zero extends the loop region to the natural end. `repeat` counts extra
/// passes over the region, `None` meaning loop until stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSpec {
    pub looping: bool,
    pub start: u64,
    pub length: u64,
    pub repeat: Option<u32>,
}

impl LoopSpec {
    /// Play front to back, once.
    pub fn once() -> LoopSpec {
        LoopSpec {
            looping: false,
            start: 0,
            length: 0,
            repeat: Some(0),
        }
    }

    /// Loop the whole stream until stopped.
    pub fn forever() -> LoopSpec {
        LoopSpec {
            looping: true,
            start: 0,
            length: 0,
            repeat: None,
        }
    }
}

impl Default for LoopSpec {
    fn default() -> LoopSpec {
        LoopSpec::once()
    }
}

/// A decoded stream plus its loop state.
///
/// `pull` is the only mutating entry point once the source is attached to a
/// track; everything it needs lives behind the [`PcmRead`] reader so the hot
/// path never touches the filesystem directly.
pub struct PcmSource {
    reader: Box<dyn PcmRead>,
    looping: bool,
    loop_start: u64,
    loop_length: u64,
    repeat: Option<u32>,
    consumed: u64,
    skip_pending: bool,
    rewound_empty: bool,
    pending: Option<Frame>,
    eos: bool,
}

impl PcmSource {
    /// Open `path` with the given loop policy.
    ///
    /// `LOOPSTART` / `LOOPLENGTH` tags found in the stream force looping and
    /// take precedence over the caller's loop points; a stream tagged this
    /// way loops until stopped unless the caller already bounded it.
    pub fn open(path: &Path, spec: LoopSpec) -> Option<PcmSource> {
        let reader = StreamReader::open(path)?;
        let tags = reader.loop_tags();
        Some(PcmSource::with_tags(Box::new(reader), spec, tags))
    }

    /// Wrap an already-open reader with the given loop policy.
    pub fn from_reader(reader: Box<dyn PcmRead>, spec: LoopSpec) -> PcmSource {
        PcmSource::with_tags(reader, spec, LoopTags::default())
    }

    pub(crate) fn with_tags(reader: Box<dyn PcmRead>, spec: LoopSpec, tags: LoopTags) -> PcmSource {
        let mut looping = spec.looping;
        let mut start = spec.start;
        let mut length = spec.length;
        let mut repeat = spec.repeat;
        if !tags.is_empty() {
            if !looping {
                repeat = None;
            }
            looping = true;
            start = tags.start.unwrap_or(start);
            length = tags.length.unwrap_or(length);
        }
        PcmSource {
            reader,
            looping,
            loop_start: start,
            loop_length: length,
            repeat,
            consumed: 0,
            skip_pending: false,
            rewound_empty: false,
            pending: None,
            eos: false,
        }
    }

    /// True once the source has yielded its last real frame.
    pub fn eos(&self) -> bool {
        self.eos
    }

    /// Fill `out` with decoded frames, returning how many are real.
    ///
    /// The tail past the returned count is zero-filled once the stream ends,
    /// so a short return always hands the caller a fully-initialized period.
    /// Looping and repeat bookkeeping happen inside; the caller only ever
    /// compares the return value against `out.len()`.
    pub fn pull(&mut self, out: &mut [Frame]) -> usize {
        let mut filled = 0;
        while filled < out.len() && !self.eos {
            if self.skip_pending {
                if self.skip_to_loop_start() {
                    self.skip_pending = false;
                } else {
                    self.eos = true;
                    break;
                }
            }

            if let Some(frame) = self.pending.take() {
                out[filled] = frame;
                filled += 1;
                continue;
            }

            let (want, at_boundary) = self.clip_to_boundary(out.len() - filled);
            if want == 0 {
                if !self.rewind() {
                    self.eos = true;
                }
                continue;
            }

            let got = self.reader.read_frames(&mut out[filled..filled + want]);
            self.consumed += got as u64;
            filled += got;

            if got == 0 && self.rewound_empty {
                // Two empty reads across a rewind: the loop region holds
                // nothing, so stop instead of spinning.
                self.eos = true;
                break;
            }
            self.rewound_empty = got == 0;

            if got < want || at_boundary {
                if !self.rewind() {
                    self.eos = true;
                }
            }
        }

        // Look one frame ahead after an exact fill so the period that drains
        // the stream reports the end, not the silent period after it.
        if filled == out.len()
            && !out.is_empty()
            && !self.eos
            && !self.skip_pending
            && self.pending.is_none()
        {
            self.probe_eos();
        }

        if self.eos {
            for frame in &mut out[filled..] {
                *frame = [0, 0];
            }
        }

        filled
    }

    fn probe_eos(&mut self) {
        let (want, _) = self.clip_to_boundary(1);
        if want == 1 {
            let mut probe = [[0i16; 2]];
            if self.reader.read_frames(&mut probe) == 1 {
                self.consumed += 1;
                self.pending = Some(probe[0]);
                return;
            }
        }
        if !self.rewind() {
            self.eos = true;
        }
    }

    /// Frames readable before the loop boundary, and whether a full read of
    /// that many lands exactly on it.
    fn clip_to_boundary(&self, want: usize) -> (usize, bool) {
        if !self.looping || self.loop_length == 0 {
            return (want, false);
        }
        let end = self.loop_start.saturating_add(self.loop_length);
        let left = end.saturating_sub(self.consumed);
        if left >= want as u64 {
            (want, left == want as u64)
        } else {
            (left as usize, true)
        }
    }

    /// Consume one loop iteration. Returns false when no iteration remains.
    fn rewind(&mut self) -> bool {
        if !self.looping {
            return false;
        }
        match &mut self.repeat {
            Some(0) => return false,
            Some(n) => *n -= 1,
            None => {}
        }
        self.skip_pending = true;
        true
    }

    /// Reposition the reader to `loop_start`.
    ///
    /// Coarse readers may land early, so the difference is decoded away and
    /// discarded. Falls back to a rewind-from-zero when the direct seek
    /// misses or overshoots.
    fn skip_to_loop_start(&mut self) -> bool {
        let target = self.loop_start;
        let landed = match self.reader.seek_to(target) {
            Some(landed) if landed <= target => landed,
            _ => match self.reader.seek_to(0) {
                Some(0) => 0,
                _ => return false,
            },
        };

        let mut to_skip = target - landed;
        let mut scratch = [[0i16; 2]; SKIP_CHUNK];
        while to_skip > 0 {
            let want = to_skip.min(SKIP_CHUNK as u64) as usize;
            let got = self.reader.read_frames(&mut scratch[..want]);
            if got == 0 {
                return false;
            }
            to_skip -= got as u64;
        }
        self.consumed = target;
        true
    }
}

#[cfg(test)]
pub(crate) mod test_readers {
    use super::*;

    /// Stereo ramp where both samples of frame `n` hold the value `n`.
    pub(crate) struct RampReader {
        len: u64,
        pos: u64,
    }

    impl RampReader {
        pub(crate) fn new(len: u64) -> RampReader {
            RampReader { len, pos: 0 }
        }
    }

    impl PcmRead for RampReader {
        fn read_frames(&mut self, out: &mut [Frame]) -> usize {
            let left = (self.len - self.pos).min(out.len() as u64) as usize;
            for frame in &mut out[..left] {
                let value = self.pos as i16;
                *frame = [value, value];
                self.pos += 1;
            }
            left
        }

        fn seek_to(&mut self, frame: u64) -> Option<u64> {
            self.pos = frame.min(self.len);
            Some(self.pos)
        }
    }

    /// Fixed-length stream where every frame holds the same value.
    pub(crate) struct ConstReader {
        value: i16,
        len: u64,
        pos: u64,
    }

    impl ConstReader {
        pub(crate) fn new(value: i16, len: u64) -> ConstReader {
            ConstReader { value, len, pos: 0 }
        }
    }

    impl PcmRead for ConstReader {
        fn read_frames(&mut self, out: &mut [Frame]) -> usize {
            let left = (self.len - self.pos).min(out.len() as u64) as usize;
            for frame in &mut out[..left] {
                *frame = [self.value, self.value];
            }
            self.pos += left as u64;
            left
        }

        fn seek_to(&mut self, frame: u64) -> Option<u64> {
            self.pos = frame.min(self.len);
            Some(self.pos)
        }
    }

    /// One-second 440 Hz sine, duplicated into both channels like an
    /// upmixed mono stream.
    pub(crate) struct SineReader {
        len: u64,
        pos: u64,
    }

    impl SineReader {
        pub(crate) fn new(len: u64) -> SineReader {
            SineReader { len, pos: 0 }
        }
    }

    impl PcmRead for SineReader {
        fn read_frames(&mut self, out: &mut [Frame]) -> usize {
            let left = (self.len - self.pos).min(out.len() as u64) as usize;
            for frame in &mut out[..left] {
                let t = self.pos as f32 / crate::constants::SAMPLE_RATE as f32;
                let value = ((std::f32::consts::TAU * 440.0 * t).sin() * 12_000.0) as i16;
                *frame = [value, value];
                self.pos += 1;
            }
            left
        }

        fn seek_to(&mut self, frame: u64) -> Option<u64> {
            self.pos = frame.min(self.len);
            Some(self.pos)
        }
    }

    /// Ramp whose seeks land on multiples of `granule`, like a compressed
    /// stream seeking by page.
    pub(crate) struct CoarseRampReader {
        inner: RampReader,
        granule: u64,
    }

    impl CoarseRampReader {
        pub(crate) fn new(len: u64, granule: u64) -> CoarseRampReader {
            CoarseRampReader {
                inner: RampReader::new(len),
                granule,
            }
        }
    }

    impl PcmRead for CoarseRampReader {
        fn read_frames(&mut self, out: &mut [Frame]) -> usize {
            self.inner.read_frames(out)
        }

        fn seek_to(&mut self, frame: u64) -> Option<u64> {
            self.inner.seek_to(frame - frame % self.granule)
        }
    }

    /// Ramp that refuses every seek.
    pub(crate) struct UnseekableReader(pub(crate) RampReader);

    impl PcmRead for UnseekableReader {
        fn read_frames(&mut self, out: &mut [Frame]) -> usize {
            self.0.read_frames(out)
        }

        fn seek_to(&mut self, _frame: u64) -> Option<u64> {
            None
        }
    }
}
