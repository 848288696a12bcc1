//! Fixed-size frame blocks exchanged with the output backend.

/// One sample instant across both channels: an interleaved L+R pair.
pub type Frame = [i16; 2];

/// One fixed-capacity block of interleaved stereo frames.
///
/// A period is the unit of refill: the real-time side fills one whole block,
/// then hands it to the output sink. Whoever holds the buffer owns it
/// exclusively for that moment.
#[derive(Debug, Clone)]
pub struct PeriodBuffer {
    frames: Vec<Frame>,
}

impl PeriodBuffer {
    /// A silent period of `frames` frames.
    pub fn new(frames: usize) -> Self {
        Self {
            frames: vec![[0, 0]; frames],
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    /// Overwrite the whole block with silence.
    pub fn fill_silence(&mut self) {
        self.frames.fill([0, 0]);
    }

    /// Interleaved f32 samples for the output boundary (rodio is f32-only).
    pub fn to_f32_samples(&self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.frames.len() * 2);
        for frame in &self.frames {
            samples.push(frame[0] as f32 / 32_768.0);
            samples.push(frame[1] as f32 / 32_768.0);
        }
        samples
    }
}
