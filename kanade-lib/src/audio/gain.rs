//! Volume curve and 16-bit sample arithmetic.

use crate::audio::period::Frame;

/// Map a linear 0..1 volume control to a per-sample multiplier.
///
/// The curve is exponential so perceived loudness tracks the control roughly
/// linearly: 0 maps to silence, 1 maps to unity gain, never above it.
pub fn scale(vol: f32) -> f32 {
    let vol = vol.clamp(0.0, 1.0);
    (10f32.powf(vol) - 1.0) / (10.0 - 1.0)
}

/// Clamp a widened sample back into the signed 16-bit range.
pub fn clamp_i16(sample: i32) -> i16 {
    sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Scale every sample of `frames` in place by `k`.
pub fn scale_frames(frames: &mut [Frame], k: f32) {
    for frame in frames {
        for sample in frame {
            *sample = clamp_i16((*sample as f32 * k) as i32);
        }
    }
}

/// Accumulate `frames`, scaled by `k`, into the wide mix buffer.
///
/// Accumulation stays in 32 bits; [`write_clamped`] clamps once after every
/// track has been summed.
pub fn accumulate(acc: &mut [[i32; 2]], frames: &[Frame], k: f32) {
    for (wide, frame) in acc.iter_mut().zip(frames) {
        wide[0] += (frame[0] as f32 * k) as i32;
        wide[1] += (frame[1] as f32 * k) as i32;
    }
}

/// Clamp the wide mix buffer down into output frames.
pub fn write_clamped(acc: &[[i32; 2]], out: &mut [Frame]) {
    for (frame, wide) in out.iter_mut().zip(acc) {
        *frame = [clamp_i16(wide[0]), clamp_i16(wide[1])];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_endpoints_are_silence_and_unity() {
        assert_eq!(scale(0.0), 0.0);
        assert!((scale(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scale_is_monotonic() {
        let mut previous = scale(0.0);
        for step in 1..=100 {
            let value = scale(step as f32 / 100.0);
            assert!(value >= previous, "curve dipped at step {}", step);
            previous = value;
        }
    }

    #[test]
    fn scale_clamps_out_of_range_controls() {
        assert_eq!(scale(-2.0), scale(0.0));
        assert_eq!(scale(7.5), scale(1.0));
    }

    #[test]
    fn scale_never_boosts() {
        for step in 0..=100 {
            assert!(scale(step as f32 / 100.0) <= 1.0);
        }
    }

    #[test]
    fn clamp_i16_limits_both_extremes() {
        assert_eq!(clamp_i16(40_000), 32_767);
        assert_eq!(clamp_i16(-40_000), -32_768);
        assert_eq!(clamp_i16(1_234), 1_234);
    }

    #[test]
    fn scale_frames_applies_to_both_channels() {
        let k = scale(0.5);
        let mut frames = [[10_000i16, -10_000i16]];
        scale_frames(&mut frames, k);
        let expected = clamp_i16((10_000.0 * k) as i32);
        assert_eq!(frames[0], [expected, -expected]);
    }

    #[test]
    fn scale_frames_at_zero_silences() {
        let mut frames = [[32_767i16, -32_768i16], [1, -1]];
        scale_frames(&mut frames, scale(0.0));
        assert_eq!(frames, [[0, 0], [0, 0]]);
    }

    #[test]
    fn accumulate_clamps_after_summation_not_per_track() {
        let mut acc = [[0i32; 2]; 1];
        accumulate(&mut acc, &[[30_000, -30_000]], 1.0);
        accumulate(&mut acc, &[[30_000, -30_000]], 1.0);
        assert_eq!(acc[0], [60_000, -60_000]);

        let mut out = [[0i16; 2]; 1];
        write_clamped(&acc, &mut out);
        assert_eq!(out[0], [32_767, -32_768]);
    }

    #[test]
    fn accumulate_applies_per_track_scale() {
        let mut acc = [[0i32; 2]; 2];
        accumulate(&mut acc, &[[1_000, 2_000], [3_000, 4_000]], scale(1.0));
        assert_eq!(acc[0][0], (1_000.0 * scale(1.0)) as i32);
        assert_eq!(acc[1][1], (4_000.0 * scale(1.0)) as i32);
    }
}
