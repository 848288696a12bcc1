//! Decoded-packet conversion into the engine's interleaved 16-bit frames.

use symphonia::core::audio::{AudioBufferRef, Signal};

use crate::audio::period::Frame;

/// Convert an unsigned 8-bit sample to `i16`.
pub fn convert_unsigned_8bit_to_i16(sample: u8) -> i16 {
    ((sample as i16) - 128) << 8
}

/// Convert a signed 8-bit sample to `i16`.
pub fn convert_signed_8bit_to_i16(sample: i8) -> i16 {
    (sample as i16) << 8
}

/// Convert an unsigned 16-bit sample to `i16`.
pub fn convert_unsigned_16bit_to_i16(sample: u16) -> i16 {
    (sample as i32 - 32_768) as i16
}

/// Convert an unsigned 24-bit sample stored in a `u32` to `i16`.
pub fn convert_unsigned_24bit_to_i16(sample: u32) -> i16 {
    ((sample as i32 - (1 << 23)) >> 8) as i16
}

/// Convert a signed 24-bit sample stored in an `i32` to `i16`.
pub fn convert_signed_24bit_to_i16(sample: i32) -> i16 {
    // The 24-bit sample sits in the least significant bits.
    ((sample << 8 >> 8) >> 8) as i16
}

/// Convert an unsigned 32-bit sample to `i16`.
pub fn convert_unsigned_32bit_to_i16(sample: u32) -> i16 {
    ((sample >> 16) as i32 - 32_768) as i16
}

/// Convert a signed 32-bit sample to `i16`.
pub fn convert_signed_32bit_to_i16(sample: i32) -> i16 {
    (sample >> 16) as i16
}

/// Convert a float sample to `i16`.
pub fn convert_f32_to_i16(sample: f32) -> i16 {
    (sample * 32_768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn interleave<S: Copy>(
    left: &[S],
    right: Option<&[S]>,
    convert: impl Fn(S) -> i16,
    out: &mut Vec<Frame>,
) {
    match right {
        Some(right) => {
            for (l, r) in left.iter().zip(right) {
                out.push([convert(*l), convert(*r)]);
            }
        }
        None => {
            for sample in left {
                let value = convert(*sample);
                out.push([value, value]);
            }
        }
    }
}

/// Interleave a decoded packet into stereo frames.
///
/// Mono packets are duplicated into both channels; channels beyond the first
/// two are dropped.
pub fn frames_from_packet(decoded: &AudioBufferRef<'_>) -> Vec<Frame> {
    let stereo = decoded.spec().channels.count() > 1;
    let right = stereo.then_some(1);
    let mut out = Vec::with_capacity(decoded.frames());
    match decoded {
        AudioBufferRef::U8(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            convert_unsigned_8bit_to_i16,
            &mut out,
        ),
        AudioBufferRef::U16(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            convert_unsigned_16bit_to_i16,
            &mut out,
        ),
        AudioBufferRef::U24(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            |s| convert_unsigned_24bit_to_i16(s.0),
            &mut out,
        ),
        AudioBufferRef::U32(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            convert_unsigned_32bit_to_i16,
            &mut out,
        ),
        AudioBufferRef::S8(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            convert_signed_8bit_to_i16,
            &mut out,
        ),
        AudioBufferRef::S16(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            |s| s,
            &mut out,
        ),
        AudioBufferRef::S24(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            |s| convert_signed_24bit_to_i16(s.0),
            &mut out,
        ),
        AudioBufferRef::S32(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            convert_signed_32bit_to_i16,
            &mut out,
        ),
        AudioBufferRef::F32(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            convert_f32_to_i16,
            &mut out,
        ),
        AudioBufferRef::F64(buf) => interleave(
            buf.chan(0),
            right.map(|c| buf.chan(c)),
            |s| convert_f32_to_i16(s as f32),
            &mut out,
        ),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{AsAudioBufferRef, AudioBuffer, Channels, SignalSpec};

    #[test]
    fn mono_packets_duplicate_into_both_channels() {
        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT);
        let mut buf = AudioBuffer::<i16>::new(4, spec);
        buf.render_reserved(Some(4));
        buf.chan_mut(0).copy_from_slice(&[1, -2, 3, -4]);

        let frames = frames_from_packet(&buf.as_audio_buffer_ref());
        assert_eq!(frames, vec![[1, 1], [-2, -2], [3, 3], [-4, -4]]);
    }

    #[test]
    fn stereo_packets_keep_channels_independent() {
        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buf = AudioBuffer::<f32>::new(2, spec);
        buf.render_reserved(Some(2));
        buf.chan_mut(0).copy_from_slice(&[0.5, -1.0]);
        buf.chan_mut(1).copy_from_slice(&[-0.5, 1.0]);

        let frames = frames_from_packet(&buf.as_audio_buffer_ref());
        assert_eq!(frames, vec![[16_384, -16_384], [-32_768, 32_767]]);
    }

    #[test]
    fn unsigned_8bit_centers_on_zero() {
        assert_eq!(convert_unsigned_8bit_to_i16(128), 0);
        assert_eq!(convert_unsigned_8bit_to_i16(0), -32_768);
        assert_eq!(convert_unsigned_8bit_to_i16(255), 32_512);
    }

    #[test]
    fn signed_24bit_keeps_sign() {
        assert_eq!(convert_signed_24bit_to_i16(0x7F_FF_FF), 32_767);
        assert_eq!(convert_signed_24bit_to_i16(0x80_00_00), -32_768);
        assert_eq!(convert_signed_24bit_to_i16(0), 0);
    }

    #[test]
    fn float_conversion_clamps_overdrive() {
        assert_eq!(convert_f32_to_i16(1.5), 32_767);
        assert_eq!(convert_f32_to_i16(-1.5), -32_768);
        assert_eq!(convert_f32_to_i16(0.0), 0);
    }
}
