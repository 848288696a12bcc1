//! Stream decoding behind the [`PcmRead`] seam.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use dasp_ring_buffer::Bounded;
use log::warn;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;

use crate::audio::period::Frame;
use crate::constants::SAMPLE_RATE;

use super::convert::frames_from_packet;

/// Interleaved samples held over from a packet that outran the caller.
const CARRY_CAPACITY: usize = 1 << 16;

/// A seekable supplier of 44.1 kHz stereo frames.
///
/// Backends return frames in the engine's native format so the pull path
/// never resamples. A return of zero from [`PcmRead::read_frames`] means the
/// stream is exhausted.
pub trait PcmRead: Send {
    /// Fill `out` from the front, returning how many frames were written.
    fn read_frames(&mut self, out: &mut [Frame]) -> usize;

    /// Seek to an absolute frame position and return the frame actually
    /// landed on. Coarse backends may land before the target.
    fn seek_to(&mut self, frame: u64) -> Option<u64>;
}

/// Loop points read from stream tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopTags {
    pub start: Option<u64>,
    pub length: Option<u64>,
}

impl LoopTags {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.length.is_none()
    }
}

/// Collect `LOOPSTART` / `LOOPLENGTH` values from a metadata revision.
///
/// Keys match case-insensitively and values are parsed as frame counts.
pub(crate) fn apply_loop_tags(revision: &MetadataRevision, tags: &mut LoopTags) {
    for tag in revision.tags() {
        if tag.key.eq_ignore_ascii_case("LOOPSTART") {
            tags.start = parse_tag_frames(&tag.value.to_string()).or(tags.start);
        } else if tag.key.eq_ignore_ascii_case("LOOPLENGTH") {
            tags.length = parse_tag_frames(&tag.value.to_string()).or(tags.length);
        }
    }
}

fn parse_tag_frames(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

/// Symphonia-backed reader for any probeable stream on disk.
pub struct StreamReader {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    carry: Bounded<Vec<i16>>,
    loop_tags: LoopTags,
}

impl StreamReader {
    /// Probe and open `path`, rejecting streams the engine cannot mix.
    ///
    /// Only 44.1 kHz mono or stereo streams are accepted. Failures are
    /// logged and reported as `None` so callers can degrade silently.
    pub fn open(path: &Path) -> Option<StreamReader> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!("could not open {}: {}", path.display(), err);
                return None;
            }
        };

        // Create the media source stream.
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a probe hint using the file's extension.
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let mut probed =
            match symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts) {
                Ok(probed) => probed,
                Err(err) => {
                    warn!("unsupported stream {}: {}", path.display(), err);
                    return None;
                }
            };

        let mut loop_tags = LoopTags::default();
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                apply_loop_tags(revision, &mut loop_tags);
            }
        }

        let mut format = probed.format;
        {
            let metadata = format.metadata();
            if let Some(revision) = metadata.current() {
                apply_loop_tags(revision, &mut loop_tags);
            }
        }

        // Find the first audio track with a known (decodeable) codec.
        let track = match format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        {
            Some(track) => track,
            None => {
                warn!("no decodable audio track in {}", path.display());
                return None;
            }
        };
        let track_id = track.id;
        let params = track.codec_params.clone();

        let rate = params.sample_rate.unwrap_or(0);
        if rate != SAMPLE_RATE {
            warn!("{}: sample rate {} is not {}", path.display(), rate, SAMPLE_RATE);
            return None;
        }
        let channel_count = params.channels.map_or(0, |channels| channels.count());
        if channel_count == 0 || channel_count > 2 {
            warn!("{}: unsupported channel count {}", path.display(), channel_count);
            return None;
        }

        let decoder = match symphonia::default::get_codecs().make(&params, &DecoderOptions::default())
        {
            Ok(decoder) => decoder,
            Err(err) => {
                warn!("unsupported codec in {}: {}", path.display(), err);
                return None;
            }
        };

        Some(StreamReader {
            format,
            decoder,
            track_id,
            carry: Bounded::from(vec![0i16; CARRY_CAPACITY]),
            loop_tags,
        })
    }

    /// Loop points found in the stream's tags, if any.
    pub fn loop_tags(&self) -> LoopTags {
        self.loop_tags
    }

    /// Decode packets until the carry buffer holds at least one frame.
    ///
    /// Returns `false` once the stream is exhausted. Corrupt packets are
    /// skipped the way Symphonia recommends.
    fn decode_into_carry(&mut self) -> bool {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => {
                    return false;
                }
                Err(Error::ResetRequired) => return false,
                Err(err) => {
                    warn!("packet read failed: {}", err);
                    return false;
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let frames = frames_from_packet(&decoded);
                    for frame in frames {
                        if self.carry.max_len() - self.carry.len() < 2 {
                            warn!("carry buffer full, dropping samples");
                            break;
                        }
                        self.carry.push(frame[0]);
                        self.carry.push(frame[1]);
                    }
                    if self.carry.len() >= 2 {
                        return true;
                    }
                }
                Err(Error::DecodeError(err)) => {
                    warn!("decode error: {}", err);
                }
                Err(err) => {
                    warn!("error: {}", err);
                    return false;
                }
            }
        }
    }
}

impl PcmRead for StreamReader {
    fn read_frames(&mut self, out: &mut [Frame]) -> usize {
        let mut filled = 0;
        while filled < out.len() {
            if self.carry.len() < 2 && !self.decode_into_carry() {
                break;
            }
            match (self.carry.pop(), self.carry.pop()) {
                (Some(left), Some(right)) => {
                    out[filled] = [left, right];
                    filled += 1;
                }
                _ => break,
            }
        }
        filled
    }

    fn seek_to(&mut self, frame: u64) -> Option<u64> {
        let seeked = match self.format.seek(
            SeekMode::Coarse,
            SeekTo::TimeStamp {
                ts: frame,
                track_id: self.track_id,
            },
        ) {
            Ok(seeked) => seeked,
            Err(err) => {
                warn!("seek failed: {}", err);
                return None;
            }
        };
        self.decoder.reset();
        while self.carry.pop().is_some() {}
        Some(seeked.actual_ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::meta::{MetadataBuilder, Tag, Value};

    fn revision_with(tags: &[(&str, Value)]) -> MetadataRevision {
        let mut builder = MetadataBuilder::new();
        for (key, value) in tags {
            builder.add_tag(Tag::new(None, key, value.clone()));
        }
        builder.metadata()
    }

    #[test]
    fn loop_tags_parse_case_insensitively() {
        let revision = revision_with(&[
            ("loopstart", Value::String("1000".into())),
            ("LoopLength", Value::String("  2000 ".into())),
        ]);
        let mut tags = LoopTags::default();
        apply_loop_tags(&revision, &mut tags);
        assert_eq!(tags.start, Some(1000));
        assert_eq!(tags.length, Some(2000));
    }

    #[test]
    fn numeric_tag_values_parse() {
        let revision = revision_with(&[("LOOPSTART", Value::UnsignedInt(441))]);
        let mut tags = LoopTags::default();
        apply_loop_tags(&revision, &mut tags);
        assert_eq!(tags.start, Some(441));
        assert_eq!(tags.length, None);
    }

    #[test]
    fn malformed_tag_values_are_ignored() {
        let revision = revision_with(&[
            ("LOOPSTART", Value::String("soon".into())),
            ("LOOPLENGTH", Value::String("-5".into())),
        ]);
        let mut tags = LoopTags::default();
        apply_loop_tags(&revision, &mut tags);
        assert!(tags.is_empty());
    }

    #[test]
    fn unrelated_tags_do_not_set_loop_points() {
        let revision = revision_with(&[("TITLE", Value::String("1000".into()))]);
        let mut tags = LoopTags::default();
        apply_loop_tags(&revision, &mut tags);
        assert!(tags.is_empty());
    }
}
