//! High-level control surface for host game code.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;

use crate::constants::{DEFAULT_PERIOD_FRAMES, TRACK_COUNT};
use crate::playback::engine::MixEngine;
use crate::playback::output::AudioOutput;
use crate::playback::settings::OutputSettings;
use crate::source::{LoopSpec, PcmSource};

/// A volume ramp in progress on one track.
struct Fade {
    from: f32,
    to: f32,
    span: Duration,
    started: Instant,
}

/// The engine plus the device output, behind one handle.
///
/// Every method is meant for the host's logic thread and returns without
/// waiting on the real-time side. A mixer whose device failed to open keeps
/// answering every call; it just never makes a sound, and `is_finished`
/// reports true so nothing polls forever.
///
/// Track volumes here are logical: the engine sees `master * volume`, and
/// fades interpolate the logical value once per [`Mixer::tick`].
pub struct Mixer {
    engine: Arc<MixEngine>,
    output: Option<AudioOutput>,
    master: f32,
    volumes: [f32; TRACK_COUNT],
    fades: [Option<Fade>; TRACK_COUNT],
    playing: [Option<String>; TRACK_COUNT],
    paused: bool,
}

impl Mixer {
    /// Open the default device with `settings`.
    ///
    /// Falls back to a silent mixer when no device can be opened.
    pub fn new(settings: &OutputSettings) -> Mixer {
        let settings = settings.sanitized();
        let engine = Arc::new(MixEngine::new(settings.period_frames));
        let output = AudioOutput::open(engine.clone(), &settings);
        if output.is_none() {
            warn!("audio device unavailable, running silent");
        }
        Mixer::with_output(engine, output)
    }

    /// A mixer with no device at all.
    ///
    /// Every operation behaves normally and nothing sounds. Hosts use this
    /// when booting with audio disabled; tests use it to run without a
    /// device.
    pub fn silent() -> Mixer {
        let engine = Arc::new(MixEngine::new(DEFAULT_PERIOD_FRAMES));
        Mixer::with_output(engine, None)
    }

    fn with_output(engine: Arc<MixEngine>, output: Option<AudioOutput>) -> Mixer {
        Mixer {
            engine,
            output,
            master: 1.0,
            volumes: [1.0; TRACK_COUNT],
            fades: Default::default(),
            playing: Default::default(),
            paused: false,
        }
    }

    /// Open `path` and start it on `track`, replacing the current stream.
    ///
    /// False when the track index is out of range or the file cannot be
    /// opened as a mixable stream.
    pub fn play_file(&mut self, track: usize, path: &Path, spec: LoopSpec) -> bool {
        if track >= TRACK_COUNT {
            return false;
        }
        let source = match PcmSource::open(path, spec) {
            Some(source) => source,
            None => return false,
        };
        if !self.play(track, source) {
            return false;
        }
        self.playing[track] = Some(path.display().to_string());
        true
    }

    /// Start an already-open source on `track`.
    ///
    /// Cuts whatever was playing there, with no crossfade, and cancels any
    /// fade still running on the track.
    pub fn play(&mut self, track: usize, source: PcmSource) -> bool {
        if !self.engine.play(track, source) {
            return false;
        }
        self.fades[track] = None;
        self.playing[track] = None;
        self.push_volume(track);
        true
    }

    /// Stop `track`. Safe to call repeatedly.
    pub fn stop(&mut self, track: usize) -> bool {
        if !self.engine.stop(track) {
            return false;
        }
        self.fades[track] = None;
        self.playing[track] = None;
        true
    }

    /// Set `track`'s volume, canceling any fade on it.
    ///
    /// Remembered while the track is idle, so the first period of the next
    /// play already carries it.
    pub fn set_volume(&mut self, track: usize, vol: f32) -> bool {
        if track >= TRACK_COUNT {
            return false;
        }
        self.volumes[track] = vol.clamp(0.0, 1.0);
        self.fades[track] = None;
        self.push_volume(track);
        true
    }

    /// Ramp `track`'s volume to `target` over `span`.
    ///
    /// The ramp advances on [`Mixer::tick`]; a zero span applies at once.
    pub fn fade_volume(&mut self, track: usize, target: f32, span: Duration) -> bool {
        if track >= TRACK_COUNT {
            return false;
        }
        let target = target.clamp(0.0, 1.0);
        if span.is_zero() {
            return self.set_volume(track, target);
        }
        self.fades[track] = Some(Fade {
            from: self.volumes[track],
            to: target,
            span,
            started: Instant::now(),
        });
        true
    }

    /// Master volume applied on top of every track volume.
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master = vol.clamp(0.0, 1.0);
        for track in 0..TRACK_COUNT {
            self.push_volume(track);
        }
    }

    pub fn master_volume(&self) -> f32 {
        self.master
    }

    /// Advance fades and reap stale playing-name bookkeeping.
    ///
    /// Call once per game tick. Playback itself does not depend on the
    /// cadence; only fade smoothness and `playing_on` freshness do.
    pub fn tick(&mut self) {
        for track in 0..TRACK_COUNT {
            if let Some(fade) = &self.fades[track] {
                let volume = fade_value(fade.from, fade.to, fade.started.elapsed(), fade.span);
                let done = volume == fade.to;
                self.volumes[track] = volume;
                self.push_volume(track);
                if done {
                    self.fades[track] = None;
                }
            }
            if self.playing[track].is_some() && self.engine.is_finished(track) {
                self.playing[track] = None;
            }
        }
    }

    /// The file playing on `track`, while it still plays.
    pub fn playing_on(&self, track: usize) -> Option<&str> {
        self.playing.get(track)?.as_deref()
    }

    /// True once `track` has nothing left to play. Never blocks.
    pub fn is_finished(&self, track: usize) -> bool {
        match &self.output {
            Some(_) => self.engine.is_finished(track),
            None => true,
        }
    }

    /// Pause device consumption without touching track state.
    pub fn pause(&mut self) {
        if let Some(output) = &self.output {
            output.pause();
        }
        self.paused = true;
    }

    /// Resume after [`Mixer::pause`].
    pub fn resume(&mut self) {
        if let Some(output) = &self.output {
            output.resume();
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The engine behind this mixer, for callers wiring their own sink.
    pub fn engine(&self) -> &Arc<MixEngine> {
        &self.engine
    }

    fn push_volume(&self, track: usize) {
        self.engine.set_volume(track, self.master * self.volumes[track]);
    }
}

/// Where a fade sits at `elapsed` into its span.
fn fade_value(from: f32, to: f32, elapsed: Duration, span: Duration) -> f32 {
    if span.is_zero() || elapsed >= span {
        return to;
    }
    let t = elapsed.as_secs_f32() / span.as_secs_f32();
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_readers::ConstReader;
    use std::thread;

    fn const_source() -> PcmSource {
        PcmSource::from_reader(Box::new(ConstReader::new(100, 1000)), LoopSpec::once())
    }

    #[test]
    fn fade_value_interpolates_linearly() {
        let span = Duration::from_secs(10);
        assert_eq!(fade_value(0.0, 1.0, Duration::ZERO, span), 0.0);
        assert_eq!(fade_value(0.0, 1.0, Duration::from_secs(5), span), 0.5);
        assert_eq!(fade_value(1.0, 0.0, Duration::from_millis(2500), span), 0.75);
        assert_eq!(fade_value(0.0, 1.0, span, span), 1.0);
        assert_eq!(fade_value(0.0, 1.0, Duration::from_secs(11), span), 1.0);
        assert_eq!(fade_value(0.3, 0.9, Duration::ZERO, Duration::ZERO), 0.9);
    }

    #[test]
    fn silent_mixer_answers_every_operation() {
        let mut mixer = Mixer::silent();

        assert!(!mixer.play_file(0, Path::new("/no/such/file.ogg"), LoopSpec::once()));
        assert!(mixer.set_volume(0, 0.5));
        assert!(mixer.fade_volume(0, 1.0, Duration::from_millis(100)));
        assert!(mixer.play(0, const_source()));
        assert!(mixer.is_finished(0));
        assert!(mixer.stop(0));
        assert!(mixer.stop(0));
        mixer.pause();
        assert!(mixer.is_paused());
        mixer.resume();
        assert!(!mixer.is_paused());
        mixer.tick();
    }

    #[test]
    fn out_of_range_tracks_are_rejected() {
        let mut mixer = Mixer::silent();

        assert!(!mixer.play(TRACK_COUNT, const_source()));
        assert!(!mixer.stop(TRACK_COUNT));
        assert!(!mixer.set_volume(TRACK_COUNT, 0.5));
        assert!(!mixer.fade_volume(TRACK_COUNT, 0.5, Duration::from_secs(1)));
        assert!(mixer.is_finished(TRACK_COUNT));
        assert_eq!(mixer.playing_on(TRACK_COUNT), None);
    }

    #[test]
    fn volumes_reach_the_engine_scaled_by_master() {
        let mut mixer = Mixer::silent();

        assert!(mixer.set_volume(1, 0.5));
        assert_eq!(mixer.engine().track_volume(1), 0.5);

        mixer.set_master_volume(0.5);
        assert_eq!(mixer.engine().track_volume(1), 0.25);

        mixer.set_master_volume(1.0);
        assert_eq!(mixer.engine().track_volume(1), 0.5);
    }

    #[test]
    fn zero_span_fade_applies_immediately() {
        let mut mixer = Mixer::silent();
        assert!(mixer.fade_volume(2, 0.25, Duration::ZERO));
        assert_eq!(mixer.engine().track_volume(2), 0.25);
    }

    #[test]
    fn finished_fade_lands_on_its_target_and_clears() {
        let mut mixer = Mixer::silent();
        assert!(mixer.fade_volume(0, 0.5, Duration::from_millis(1)));

        thread::sleep(Duration::from_millis(5));
        mixer.tick();
        assert_eq!(mixer.engine().track_volume(0), 0.5);

        // A cleared fade no longer moves the volume.
        assert!(mixer.set_volume(0, 0.9));
        mixer.tick();
        assert_eq!(mixer.engine().track_volume(0), 0.9);
    }

    #[test]
    fn play_cancels_a_running_fade() {
        let mut mixer = Mixer::silent();
        assert!(mixer.set_volume(0, 0.8));
        assert!(mixer.fade_volume(0, 0.2, Duration::from_secs(10)));

        assert!(mixer.play(0, const_source()));
        mixer.tick();
        assert_eq!(mixer.engine().track_volume(0), 0.8);
    }

    #[test]
    fn silent_mixer_reports_finished_even_while_a_source_sits_idle() {
        let mut mixer = Mixer::silent();
        assert!(mixer.play(3, const_source()));

        // No device means nothing drains the track, but pollers must not
        // wait on it.
        assert!(!mixer.engine().is_finished(3));
        assert!(mixer.is_finished(3));
    }
}
