//! # Kanade Audio Library
//!
//! This library provides the multi-track streaming PCM mixer used by the
//! Kanade engine: five fixed tracks of 44.1 kHz 16-bit stereo audio, decoded
//! through Symphonia and played through rodio, with loop points, an
//! exponential gain curve, and a real-time side that never blocks the game's
//! logic thread.
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use kanade_lib::constants::TRACK_BGM;
//! use kanade_lib::{LoopSpec, Mixer, OutputSettings};
//!
//! let mut mixer = Mixer::new(&OutputSettings::default());
//! mixer.play_file(TRACK_BGM, Path::new("bgm.ogg"), LoopSpec::forever());
//! mixer.fade_volume(TRACK_BGM, 0.5, Duration::from_millis(800));
//! loop {
//!     mixer.tick();
//!     // ... run one frame of the game ...
//! }
//! ```

pub mod audio;
pub mod constants;
pub mod mixer;
pub mod playback;
pub mod source;

pub use audio::period::{Frame, PeriodBuffer};
pub use mixer::Mixer;
pub use playback::engine::{MixEngine, MixScratch, RefillSink};
pub use playback::output::AudioOutput;
pub use playback::settings::{OutputMode, OutputSettings};
pub use playback::sink::TrackVoice;
pub use source::{LoopSpec, LoopTags, PcmRead, PcmSource, StreamReader};
