//! Shared constants for the engine's fixed output format.

/// Output sample rate (Hz). Sources are expected to match it.
pub const SAMPLE_RATE: u32 = 44_100;

/// Output channel count. Mono sources are upmixed by duplication.
pub const CHANNELS: u16 = 2;

/// Number of track slots owned by the engine.
pub const TRACK_COUNT: usize = 5;

/// Background music slot.
pub const TRACK_BGM: usize = 0;
/// Sound-effect slot.
pub const TRACK_SE: usize = 1;
/// Voice slot.
pub const TRACK_VOICE: usize = 2;
/// First system slot.
pub const TRACK_SYS1: usize = 3;
/// Second system slot.
pub const TRACK_SYS2: usize = 4;

/// Default frames per period (0.25 s at 44.1 kHz).
pub const DEFAULT_PERIOD_FRAMES: usize = 11_025;

/// Default number of periods queued ahead of playback.
pub const DEFAULT_QUEUE_PERIODS: usize = 4;
