//! Real-time playback.
//!
//! This module glues together several submodules:
//!
//! - [`engine`]: the fixed track array and the period mixer
//! - [`output`]: the rodio-backed device layer in both sink styles
//! - [`settings`]: output configuration loaded from JSON
//! - [`sink`]: the endless rodio source used by per-voice output
//!
//! `track` stays private: one slot of the engine's array, reachable only
//! through [`engine::MixEngine`].

pub mod engine;
pub mod output;
pub mod settings;
pub mod sink;

mod track;
