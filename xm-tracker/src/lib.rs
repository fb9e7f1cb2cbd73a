//! xm-tracker: XM playback engine
//!
//! Turns an [`XmModule`] into a stream of stereo `f32` frames, reproducing
//! FastTracker II note and effect semantics tick by tick.
//!
//! # Architecture
//!
//! - **PlaybackContext** - All mutable session state: position, row, tick,
//!   speed/BPM, global volume, pattern-flow registers, transition flags and
//!   one [`TrackerChannel`] per voice
//! - **Effects** - Stateless dispatch tables for general, E-sub and
//!   volume-column effects, plus the precomputed vibrato tables
//! - **Tracker** - Owns the context; advances ticks, runs the per-channel tick
//!   processor and mixes frames
//! - **XmPlayer** - Play/pause/stop/repeat facade for audio sinks and tools
//!
//! The engine is single-threaded and pull-driven: the caller asks for N
//! frames and gets them synchronously. Two songs playing at once need two
//! independent [`Tracker`]s.
//!
//! # Usage
//!
//! ```ignore
//! use xm_tracker::XmPlayer;
//!
//! let mut player = XmPlayer::new(44_100);
//! player.load(&std::fs::read("song.xm")?)?;
//! player.play();
//!
//! let mut left = vec![0.0; 1024];
//! let mut right = vec![0.0; 1024];
//! player.mix(&mut left, &mut right);
//! ```

mod channel;
mod context;
mod effects;
mod engine;
mod flags;
mod player;
mod utils;

pub use channel::TrackerChannel;
pub use context::PlaybackContext;
pub use effects::{EffectFn, Effects, VolumeEffectFn};
pub use engine::Tracker;
pub use flags::TrackerFlags;
pub use player::{PlayerState, XmPlayer};
pub use utils::{AMIGA_PERIODS, calc_period, period_to_frequency, samples_per_tick};

pub use xm_format::{XmError, XmModule};

/// Default XM speed (ticks per row)
pub const DEFAULT_SPEED: u16 = 6;

/// Highest speed a song may start with
pub const MAX_SPEED: u16 = 31;

/// Default XM tempo (BPM)
pub const DEFAULT_BPM: u16 = 125;

/// Full global and channel volume
pub const MAX_VOLUME: u8 = 64;

/// Value of a channel's fade-out counter right after a trigger
pub const FADE_OUT_START: u16 = 65535;
