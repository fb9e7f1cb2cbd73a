//! Playback facade for audio sinks and tools
//!
//! [`XmPlayer`] owns one [`Tracker`] and adds the transport a caller needs:
//! play/pause/stop, repeat at end of song, and read-only views for display.

use tracing::{debug, info};
use xm_format::{CellView, XmError, XmModule, parse_xm};

use crate::engine::Tracker;

/// Transport state of a player with a module loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Loaded, not started
    Ready,
    Playing,
    Paused,
    /// Stopped by the caller or by the end of the song
    Stopped,
}

/// Module player with transport controls
pub struct XmPlayer {
    sample_rate: u32,
    tracker: Option<Tracker>,
    state: PlayerState,
    repeat: bool,
}

impl XmPlayer {
    /// Empty player rendering at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            tracker: None,
            state: PlayerState::Ready,
            repeat: false,
        }
    }

    /// Parse and load a module; the previous one is dropped only on success
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), XmError> {
        let module = parse_xm(bytes)?;
        self.load_module(module);
        Ok(())
    }

    /// Load an already parsed module
    pub fn load_module(&mut self, module: XmModule) {
        info!(
            title = %module.name,
            channels = module.num_channels,
            song_length = module.song_length,
            "module loaded"
        );
        self.tracker = Some(Tracker::new(module, self.sample_rate));
        self.state = PlayerState::Ready;
    }

    /// Transport state, `None` when no module is loaded
    pub fn state(&self) -> Option<PlayerState> {
        self.tracker.as_ref().map(|_| self.state)
    }

    pub fn is_playing(&self) -> bool {
        self.state() == Some(PlayerState::Playing)
    }

    /// Start or resume; a stopped song restarts from the top
    pub fn play(&mut self) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };

        match self.state {
            PlayerState::Ready | PlayerState::Paused => {}
            PlayerState::Stopped => tracker.initialize(),
            PlayerState::Playing => return,
        }
        self.state = PlayerState::Playing;
        debug!("play");
    }

    /// Toggle between playing and paused
    pub fn pause(&mut self) {
        self.state = match self.state {
            PlayerState::Playing => PlayerState::Paused,
            PlayerState::Paused => PlayerState::Playing,
            other => other,
        };
    }

    pub fn stop(&mut self) {
        if self.tracker.is_some() {
            self.state = PlayerState::Stopped;
            debug!("stop");
        }
    }

    /// Restart from position 0 at the end of the song instead of stopping
    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Move by `delta` order positions; running off the end stops playback
    pub fn jump(&mut self, delta: i32) {
        let Some(tracker) = self.tracker.as_mut() else {
            return;
        };
        tracker.jump(delta);
        if tracker.is_end_of_song() {
            self.state = PlayerState::Stopped;
        }
    }

    /// Render into both buffers; silence unless playing
    ///
    /// Returns the number of frames the song produced.
    pub fn mix(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let frames = left.len().min(right.len());

        let tracker = match self.tracker.as_mut() {
            Some(tracker) if self.state == PlayerState::Playing => tracker,
            _ => {
                left[..frames].fill(0.0);
                right[..frames].fill(0.0);
                return 0;
            }
        };

        let rendered = tracker.mix(left, right);

        if tracker.is_end_of_song() {
            if self.repeat {
                tracker.repeat();
            } else {
                info!("song finished");
                self.state = PlayerState::Stopped;
            }
        }

        rendered
    }

    // --- Introspection ---

    pub fn tracker(&self) -> Option<&Tracker> {
        self.tracker.as_ref()
    }

    pub fn module(&self) -> Option<&XmModule> {
        self.tracker.as_ref().map(Tracker::module)
    }

    pub fn title(&self) -> &str {
        self.module().map_or("", |m| m.name.as_str())
    }

    pub fn row(&self) -> u16 {
        self.tracker.as_ref().map_or(0, Tracker::row)
    }

    pub fn position(&self) -> u16 {
        self.tracker.as_ref().map_or(0, Tracker::position)
    }

    pub fn tick(&self) -> u16 {
        self.tracker.as_ref().map_or(0, Tracker::tick)
    }

    pub fn speed(&self) -> u16 {
        self.tracker.as_ref().map_or(0, Tracker::speed)
    }

    pub fn bpm(&self) -> u16 {
        self.tracker.as_ref().map_or(0, Tracker::bpm)
    }

    pub fn song_length(&self) -> u16 {
        self.module().map_or(0, |m| m.song_length)
    }

    pub fn num_channels(&self) -> u8 {
        self.module().map_or(0, |m| m.num_channels)
    }

    pub fn is_end_of_song(&self) -> bool {
        self.tracker.as_ref().is_some_and(Tracker::is_end_of_song)
    }

    /// Pattern index at the current position
    pub fn current_pattern_index(&self) -> Option<u8> {
        self.tracker.as_ref()?.current_pattern_index()
    }

    /// Check if a channel's key is held
    pub fn is_note_on(&self, channel: usize) -> bool {
        self.tracker
            .as_ref()
            .and_then(|t| t.channel(channel))
            .is_some_and(|ch| ch.note_on)
    }

    /// Instrument index (0-based) active on a channel
    pub fn current_instrument(&self, channel: usize) -> Option<usize> {
        self.tracker.as_ref()?.channel(channel)?.instrument
    }

    /// Sample index within the active instrument
    pub fn current_sample(&self, channel: usize) -> Option<usize> {
        self.tracker.as_ref()?.channel(channel)?.sample
    }

    pub fn instrument_names(&self) -> Vec<&str> {
        self.module()
            .map(|m| m.instruments.iter().map(|i| i.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Display cells of the pattern at an order position, as `[row][channel]`
    pub fn pattern_view(&self, position: u16) -> Option<Vec<Vec<CellView>>> {
        let pattern = self.module()?.pattern_at_order(position)?;
        Some(
            pattern
                .notes
                .iter()
                .map(|row| row.iter().map(CellView::from).collect())
                .collect(),
        )
    }
}
