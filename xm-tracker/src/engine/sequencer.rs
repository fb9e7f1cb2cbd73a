//! Tick sequencing: rows, pattern flow and song position

use tracing::{debug, trace};

use super::Tracker;
use crate::context::PlaybackContext;
use crate::flags::TrackerFlags;

impl Tracker {
    /// Reset playback to the start of the song with fresh channel state
    pub fn initialize(&mut self) {
        self.ctx = PlaybackContext::new(&self.module, self.ctx.sample_rate);
    }

    /// Advance the clock by one tick and resolve row and pattern transitions
    ///
    /// After `initialize`, `jump` or an end of song the pending
    /// `RECALC_SPEED` restarts the current row at tick 0 instead.
    pub fn advance(&mut self) {
        if self.ctx.flags.contains(TrackerFlags::RECALC_SPEED) {
            let ctx = &mut self.ctx;
            ctx.flags.remove(TrackerFlags::RECALC_SPEED);
            ctx.flags |= TrackerFlags::NEW_TICK | TrackerFlags::NEW_ROW | TrackerFlags::NEW_PATTERN;
            ctx.tick = 0;
            ctx.spd = ctx.samples_per_tick();
        } else {
            self.advance_tick();
        }

        if self.ctx.row >= self.current_pattern_rows() {
            self.ctx.position += 1;
            self.ctx.row = 0;
            self.ctx.flags |= TrackerFlags::NEW_PATTERN;
            trace!(
                position = self.ctx.position,
                pattern = ?self.current_pattern_index(),
                "next pattern"
            );
        }

        if self.ctx.position >= self.module.song_length {
            if !self.ctx.end_of_song {
                debug!(position = self.ctx.position, "end of song");
            }
            self.ctx.end_of_song = true;
        }
    }

    fn advance_tick(&mut self) {
        let ctx = &mut self.ctx;
        ctx.spd = ctx.samples_per_tick();
        ctx.tick += 1;
        ctx.flags |= TrackerFlags::NEW_TICK;

        if ctx.tick < ctx.speed {
            return;
        }

        if ctx.pattern_delay > 0 {
            // hold the row for (delay + 1) row durations
            if u32::from(ctx.tick) < (u32::from(ctx.pattern_delay) + 1) * u32::from(ctx.speed) {
                ctx.pattern_wait += 1;
            } else {
                ctx.row += 1;
                ctx.tick = 0;
                ctx.flags |= TrackerFlags::NEW_ROW;
                ctx.pattern_delay = 0;
            }
        } else if ctx.flags.contains(TrackerFlags::LOOP_PATTERN) {
            ctx.row = ctx.loop_row;
            ctx.tick = 0;
            ctx.flags.retain(TrackerFlags::RESOLVE_KEEP);
            ctx.flags |= TrackerFlags::NEW_ROW;
        } else if ctx.flags.contains(TrackerFlags::PATTERN_JUMP) {
            trace!(from = ctx.position, to = ctx.pattern_jump, row = ctx.break_row, "pattern jump");
            ctx.position = ctx.pattern_jump;
            ctx.row = ctx.break_row;
            ctx.pattern_jump = 0;
            ctx.break_row = 0;
            ctx.tick = 0;
            ctx.flags.retain(TrackerFlags::RESOLVE_KEEP);
            ctx.flags |= TrackerFlags::NEW_ROW;
        } else {
            ctx.row += 1;
            ctx.tick = 0;
            ctx.flags |= TrackerFlags::NEW_ROW;
        }
    }

    /// Move playback by `delta` order positions, restarting at row 0
    ///
    /// The target is clamped to the song; running past the end marks the
    /// song as ended.
    pub fn jump(&mut self, delta: i32) {
        if delta == 0 {
            return;
        }

        let song_length = self.module.song_length as i32;
        let target = self.ctx.position as i32 + delta;

        let ctx = &mut self.ctx;
        ctx.position = target.clamp(0, (song_length - 1).max(0)) as u16;
        ctx.row = 0;
        ctx.tick = 0;
        ctx.spd = 0;
        ctx.flags = TrackerFlags::RECALC_SPEED;
        if target >= song_length {
            ctx.end_of_song = true;
        }

        debug!(delta, position = ctx.position, end_of_song = ctx.end_of_song, "jump");
    }

    /// Continue from position 0 after the song ended
    pub fn repeat(&mut self) {
        self.ctx.position = 0;
        self.ctx.end_of_song = false;
        debug!("repeat from start");
    }

    /// Park the sequencer so the next advance restarts a row cleanly
    ///
    /// The row is kept, so a break on the last position resumes at its
    /// target row once `repeat` rewinds the position.
    pub(crate) fn arm_restart(&mut self) {
        self.ctx.tick = 0;
        self.ctx.spd = 0;
        self.ctx.flags = TrackerFlags::RECALC_SPEED;
    }
}
