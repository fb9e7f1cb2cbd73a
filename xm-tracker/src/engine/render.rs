//! Buffer rendering

use tracing::debug;

use super::Tracker;

impl Tracker {
    /// Fill `left` and `right` with stereo frames
    ///
    /// Renders `min(left.len(), right.len())` frames, running a tick whenever
    /// the frame countdown expires. Once the song ends the rest of the
    /// buffers is silence. Returns the number of frames actually rendered.
    pub fn mix(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let frames = left.len().min(right.len());

        if self.ctx.end_of_song {
            left[..frames].fill(0.0);
            right[..frames].fill(0.0);
            return 0;
        }

        for i in 0..frames {
            if self.ctx.spd <= 0 {
                self.advance();
                if self.ctx.end_of_song {
                    left[i..frames].fill(0.0);
                    right[i..frames].fill(0.0);
                    self.arm_restart();
                    debug!(rendered = i, "song ended mid-buffer");
                    return i;
                }
                self.process_tick();
            }

            let (l, r) = self.mix_frame();
            left[i] = l;
            right[i] = r;
            self.ctx.spd -= 1;
        }

        frames
    }
}
