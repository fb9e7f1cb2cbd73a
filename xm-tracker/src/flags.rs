//! Transition flags raised while advancing ticks and processing effects

/// Bit set describing what changed on the current tick
///
/// The low bits (`NEW_TICK`, `NEW_ROW`, `NEW_PATTERN`) are transient and are
/// cleared after every tick. `PATTERN_JUMP`, `GLOBAL` and `LOOP_PATTERN` are
/// requests raised by effects and survive until the sequencer resolves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerFlags(u8);

impl TrackerFlags {
    /// A tick boundary was crossed
    pub const NEW_TICK: Self = Self(0x01);
    /// A row boundary was crossed
    pub const NEW_ROW: Self = Self(0x02);
    /// Samples-per-tick must be recomputed before the next frame
    pub const RECALC_SPEED: Self = Self(0x04);
    /// A pattern (order position) boundary was crossed
    pub const NEW_PATTERN: Self = Self(0x08);
    /// Bxx or Dxx requested a jump at the end of the row
    pub const PATTERN_JUMP: Self = Self(0x10);
    /// Global state changed
    pub const GLOBAL: Self = Self(0x20);
    /// E6x requested a jump back to the loop row
    pub const LOOP_PATTERN: Self = Self(0x40);

    /// Bits that survive the end-of-tick clear
    pub const PERSISTENT: Self = Self(0x70);
    /// Bits kept when a jump or loop request is resolved
    pub const RESOLVE_KEEP: Self = Self(0xA1);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// All bits of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Any bit of `other` is set
    pub const fn intersects(&self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Keep only the bits in `mask`
    pub fn retain(&mut self, mask: Self) {
        self.0 &= mask.0;
    }
}

impl std::ops::BitOr for TrackerFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TrackerFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_tick_clear_keeps_requests() {
        let mut flags = TrackerFlags::NEW_TICK | TrackerFlags::NEW_ROW | TrackerFlags::PATTERN_JUMP;
        flags.retain(TrackerFlags::PERSISTENT);
        assert_eq!(flags, TrackerFlags::PATTERN_JUMP);
    }

    #[test]
    fn test_resolve_drops_jump_and_loop() {
        let mut flags = TrackerFlags::NEW_TICK | TrackerFlags::LOOP_PATTERN | TrackerFlags::GLOBAL;
        flags.retain(TrackerFlags::RESOLVE_KEEP);
        flags |= TrackerFlags::NEW_ROW;
        assert!(flags.contains(TrackerFlags::NEW_TICK | TrackerFlags::GLOBAL | TrackerFlags::NEW_ROW));
        assert!(!flags.intersects(TrackerFlags::LOOP_PATTERN | TrackerFlags::PATTERN_JUMP));
    }

    #[test]
    fn test_insert_remove() {
        let mut flags = TrackerFlags::empty();
        flags.insert(TrackerFlags::RECALC_SPEED);
        assert!(flags.contains(TrackerFlags::RECALC_SPEED));
        flags.remove(TrackerFlags::RECALC_SPEED);
        assert_eq!(flags.bits(), 0);
    }
}
