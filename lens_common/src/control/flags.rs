//! Sticky status flags.
//!
//! Each subsystem owns one flag word. A bit is set by the owning context and
//! cleared either by a read-clear status query (`OVERRUN`) or by the
//! condition that resolves it (`ERROR`, `NOT_STARTED`).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Advisory status bits of one subsystem. Empty = OK.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Data was lost (receive FIFO or conversion overrun). Read-clear.
        const OVERRUN     = 0x01;
        /// Transfer error or non-zero link error counters.
        const ERROR       = 0x02;
        /// Subsystem has not completed its first cycle since init.
        const NOT_STARTED = 0x04;
        /// Bus peripheral reports bus-off. Needs external intervention.
        const BUS_OFF     = 0x08;
    }
}

impl StatusFlags {
    /// Bits that block the owning subsystem from being reported ready.
    pub const BLOCKING_MASK: Self =
        Self::from_bits_truncate(Self::NOT_STARTED.bits() | Self::ERROR.bits());

    /// Returns true if nothing blocks the subsystem.
    #[inline]
    pub const fn is_ready(&self) -> bool {
        !self.intersects(Self::BLOCKING_MASK)
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Owner of a flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Subsystem {
    /// Bus link handler.
    Bus = 0,
    /// Position sampler.
    Sampler = 1,
    /// Rotary sequencer.
    Sequencer = 2,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [Subsystem::Bus, Subsystem::Sampler, Subsystem::Sequencer];

    /// Index of the subsystem's flag word.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
