//! Phase, drive and sample types.
//!
//! All enums use `#[repr]` discriminants matching their wire or pin-level
//! encoding so they can be converted without lookup tables.

use serde::{Deserialize, Serialize};

use crate::consts::{FOCUS_DIVIDER, SAMPLE_MASK};

// ─── Rotary selector ────────────────────────────────────────────────

/// Position of the three-position rotary selector.
///
/// The discriminant is the value carried in the rotary field of command and
/// status payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Phase {
    /// Home position, both axis pairs retracted.
    #[default]
    Phase0 = 0,
    /// Axis A extended.
    Phase1 = 1,
    /// Axis B extended.
    Phase2 = 2,
}

impl Phase {
    /// Every defined phase, in discriminant order.
    pub const ALL: [Phase; 3] = [Phase::Phase0, Phase::Phase1, Phase::Phase2];

    /// Convert from raw `u8`. Returns `None` for undefined selector values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Phase0),
            1 => Some(Self::Phase1),
            2 => Some(Self::Phase2),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

// ─── Drive commands ─────────────────────────────────────────────────

/// Direction command for one rotary axis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(i8)]
pub enum AxisDrive {
    /// Drive toward the retracted end stop.
    Reverse = -1,
    /// Both bridge legs released.
    #[default]
    Idle = 0,
    /// Drive toward the extended end stop.
    Forward = 1,
}

impl AxisDrive {
    /// Signed direction (`-1`, `0`, `1`).
    #[inline]
    pub const fn signum(self) -> i8 {
        self as i8
    }
}

/// Direction command for the focus motor.
///
/// A single enum value per command: forward and back can never be issued
/// together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FocusDrive {
    /// Decrease the position value.
    Back,
    /// Hold position.
    #[default]
    Stop,
    /// Increase the position value.
    Forward,
}

// ─── Position sampling ──────────────────────────────────────────────

/// One completed conversion sequence of the three sampled channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionSample {
    /// Focus potentiometer counts.
    pub position_raw: u32,
    /// Internal temperature sensor counts.
    pub temperature_raw: u32,
    /// Internal reference voltage counts.
    pub reference_raw: u32,
}

impl PositionSample {
    pub const fn new(position_raw: u32, temperature_raw: u32, reference_raw: u32) -> Self {
        Self {
            position_raw,
            temperature_raw,
            reference_raw,
        }
    }
}

/// Conversion from raw counts to the scaled position unit.
///
/// `scaled = (raw & mask) / divider`. The divider is never zero once the
/// owning configuration has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    /// Significant bits of a raw sample.
    pub mask: u32,
    /// Integer divider applied after masking.
    pub divider: u32,
}

impl Scaling {
    pub const fn new(mask: u32, divider: u32) -> Self {
        Self { mask, divider }
    }

    /// Scale a raw position word.
    #[inline]
    pub const fn scale(&self, raw: u32) -> u32 {
        if self.divider == 0 {
            return 0;
        }
        (raw & self.mask) / self.divider
    }

    /// Scaled position value of a sample.
    #[inline]
    pub const fn position(&self, sample: &PositionSample) -> u32 {
        self.scale(sample.position_raw)
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self::new(SAMPLE_MASK, FOCUS_DIVIDER)
    }
}
