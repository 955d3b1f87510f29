//! Focus servo: bang-bang comparator on the scaled position.

use lens_common::control::types::{FocusDrive, PositionSample, Scaling};
use tracing::trace;

/// Drive command for a position/target pair. Exact comparison, no deadband.
#[inline]
pub const fn decide(position: u32, target: u32) -> FocusDrive {
    if position > target {
        FocusDrive::Back
    } else if position < target {
        FocusDrive::Forward
    } else {
        FocusDrive::Stop
    }
}

/// Stateless per iteration apart from the last command, kept for
/// change logging and inspection.
#[derive(Debug, Clone)]
pub struct FocusServo {
    scaling: Scaling,
    last: FocusDrive,
    changes: u64,
}

impl FocusServo {
    pub const fn new(scaling: Scaling) -> Self {
        Self {
            scaling,
            last: FocusDrive::Stop,
            changes: 0,
        }
    }

    /// Command for the latest sample and the current target.
    pub fn update(&mut self, sample: &PositionSample, target: u32) -> FocusDrive {
        let position = self.scaling.position(sample);
        let command = decide(position, target);
        if command != self.last {
            self.changes += 1;
            trace!(position, target, ?command, "Focus drive changed");
            self.last = command;
        }
        command
    }

    #[inline]
    pub fn last_command(&self) -> FocusDrive {
        self.last
    }

    /// Number of command changes since creation.
    #[inline]
    pub fn changes(&self) -> u64 {
        self.changes
    }
}
