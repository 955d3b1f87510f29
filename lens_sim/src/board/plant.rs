//! Plant model: focus carriage and rotary axis pairs.

use lens_common::control::types::{AxisDrive, FocusDrive, Phase};

/// Travel below which an axis pair counts as retracted.
const RETRACTED: f64 = 0.01;
/// Travel above which an axis pair counts as extended.
const EXTENDED: f64 = 0.99;

/// Focus carriage driven by a bang-bang H-bridge.
#[derive(Debug, Clone)]
pub(crate) struct FocusPlant {
    position: f64,
    limit: f64,
    slew_per_ms: f64,
    pub(crate) enabled: bool,
    pub(crate) drive: FocusDrive,
}

impl FocusPlant {
    pub(crate) fn new(position_raw: u32, limit_raw: u32, slew_per_ms: f64) -> Self {
        let limit = f64::from(limit_raw);
        Self {
            position: f64::from(position_raw).min(limit),
            limit,
            slew_per_ms,
            enabled: false,
            drive: FocusDrive::Stop,
        }
    }

    pub(crate) fn integrate(&mut self, dt_us: u64) {
        if !self.enabled {
            return;
        }
        let step = self.slew_per_ms * dt_us as f64 / 1000.0;
        self.position = match self.drive {
            FocusDrive::Forward => (self.position + step).min(self.limit),
            FocusDrive::Back => (self.position - step).max(0.0),
            FocusDrive::Stop => self.position,
        };
    }

    /// Position as the converter would read it.
    pub(crate) fn position_raw(&self) -> u32 {
        self.position.round() as u32
    }

    pub(crate) fn set_position_raw(&mut self, raw: u32) {
        self.position = f64::from(raw).min(self.limit);
    }
}

/// Two axis pairs, each travelling between retracted (0) and extended (1).
#[derive(Debug, Clone)]
pub(crate) struct RotaryPlant {
    pub(crate) travel: (f64, f64),
    rate_per_ms: f64,
    pub(crate) enabled: bool,
    pub(crate) drive: (AxisDrive, AxisDrive),
}

impl RotaryPlant {
    pub(crate) fn new(travel: (f64, f64), rate_per_ms: f64) -> Self {
        Self {
            travel: (travel.0.clamp(0.0, 1.0), travel.1.clamp(0.0, 1.0)),
            rate_per_ms,
            enabled: false,
            drive: (AxisDrive::Idle, AxisDrive::Idle),
        }
    }

    pub(crate) fn integrate(&mut self, dt_us: u64) {
        if !self.enabled {
            return;
        }
        let step = self.rate_per_ms * dt_us as f64 / 1000.0;
        self.travel.0 = move_axis(self.travel.0, self.drive.0, step);
        self.travel.1 = move_axis(self.travel.1, self.drive.1, step);
    }
}

fn move_axis(travel: f64, drive: AxisDrive, step: f64) -> f64 {
    (travel + f64::from(drive.signum()) * step).clamp(0.0, 1.0)
}

/// Phase the mechanism physically sits in, derived from axis end positions.
///
/// Returns `None` while an axis is between its end stops or both are
/// extended.
pub fn mechanical_phase(travel: (f64, f64)) -> Option<Phase> {
    let (a, b) = travel;
    match (a <= RETRACTED, a >= EXTENDED, b <= RETRACTED, b >= EXTENDED) {
        (true, _, true, _) => Some(Phase::Phase0),
        (_, true, true, _) => Some(Phase::Phase1),
        (true, _, _, true) => Some(Phase::Phase2),
        _ => None,
    }
}
