//! Shared rig: controller on a simulation board, stepped in fixed ticks.

use lens_common::control::config::LensConfig;
use lens_control::sim::SimController;
use lens_sim::{SimBoard, SimParams};

/// Simulated time per step [µs].
pub const TICK_US: u64 = 100;

/// Homing settle window plus margin [ms].
pub const HOMED_MS: u64 = 1_001;

pub struct Rig {
    pub board: SimBoard,
    pub controller: SimController,
}

impl Rig {
    /// Initialized but not started.
    pub fn initialized(config: LensConfig, params: SimParams) -> Self {
        let (board, peripherals) = SimBoard::new(params);
        let mut controller = SimController::new(config, peripherals.into()).unwrap();
        controller.init().unwrap();
        Self { board, controller }
    }

    pub fn started(config: LensConfig, params: SimParams) -> Self {
        let mut rig = Self::initialized(config, params);
        rig.controller.start().unwrap();
        rig
    }

    /// Started, first sample taken and rotary homed.
    pub fn homed(config: LensConfig, params: SimParams) -> Self {
        let mut rig = Self::started(config, params);
        rig.run_ms(HOMED_MS);
        assert!(rig.controller.sequencer().is_ready());
        rig
    }

    pub fn tick(&mut self) {
        self.board.advance(TICK_US);
        self.controller.step();
    }

    pub fn run_ms(&mut self, ms: u64) {
        for _ in 0..ms * 1000 / TICK_US {
            self.tick();
        }
    }

    /// Put a command on the wire and service it within one tick.
    pub fn command(&mut self, data_low: u32) {
        assert!(self.board.send_command(data_low), "command not accepted");
        self.tick();
    }
}

/// Payload with the given focus and rotary fields.
pub const fn payload(focus: u8, rotary: u8) -> u32 {
    ((focus as u32) << 8) | rotary as u32
}

/// Board whose carriage starts at `raw` counts.
pub fn params_at(raw: u32) -> SimParams {
    SimParams {
        initial_position_raw: raw,
        ..SimParams::default()
    }
}
