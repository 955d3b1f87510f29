//! Wiring to the `lens_sim` board (feature `sim`).
//!
//! ```rust
//! use lens_common::control::config::LensConfig;
//! use lens_control::sim::SimController;
//! use lens_sim::{SimBoard, SimParams};
//!
//! let (mut board, peripherals) = SimBoard::new(SimParams::default());
//! let mut controller = SimController::new(LensConfig::default(), peripherals.into()).unwrap();
//! controller.init().unwrap();
//! controller.start().unwrap();
//! board.advance(100);
//! controller.step();
//! ```

use std::path::Path;

use lens_common::config::{ConfigError, ConfigLoader};
use lens_sim::{SimBus, SimFocus, SimParams, SimPeripherals, SimRotary, SimSampler, SimTimer};
use tracing::info;

use crate::cycle::{Controller, Peripherals};

/// Controller wired to the simulation board.
pub type SimController = Controller<SimSampler, SimBus, SimTimer, SimFocus, SimRotary>;

impl From<SimPeripherals> for Peripherals<SimSampler, SimBus, SimTimer, SimFocus, SimRotary> {
    fn from(sim: SimPeripherals) -> Self {
        Self {
            sampler: sim.sampler,
            bus: sim.bus,
            timer: sim.timer,
            focus: sim.focus,
            rotary: sim.rotary,
        }
    }
}

/// Load simulation board parameters. Rates must be finite and non-negative.
pub fn load_sim_params(path: &Path) -> Result<SimParams, ConfigError> {
    let params = SimParams::load(path)?;
    if !params.focus_slew_per_ms.is_finite() || params.focus_slew_per_ms < 0.0 {
        return Err(ConfigError::invalid("focus_slew_per_ms must be a non-negative number"));
    }
    if !params.rotary_rate_per_ms.is_finite() || params.rotary_rate_per_ms < 0.0 {
        return Err(ConfigError::invalid("rotary_rate_per_ms must be a non-negative number"));
    }
    info!("Simulation parameters loaded from {}", path.display());
    Ok(params)
}
