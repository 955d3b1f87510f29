//! Lens Simulation Board
//!
//! Software stand-in for the actuator board. Implements every peripheral
//! trait of `lens_common::hal` over one simulated world so the control core
//! can run and be tested on a host.
//!
//! # Usage
//!
//! ```rust
//! use lens_sim::{SimBoard, SimParams};
//!
//! let (mut board, peripherals) = SimBoard::new(SimParams::default());
//! board.advance(1_000);
//! assert_eq!(board.now_us(), 1_000);
//! # drop(peripherals);
//! ```
//!
//! # Time
//!
//! Nothing moves until [`SimBoard::advance`] is called. The plant, the
//! sampling trigger and the settle timer all advance on that call.

mod board;

pub use board::bus::{BusFaults, SentFrame};
pub use board::params::SimParams;
pub use board::plant::mechanical_phase;
pub use board::{
    ROTARY_HISTORY_DEPTH, RotaryCommand, SimBoard, SimBus, SimFocus, SimPeripherals, SimRotary,
    SimSampler, SimTimer,
};
