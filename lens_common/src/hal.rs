//! Peripheral abstraction for the control core.
//!
//! The core drives hardware only through the traits in [`driver`]; a board
//! support crate (or the simulation board) implements them.

pub mod driver;
pub mod types;

pub use driver::{
    BusPeripheral, FocusActuator, HalError, RotaryActuator, SamplerPeripheral, SettleTimer,
};
pub use types::{AcquisitionPlan, AnalogChannel, LaneStatus, LinkHealth, TransferEvent, TxOutcome};
