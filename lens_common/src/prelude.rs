//! Prelude module for common re-exports.
//!
//! # Usage
//!
//! ```rust
//! use lens_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::control::config::{
    BusConfig, FocusConfig, LensConfig, SamplerConfig, SequencerConfig, SettlePolicy,
};

// ─── Control Types ──────────────────────────────────────────────────
pub use crate::control::flags::{StatusFlags, Subsystem};
pub use crate::control::types::{AxisDrive, FocusDrive, Phase, PositionSample, Scaling};

// ─── Bus ────────────────────────────────────────────────────────────
pub use crate::bus::frame::{ACCEPTED_IDS, InboundMessage, MessageId, OutboundMessage};
pub use crate::bus::payload::{CommandFields, encode_status};

// ─── Peripherals ────────────────────────────────────────────────────
pub use crate::hal::driver::{
    BusPeripheral, FocusActuator, HalError, RotaryActuator, SamplerPeripheral, SettleTimer,
};
pub use crate::hal::types::{
    AcquisitionPlan, AnalogChannel, LaneStatus, LinkHealth, TransferEvent, TxOutcome,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{BUS_ID_COMMAND, BUS_ID_STATUS, FOCUS_MAX, TX_LANES};
