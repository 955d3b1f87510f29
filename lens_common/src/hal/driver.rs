//! Peripheral traits and error types.
//!
//! This module defines:
//! - `HalError` enum - Configuration and setup failures
//! - `SamplerPeripheral` - Timer-triggered analog acquisition
//! - `BusPeripheral` - Field-bus controller with filters and transmit lanes
//! - `SettleTimer` - One-shot settle timer of the rotary selector
//! - `FocusActuator` / `RotaryActuator` - Motor drive outputs
//!
//! # Interrupt model
//!
//! Interrupt sources are exposed as pending checks (`rx_pending`,
//! `poll_transfer`, `is_elapsed`). The controller polls them like an
//! interrupt controller would and runs the matching handler. Handlers clear
//! their source through the same trait.

use crate::bus::frame::{InboundMessage, OutboundMessage};
use crate::control::types::{AxisDrive, FocusDrive};
use crate::hal::types::{AcquisitionPlan, LaneStatus, LinkHealth, TransferEvent};
use thiserror::Error;

/// Error types for peripheral setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Configuration rejected by the peripheral
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation requires a prior configure/start step
    #[error("Peripheral not ready: {0}")]
    NotReady(&'static str),
}

/// Timer-triggered acquisition of the three analog channels.
///
/// # Lifecycle
///
/// 1. `configure()` - once, while stopped
/// 2. `start()` - begins triggered conversions
/// 3. `poll_transfer()` - once per completion interrupt
pub trait SamplerPeripheral {
    /// Set up the conversion sequence and its trigger.
    fn configure(&mut self, plan: &AcquisitionPlan) -> Result<(), HalError>;

    /// Start the trigger timer and the transfer.
    ///
    /// # Errors
    /// Returns `HalError::NotReady` if not configured.
    fn start(&mut self) -> Result<(), HalError>;

    /// Take the pending completion interrupt, if any. Taking it clears it.
    fn poll_transfer(&mut self) -> Option<TransferEvent>;
}

/// Field-bus controller.
///
/// Transmission is single-attempt: a lane that loses arbitration or sees a
/// transmit error reports it and does not retry.
pub trait BusPeripheral {
    /// Number of independent transmit lanes.
    fn lane_count(&self) -> usize;

    /// Install the hardware acceptance list. Frames with other identifiers
    /// never reach the receive FIFO.
    fn configure_filters(&mut self, ids: &[u16]) -> Result<(), HalError>;

    /// Leave init mode and join the bus.
    fn start(&mut self) -> Result<(), HalError>;

    /// Returns true while the receive interrupt is pending (a message is
    /// queued or an overrun is flagged).
    fn rx_pending(&self) -> bool;

    /// Read and clear the receive FIFO overrun flag.
    fn take_rx_overrun(&mut self) -> bool;

    /// Pop the oldest received message.
    fn receive(&mut self) -> Option<InboundMessage>;

    /// Clear the stale length field of a lane.
    fn clear_length(&mut self, lane: usize);

    /// Load identifier, length and payload into a lane.
    fn load(&mut self, lane: usize, msg: &OutboundMessage);

    /// Request transmission of the loaded lane.
    fn request_transmit(&mut self, lane: usize);

    /// Completion state of a lane. Polled until `Done`.
    fn lane_status(&mut self, lane: usize) -> LaneStatus;

    /// Error counters and bus-off state.
    fn link_health(&self) -> LinkHealth;
}

/// One-pulse timer bounding the rotary settle window.
pub trait SettleTimer {
    /// Set the one-pulse period.
    fn configure(&mut self, period_ms: u32) -> Result<(), HalError>;

    /// Stop counting.
    fn disarm(&mut self);

    /// Reset the counter to zero.
    fn reset_counter(&mut self);

    /// Start one period. Fires once, then stops.
    fn arm_one_shot(&mut self);

    /// Elapsed interrupt pending.
    fn is_elapsed(&self) -> bool;

    fn clear_elapsed(&mut self);
}

/// Focus motor H-bridge.
pub trait FocusActuator {
    /// Enable or disable the bridge output group.
    fn set_enabled(&mut self, enabled: bool);

    fn drive(&mut self, command: FocusDrive);
}

/// Rotary selector bridges, one per axis pair.
pub trait RotaryActuator {
    /// Enable or disable both bridge output groups.
    fn set_enabled(&mut self, enabled: bool);

    fn drive(&mut self, axis_a: AxisDrive, axis_b: AxisDrive);
}
