//! Values exchanged with peripherals.

use serde::{Deserialize, Serialize};

use crate::consts::SAMPLE_CHANNELS;
use crate::control::types::PositionSample;

/// Analog input converted by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogChannel {
    /// Focus potentiometer.
    Position,
    /// Internal temperature sensor.
    Temperature,
    /// Internal voltage reference.
    Reference,
}

/// Setup of the timer-triggered conversion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionPlan {
    /// Conversion order; results land in the sample in this order.
    pub channels: [AnalogChannel; SAMPLE_CHANNELS],
    /// Trigger period in microseconds.
    pub period_us: u32,
    /// Restart the transfer automatically after each completion.
    pub circular: bool,
}

impl AcquisitionPlan {
    /// Continuous circular acquisition of position, temperature and reference.
    pub const fn continuous(period_us: u32) -> Self {
        Self {
            channels: [
                AnalogChannel::Position,
                AnalogChannel::Temperature,
                AnalogChannel::Reference,
            ],
            period_us,
            circular: true,
        }
    }
}

/// One completion interrupt of the acquisition transfer.
///
/// `complete` carries the finished sample set. It is `None` when the
/// transfer faulted before the set was complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferEvent {
    pub complete: Option<PositionSample>,
    pub transfer_error: bool,
    pub overrun: bool,
}

impl TransferEvent {
    /// A clean completion.
    pub const fn completed(sample: PositionSample) -> Self {
        Self {
            complete: Some(sample),
            transfer_error: false,
            overrun: false,
        }
    }

    /// A faulted transfer with no usable data.
    pub const fn faulted() -> Self {
        Self {
            complete: None,
            transfer_error: true,
            overrun: false,
        }
    }
}

/// Result flags of a finished transmit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxOutcome {
    pub arbitration_lost: bool,
    pub transmit_error: bool,
}

/// State of one transmit lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneStatus {
    /// Request not yet completed.
    Pending,
    /// Request completed with the given outcome.
    Done(TxOutcome),
}

/// Error counters and state of the bus peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkHealth {
    /// Receive error counter.
    pub rx_errors: u8,
    /// Transmit error counter.
    pub tx_errors: u8,
    /// Peripheral has left the bus.
    pub bus_off: bool,
}

impl LinkHealth {
    /// Returns true if either error counter is non-zero.
    #[inline]
    pub const fn has_errors(&self) -> bool {
        self.rx_errors != 0 || self.tx_errors != 0
    }
}
