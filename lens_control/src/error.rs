//! Error types of the control core.
//!
//! Interrupt-context handlers never return these synchronously: invalid
//! command fields are dropped and counted, advisory conditions go to the
//! sticky flag words. Errors surface from setup calls and from explicit
//! transmissions.

use lens_common::config::ConfigError;
use lens_common::hal::driver::HalError;
use thiserror::Error;

/// Terminal outcome of a single transmit attempt. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransmitError {
    /// Another node won arbitration.
    #[error("lane {lane}: arbitration lost")]
    ArbitrationLost { lane: usize },

    /// The controller reported a transmit error.
    #[error("lane {lane}: transmit error")]
    TransmitFailed { lane: usize },

    /// The lane never reported completion.
    #[error("lane {lane}: no completion after {polls} polls")]
    Unresponsive { lane: usize, polls: u32 },

    /// Lane index outside the peripheral's lanes.
    #[error("lane {lane} out of range (lanes: {lanes})")]
    InvalidLane { lane: usize, lanes: usize },
}

/// Setup and lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("peripheral: {0}")]
    Hal(#[from] HalError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("transmit: {0}")]
    Transmit(#[from] TransmitError),

    /// Lifecycle call out of order (e.g. `start` before `init`).
    #[error("{component}: {reason}")]
    Lifecycle {
        component: &'static str,
        reason: &'static str,
    },
}

impl ControlError {
    pub(crate) const fn lifecycle(component: &'static str, reason: &'static str) -> Self {
        Self::Lifecycle { component, reason }
    }
}
