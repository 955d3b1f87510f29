//! Position sampling pipeline.
//!
//! `Idle → Armed → Sampling`. The acquisition runs continuously once
//! started; every completion interrupt publishes the converted set to the
//! shared slot. The first clean completion seeds the focus target from the
//! measured position so the carriage holds still at power-up.

use lens_common::control::config::LensConfig;
use lens_common::control::flags::StatusFlags;
use lens_common::control::types::Scaling;
use lens_common::hal::driver::SamplerPeripheral;
use lens_common::hal::types::{AcquisitionPlan, TransferEvent};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::ControlError;
use crate::shared::SamplerPort;

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplerState {
    /// Not configured.
    Idle,
    /// Configured, waiting for the first clean completion.
    Armed,
    /// At least one sample published.
    Sampling,
}

/// What a completion asks of the focus actuator group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Sample published. Enable the focus group.
    Published {
        /// This was the first clean completion.
        first: bool,
        /// Scaled position of the published sample.
        position: u32,
    },
    /// Transfer error. Disable the focus group.
    Faulted,
    /// No data and no error. Leave the focus group alone.
    Empty,
}

impl TransferOutcome {
    /// Requested focus group state, if the outcome requests one.
    #[inline]
    pub const fn focus_enable(&self) -> Option<bool> {
        match self {
            Self::Published { .. } => Some(true),
            Self::Faulted => Some(false),
            Self::Empty => None,
        }
    }
}

/// Counters since init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SamplerStats {
    pub published: u64,
    pub transfer_errors: u64,
    pub overruns: u64,
}

/// Timer-triggered position sampler.
pub struct PositionSampler<S: SamplerPeripheral> {
    peripheral: S,
    port: SamplerPort,
    scaling: Scaling,
    max_target: u32,
    period_us: u32,
    state: SamplerState,
    seeded: bool,
    stats: SamplerStats,
}

impl<S: SamplerPeripheral> PositionSampler<S> {
    pub fn new(peripheral: S, port: SamplerPort, config: &LensConfig) -> Self {
        Self {
            peripheral,
            port,
            scaling: config.focus.scaling(),
            max_target: config.focus.max_target,
            period_us: config.sampler.period_us,
            state: SamplerState::Idle,
            seeded: false,
            stats: SamplerStats::default(),
        }
    }

    /// Configure continuous acquisition of position, temperature and
    /// reference. Sets NOT_STARTED.
    pub fn init(&mut self) -> Result<(), ControlError> {
        if self.state != SamplerState::Idle {
            return Err(ControlError::lifecycle("sampler", "already initialized"));
        }
        self.peripheral
            .configure(&AcquisitionPlan::continuous(self.period_us))?;
        self.port.flags().set(StatusFlags::NOT_STARTED);
        self.state = SamplerState::Armed;
        debug!(period_us = self.period_us, "Sampler armed");
        Ok(())
    }

    /// Start the trigger and the transfer.
    pub fn start(&mut self) -> Result<(), ControlError> {
        if self.state == SamplerState::Idle {
            return Err(ControlError::lifecycle("sampler", "start before init"));
        }
        self.peripheral.start()?;
        info!("Position sampling started ({} µs period)", self.period_us);
        Ok(())
    }

    /// Take a pending completion interrupt and handle it.
    pub fn service(&mut self) -> Option<TransferOutcome> {
        let event = self.peripheral.poll_transfer()?;
        Some(self.on_transfer(event))
    }

    /// Completion interrupt handler.
    pub fn on_transfer(&mut self, event: TransferEvent) -> TransferOutcome {
        let flags = self.port.flags();

        if event.overrun {
            self.stats.overruns += 1;
            flags.set(StatusFlags::OVERRUN);
            debug!("Conversion overrun");
        }

        if event.transfer_error {
            self.stats.transfer_errors += 1;
            flags.set(StatusFlags::ERROR);
            warn!("Acquisition transfer error, focus group disabled");
            return TransferOutcome::Faulted;
        }
        flags.clear(StatusFlags::ERROR);

        let Some(sample) = event.complete else {
            return TransferOutcome::Empty;
        };

        self.port.publish_sample(&sample);
        self.stats.published += 1;
        let position = self.scaling.position(&sample);
        trace!(raw = sample.position_raw, position, "Sample published");

        let first = !self.seeded;
        if first {
            let seed = position.min(self.max_target);
            self.port.seed_focus_target(seed);
            flags.clear(StatusFlags::NOT_STARTED);
            self.seeded = true;
            self.state = SamplerState::Sampling;
            info!(position, "First sample, focus target seeded to {}", seed);
        }
        TransferOutcome::Published { first, position }
    }

    /// NOT_STARTED and ERROR both clear. Non-destructive.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.port.flags().peek().is_ready()
    }

    /// Current flags; clears OVERRUN.
    pub fn query_status(&self) -> StatusFlags {
        self.port.flags().take(StatusFlags::OVERRUN)
    }

    #[inline]
    pub fn state(&self) -> SamplerState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    #[inline]
    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn peripheral(&self) -> &S {
        &self.peripheral
    }
}
