//! Rotary phase sequencer.
//!
//! Moves the three-position selector between phases by driving its two
//! axis pairs for one settle window per transition. The phase is updated
//! optimistically when a transition begins; the settle timer only releases
//! the bridges.
//!
//! ## Transition table
//!
//! | from → to | axis A | axis B |
//! |-----------|--------|--------|
//! | 1 → 2 | reverse | forward |
//! | 2 → 1 | forward | reverse |
//! | 1 → 0 | reverse | idle |
//! | 2 → 0 | idle | reverse |
//! | 0 → 1 | forward | idle |
//! | 0 → 2 | idle | forward |

use lens_common::control::config::{LensConfig, SettlePolicy};
use lens_common::control::flags::StatusFlags;
use lens_common::control::types::{AxisDrive, Phase};
use lens_common::hal::driver::{RotaryActuator, SettleTimer};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ControlError;
use crate::shared::SequencerPort;

/// Axis pair drive for a transition. `None` when `from == to`.
pub const fn transition_drive(from: Phase, to: Phase) -> Option<(AxisDrive, AxisDrive)> {
    use AxisDrive::*;
    use Phase::*;

    match (from, to) {
        (Phase1, Phase2) => Some((Reverse, Forward)),
        (Phase2, Phase1) => Some((Forward, Reverse)),
        (Phase1, Phase0) => Some((Reverse, Idle)),
        (Phase2, Phase0) => Some((Idle, Reverse)),
        (Phase0, Phase1) => Some((Forward, Idle)),
        (Phase0, Phase2) => Some((Idle, Forward)),
        (Phase0, Phase0) | (Phase1, Phase1) | (Phase2, Phase2) => None,
    }
}

/// Result of a phase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseRequest {
    /// Already at the requested phase.
    Unchanged,
    /// Transition begun.
    Started { from: Phase, to: Phase },
    /// Transition begun while the previous one was still settling; the
    /// settle window was restarted.
    Restarted { from: Phase, to: Phase },
    /// Remembered until the current settle window expires.
    Queued(Phase),
}

/// Counters since init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SequencerStats {
    pub transitions: u64,
    /// Transitions that cut a running settle window short.
    pub restarts: u64,
    pub settles: u64,
    pub queued: u64,
}

/// Three-position rotary selector sequencer.
pub struct RotarySequencer<T: SettleTimer, R: RotaryActuator> {
    timer: T,
    actuator: R,
    port: SequencerPort,
    settle_ms: u32,
    policy: SettlePolicy,
    current: Phase,
    transition_in_progress: bool,
    pending: Option<Phase>,
    initialized: bool,
    stats: SequencerStats,
}

impl<T: SettleTimer, R: RotaryActuator> RotarySequencer<T, R> {
    pub fn new(timer: T, actuator: R, port: SequencerPort, config: &LensConfig) -> Self {
        Self {
            timer,
            actuator,
            port,
            settle_ms: config.sequencer.settle_ms,
            policy: config.sequencer.settle_policy,
            current: Phase::Phase0,
            transition_in_progress: false,
            pending: None,
            initialized: false,
            stats: SequencerStats::default(),
        }
    }

    /// Configure the settle timer. Sets NOT_STARTED.
    pub fn init(&mut self) -> Result<(), ControlError> {
        if self.initialized {
            return Err(ControlError::lifecycle("sequencer", "already initialized"));
        }
        self.timer.configure(self.settle_ms)?;
        self.port.flags().set(StatusFlags::NOT_STARTED);
        self.current = Phase::Phase0;
        self.initialized = true;
        debug!(settle_ms = self.settle_ms, policy = ?self.policy, "Sequencer initialized");
        Ok(())
    }

    /// Seek home: enable the bridges, retract both axis pairs for one
    /// settle window.
    pub fn start(&mut self) -> Result<(), ControlError> {
        if !self.initialized {
            return Err(ControlError::lifecycle("sequencer", "start before init"));
        }
        self.actuator.set_enabled(true);
        self.actuator.drive(AxisDrive::Reverse, AxisDrive::Reverse);
        // The shared rotary target is left alone: a target written before or
        // during homing is applied by the main loop once homing settles.
        self.current = Phase::Phase0;
        self.transition_in_progress = true;
        self.timer.arm_one_shot();
        info!("Rotary selector homing ({} ms)", self.settle_ms);
        Ok(())
    }

    /// Request a phase.
    pub fn set_phase(&mut self, target: Phase) -> PhaseRequest {
        if self.transition_in_progress && self.policy == SettlePolicy::Queue {
            return self.queue(target);
        }
        let Some(drive) = transition_drive(self.current, target) else {
            return PhaseRequest::Unchanged;
        };

        let from = self.current;
        let restarted = self.transition_in_progress;
        self.begin(target, drive);
        if restarted {
            self.stats.restarts += 1;
            debug!(?from, to = ?target, "Settle window restarted");
            PhaseRequest::Restarted { from, to: target }
        } else {
            PhaseRequest::Started { from, to: target }
        }
    }

    fn queue(&mut self, target: Phase) -> PhaseRequest {
        let wanted = if target == self.current {
            None
        } else {
            Some(target)
        };
        if wanted != self.pending {
            self.pending = wanted;
            if let Some(phase) = wanted {
                self.stats.queued += 1;
                debug!(?phase, "Phase request queued");
            }
        }
        match wanted {
            Some(phase) => PhaseRequest::Queued(phase),
            None => PhaseRequest::Unchanged,
        }
    }

    fn begin(&mut self, target: Phase, (axis_a, axis_b): (AxisDrive, AxisDrive)) {
        self.timer.disarm();
        self.timer.reset_counter();
        self.actuator.drive(axis_a, axis_b);
        debug!(from = ?self.current, to = ?target, ?axis_a, ?axis_b, "Rotary transition");
        self.current = target;
        self.transition_in_progress = true;
        self.stats.transitions += 1;
        self.timer.arm_one_shot();
    }

    /// Settle timer interrupt pending.
    #[inline]
    pub fn settle_pending(&self) -> bool {
        self.timer.is_elapsed()
    }

    /// Settle timer interrupt handler: release both bridges.
    ///
    /// Returns the queued transition it started, if any.
    pub fn on_settle_elapsed(&mut self) -> Option<PhaseRequest> {
        self.actuator.drive(AxisDrive::Idle, AxisDrive::Idle);
        self.timer.clear_elapsed();
        if self.port.flags().peek().contains(StatusFlags::NOT_STARTED) {
            info!("Rotary selector at {:?}", self.current);
        }
        self.port.flags().clear(StatusFlags::NOT_STARTED);
        self.transition_in_progress = false;
        self.stats.settles += 1;

        let next = self.pending.take()?;
        Some(self.set_phase(next))
    }

    /// NOT_STARTED clear.
    #[inline]
    pub fn is_ready(&self) -> bool {
        !self.port.flags().peek().contains(StatusFlags::NOT_STARTED)
    }

    pub fn query_status(&self) -> StatusFlags {
        self.port.flags().peek()
    }

    #[inline]
    pub fn current_phase(&self) -> Phase {
        self.current
    }

    #[inline]
    pub fn transition_in_progress(&self) -> bool {
        self.transition_in_progress
    }

    #[inline]
    pub fn pending(&self) -> Option<Phase> {
        self.pending
    }

    #[inline]
    pub fn stats(&self) -> SequencerStats {
        self.stats
    }

    pub fn actuator(&self) -> &R {
        &self.actuator
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
