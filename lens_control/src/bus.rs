//! Bus link handler.
//!
//! Receives command and status-request frames, writes accepted command
//! fields to the shared targets, answers status requests, and reports link
//! health on query.
//!
//! Acceptance is done in hardware: `init` installs the two identifiers in
//! the peripheral's list filter and no software filtering follows.

use std::hint::spin_loop;

use lens_common::bus::frame::{ACCEPTED_IDS, InboundMessage, MessageId, OutboundMessage};
use lens_common::bus::payload::{CommandFields, encode_status};
use lens_common::control::config::LensConfig;
use lens_common::control::flags::StatusFlags;
use lens_common::control::types::{Phase, Scaling};
use lens_common::hal::driver::BusPeripheral;
use lens_common::hal::types::LaneStatus;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ControlError, TransmitError};
use crate::shared::{StateView, TargetWriter};

/// Result of one receive interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Interrupt raised by an overrun only; no message was queued.
    Empty,
    /// A status report was attempted.
    StatusReplied(Result<(), TransmitError>),
    /// A command was decoded. Each flag tells whether that field was stored.
    Command { focus_applied: bool, rotary_applied: bool },
}

/// Counters since init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub frames_received: u64,
    pub status_requests: u64,
    pub commands: u64,
    pub focus_applied: u64,
    pub rotary_applied: u64,
    /// Command fields dropped by the range checks.
    pub fields_rejected: u64,
    pub replies_sent: u64,
    pub replies_failed: u64,
    pub rx_overruns: u64,
}

/// Field-bus command/status handler.
pub struct BusLink<B: BusPeripheral> {
    peripheral: B,
    targets: TargetWriter,
    view: StateView,
    scaling: Scaling,
    max_target: u32,
    status_lane: usize,
    tx_poll_limit: u32,
    initialized: bool,
    stats: LinkStats,
}

impl<B: BusPeripheral> BusLink<B> {
    pub fn new(peripheral: B, targets: TargetWriter, view: StateView, config: &LensConfig) -> Self {
        Self {
            peripheral,
            targets,
            view,
            scaling: config.focus.scaling(),
            max_target: config.focus.max_target,
            status_lane: config.bus.status_lane,
            tx_poll_limit: config.bus.tx_poll_limit,
            initialized: false,
            stats: LinkStats::default(),
        }
    }

    /// Install the acceptance list (command and status request).
    pub fn init(&mut self) -> Result<(), ControlError> {
        if self.initialized {
            return Err(ControlError::lifecycle("bus", "already initialized"));
        }
        self.peripheral.configure_filters(&ACCEPTED_IDS)?;
        self.initialized = true;
        debug!(ids = ?ACCEPTED_IDS, "Bus filters installed");
        Ok(())
    }

    /// Leave init mode.
    pub fn start(&mut self) -> Result<(), ControlError> {
        if !self.initialized {
            return Err(ControlError::lifecycle("bus", "start before init"));
        }
        self.peripheral.start()?;
        info!(
            "Bus link up ({} lanes, status on lane {})",
            self.peripheral.lane_count(),
            self.status_lane
        );
        Ok(())
    }

    /// Receive interrupt pending.
    #[inline]
    pub fn rx_pending(&self) -> bool {
        self.peripheral.rx_pending()
    }

    /// Receive interrupt handler.
    pub fn on_receive(&mut self) -> ReceiveOutcome {
        if self.peripheral.take_rx_overrun() {
            self.stats.rx_overruns += 1;
            self.targets.flags().set(StatusFlags::OVERRUN);
            debug!("Receive FIFO overrun");
        }

        let Some(msg) = self.peripheral.receive() else {
            return ReceiveOutcome::Empty;
        };
        self.stats.frames_received += 1;

        match msg.id {
            MessageId::StatusRequest => {
                self.stats.status_requests += 1;
                let result = self.send_status();
                match result {
                    Ok(()) => self.stats.replies_sent += 1,
                    Err(e) => {
                        self.stats.replies_failed += 1;
                        warn!("Status reply failed: {e}");
                    }
                }
                ReceiveOutcome::StatusReplied(result)
            }
            MessageId::Command => self.apply_command(&msg),
            // Outbound-only identifier; the peripheral never yields it.
            MessageId::Status => ReceiveOutcome::Empty,
        }
    }

    fn apply_command(&mut self, msg: &InboundMessage) -> ReceiveOutcome {
        self.stats.commands += 1;
        let fields = CommandFields::decode(msg.data_low);

        let focus = u32::from(fields.focus);
        let focus_applied = focus <= self.max_target;
        if focus_applied {
            self.targets.set_focus_target(focus);
            self.stats.focus_applied += 1;
        } else {
            self.stats.fields_rejected += 1;
            debug!(focus, max = self.max_target, "Focus field out of range, ignored");
        }

        let rotary_applied = match Phase::from_u8(fields.rotary) {
            Some(phase) => {
                self.targets.set_rotary_target(phase);
                self.stats.rotary_applied += 1;
                true
            }
            None => {
                self.stats.fields_rejected += 1;
                debug!(rotary = fields.rotary, "Rotary field undefined, ignored");
                false
            }
        };

        debug!(
            "Command {:#010x} decoded (focus applied: {}, rotary applied: {})",
            msg.data_low, focus_applied, rotary_applied
        );
        ReceiveOutcome::Command {
            focus_applied,
            rotary_applied,
        }
    }

    /// Status word from the current shared state.
    pub fn status_word(&self) -> u32 {
        let position = self.scaling.position(&self.view.latest_sample());
        encode_status(position, self.view.rotary_target())
    }

    /// Transmit a status report on the status lane.
    pub fn send_status(&mut self) -> Result<(), TransmitError> {
        let msg = OutboundMessage::status(self.status_word());
        self.send(self.status_lane, &msg)
    }

    /// Transmit one frame on `lane` and wait for completion.
    ///
    /// Single attempt. The completion poll is bounded by
    /// `bus.tx_poll_limit`.
    pub fn send(&mut self, lane: usize, msg: &OutboundMessage) -> Result<(), TransmitError> {
        let lanes = self.peripheral.lane_count();
        if lane >= lanes {
            return Err(TransmitError::InvalidLane { lane, lanes });
        }

        self.peripheral.clear_length(lane);
        self.peripheral.load(lane, msg);
        self.peripheral.request_transmit(lane);

        for _ in 0..self.tx_poll_limit {
            match self.peripheral.lane_status(lane) {
                LaneStatus::Pending => spin_loop(),
                LaneStatus::Done(outcome) if outcome.arbitration_lost => {
                    return Err(TransmitError::ArbitrationLost { lane });
                }
                LaneStatus::Done(outcome) if outcome.transmit_error => {
                    return Err(TransmitError::TransmitFailed { lane });
                }
                LaneStatus::Done(_) => return Ok(()),
            }
        }
        Err(TransmitError::Unresponsive {
            lane,
            polls: self.tx_poll_limit,
        })
    }

    /// Link status; clears OVERRUN.
    ///
    /// ERROR while either error counter is non-zero, BUS_OFF while the
    /// peripheral is off the bus. Recovery from bus-off is left to the
    /// peripheral.
    pub fn query_status(&self) -> StatusFlags {
        let health = self.peripheral.link_health();
        let word = self.targets.flags();
        word.assign(StatusFlags::ERROR, health.has_errors());
        word.assign(StatusFlags::BUS_OFF, health.bus_off);
        word.take(StatusFlags::OVERRUN)
    }

    #[inline]
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn peripheral(&self) -> &B {
        &self.peripheral
    }
}
