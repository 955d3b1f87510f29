//! Simulated bus controller.
//!
//! Hardware list filter, 3-slot receive FIFO, independent transmit lanes
//! with single-attempt completion, error counters and bus-off.

use heapless::{Deque, Vec as FixedVec};
use lens_common::bus::frame::{InboundMessage, MessageId, OutboundMessage};
use lens_common::consts::TX_LANES;
use lens_common::hal::types::{LaneStatus, LinkHealth, TxOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::push_bounded;

/// Depth of the hardware receive FIFO.
pub(crate) const RX_FIFO_DEPTH: usize = 3;

/// Hard upper bound on filter slots, regardless of `SimParams`.
pub(crate) const MAX_FILTER_SLOTS: usize = 28;

/// Completed transmissions kept for inspection; older frames are dropped.
pub(crate) const SENT_LOG_DEPTH: usize = 64;

/// A frame that completed transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentFrame {
    pub lane: usize,
    pub raw_id: u16,
    pub dlc: u8,
    pub data_low: u32,
    pub data_high: u32,
    /// Simulation time of completion [µs].
    pub at_us: u64,
}

/// Pending transmit faults. Counters are consumed one per completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusFaults {
    /// Next N requests lose arbitration.
    pub arbitration_loss: u32,
    /// Next N requests end with a transmit error.
    pub transmit_error: u32,
    /// Lanes that never report completion.
    pub unresponsive: [bool; TX_LANES],
}

#[derive(Debug, Clone, Copy)]
struct RawFrame {
    raw_id: u16,
    data_low: u32,
    data_high: u32,
    dlc: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct Lane {
    length: Option<u8>,
    loaded: Option<OutboundMessage>,
    requested: bool,
    polls_left: u32,
    outcome: Option<TxOutcome>,
}

#[derive(Debug)]
pub(crate) struct BusSim {
    pub(crate) filters: FixedVec<u16, MAX_FILTER_SLOTS>,
    filter_capacity: usize,
    pub(crate) started: bool,
    rx_fifo: Deque<RawFrame, RX_FIFO_DEPTH>,
    rx_overrun: bool,
    lanes: [Lane; TX_LANES],
    tx_latency_polls: u32,
    pub(crate) health: LinkHealth,
    pub(crate) faults: BusFaults,
    pub(crate) sent: Deque<SentFrame, SENT_LOG_DEPTH>,
    pub(crate) filtered_out: u64,
}

impl BusSim {
    pub(crate) fn new(filter_capacity: usize, tx_latency_polls: u32) -> Self {
        Self {
            filters: FixedVec::new(),
            filter_capacity: filter_capacity.min(MAX_FILTER_SLOTS),
            started: false,
            rx_fifo: Deque::new(),
            rx_overrun: false,
            lanes: [Lane::default(); TX_LANES],
            tx_latency_polls,
            health: LinkHealth::default(),
            faults: BusFaults::default(),
            sent: Deque::new(),
            filtered_out: 0,
        }
    }

    pub(crate) fn set_filters(&mut self, ids: &[u16]) -> Result<(), String> {
        if self.started {
            return Err("filters can only be changed in init mode".to_string());
        }
        if ids.len() > self.filter_capacity {
            return Err(format!(
                "{} filter ids exceed capacity {}",
                ids.len(),
                self.filter_capacity
            ));
        }
        self.filters.clear();
        for &id in ids {
            self.filters
                .push(id)
                .map_err(|id| format!("filter bank full at id {id:#05x}"))?;
        }
        Ok(())
    }

    /// Deliver a frame from the wire. Returns true if it reached the FIFO.
    pub(crate) fn deliver(&mut self, raw_id: u16, data_low: u32, data_high: u32, dlc: u8) -> bool {
        if !self.started || self.health.bus_off {
            return false;
        }
        if !self.filters.contains(&raw_id) {
            self.filtered_out += 1;
            trace!(raw_id, "Frame rejected by acceptance filter");
            return false;
        }
        let frame = RawFrame {
            raw_id,
            data_low,
            data_high,
            dlc,
        };
        if self.rx_fifo.push_back(frame).is_err() {
            self.rx_overrun = true;
            debug!(raw_id, "Receive FIFO overrun");
            return false;
        }
        true
    }

    pub(crate) fn rx_pending(&self) -> bool {
        !self.rx_fifo.is_empty() || self.rx_overrun
    }

    pub(crate) fn take_rx_overrun(&mut self) -> bool {
        std::mem::take(&mut self.rx_overrun)
    }

    pub(crate) fn receive(&mut self) -> Option<InboundMessage> {
        while let Some(frame) = self.rx_fifo.pop_front() {
            if let Some(id) = MessageId::from_raw(frame.raw_id) {
                return Some(InboundMessage {
                    id,
                    data_low: frame.data_low,
                    data_high: frame.data_high,
                    dlc: frame.dlc,
                });
            }
        }
        None
    }

    pub(crate) fn clear_length(&mut self, lane: usize) {
        if let Some(l) = self.lanes.get_mut(lane) {
            l.length = None;
        }
    }

    pub(crate) fn load(&mut self, lane: usize, msg: &OutboundMessage) {
        if let Some(l) = self.lanes.get_mut(lane) {
            l.length = Some(msg.dlc);
            l.loaded = Some(*msg);
            l.outcome = None;
        }
    }

    pub(crate) fn request_transmit(&mut self, lane: usize) {
        let latency = self.tx_latency_polls;
        if let Some(l) = self.lanes.get_mut(lane) {
            l.requested = true;
            l.polls_left = latency;
            l.outcome = None;
        }
    }

    pub(crate) fn lane_status(&mut self, lane: usize, now_us: u64) -> LaneStatus {
        let unresponsive = self.faults.unresponsive.get(lane).copied().unwrap_or(true);
        let started = self.started;
        let Some(l) = self.lanes.get_mut(lane) else {
            return LaneStatus::Pending;
        };
        if let Some(outcome) = l.outcome {
            return LaneStatus::Done(outcome);
        }
        if !l.requested || unresponsive || !started {
            return LaneStatus::Pending;
        }
        if l.polls_left > 0 {
            l.polls_left -= 1;
            return LaneStatus::Pending;
        }

        let mut outcome = TxOutcome::default();
        if self.health.bus_off || self.faults.transmit_error > 0 {
            self.faults.transmit_error = self.faults.transmit_error.saturating_sub(1);
            self.health.tx_errors = self.health.tx_errors.saturating_add(8);
            outcome.transmit_error = true;
        } else if self.faults.arbitration_loss > 0 {
            self.faults.arbitration_loss -= 1;
            outcome.arbitration_lost = true;
        } else if let Some(msg) = l.loaded {
            let frame = SentFrame {
                lane,
                raw_id: msg.raw_id(),
                dlc: l.length.unwrap_or(0),
                data_low: msg.data_low,
                data_high: msg.data_high,
                at_us: now_us,
            };
            push_bounded(&mut self.sent, frame);
        }
        l.requested = false;
        l.outcome = Some(outcome);
        LaneStatus::Done(outcome)
    }
}
