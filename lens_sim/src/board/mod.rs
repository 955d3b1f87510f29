//! Simulated board.
//!
//! One [`SimState`] holds the whole world. [`SimBoard`] is the test/runner
//! side (time, plant inspection, fault injection); [`SimPeripherals`] are
//! the thin handles the control core drives through the `hal` traits.

pub(crate) mod bus;
pub(crate) mod params;
pub(crate) mod plant;
pub(crate) mod sampler;
pub(crate) mod timer;

use std::sync::Arc;

use lens_common::bus::frame::{InboundMessage, OutboundMessage};
use lens_common::consts::{BUS_ID_COMMAND, BUS_ID_STATUS, FRAME_DLC, TX_LANES};
use lens_common::control::types::{AxisDrive, FocusDrive, Phase, PositionSample};
use lens_common::hal::driver::{
    BusPeripheral, FocusActuator, HalError, RotaryActuator, SamplerPeripheral, SettleTimer,
};
use lens_common::hal::types::{AcquisitionPlan, LaneStatus, LinkHealth, TransferEvent};
use heapless::Deque;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bus::{BusFaults, BusSim, SentFrame};
use params::SimParams;
use plant::{FocusPlant, RotaryPlant, mechanical_phase};
use sampler::SamplerSim;
use timer::TimerSim;

/// A rotary drive command as seen at the bridge inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotaryCommand {
    pub at_us: u64,
    pub axis_a: AxisDrive,
    pub axis_b: AxisDrive,
}

/// Rotary drive commands kept for inspection; older commands are dropped.
pub const ROTARY_HISTORY_DEPTH: usize = 256;

/// Append to a fixed log, evicting the oldest entry when full.
pub(crate) fn push_bounded<T, const N: usize>(log: &mut Deque<T, N>, item: T) {
    if log.is_full() {
        log.pop_front();
    }
    // Room made above.
    let _ = log.push_back(item);
}

#[derive(Debug)]
pub(crate) struct SimState {
    now_us: u64,
    params: SimParams,
    focus: FocusPlant,
    rotary: RotaryPlant,
    rotary_history: Deque<RotaryCommand, ROTARY_HISTORY_DEPTH>,
    sampler: SamplerSim,
    bus: BusSim,
    timer: TimerSim,
    rng: StdRng,
}

impl SimState {
    fn new(params: SimParams) -> Self {
        Self {
            now_us: 0,
            focus: FocusPlant::new(
                params.initial_position_raw,
                SimParams::POSITION_LIMIT,
                params.focus_slew_per_ms,
            ),
            rotary: RotaryPlant::new(params.initial_rotary, params.rotary_rate_per_ms),
            rotary_history: Deque::new(),
            sampler: SamplerSim::default(),
            bus: BusSim::new(params.filter_capacity, params.tx_latency_polls),
            timer: TimerSim::default(),
            rng: StdRng::seed_from_u64(params.seed),
            params,
        }
    }

    fn convert(&mut self) -> PositionSample {
        let mut position = i64::from(self.focus.position_raw());
        let noise = i64::from(self.params.noise_counts);
        if noise > 0 {
            position += self.rng.gen_range(-noise..=noise);
        }
        let position = position.clamp(0, i64::from(SimParams::POSITION_LIMIT)) as u32;
        PositionSample::new(position, self.params.temperature_raw, self.params.reference_raw)
    }

    fn advance(&mut self, dt_us: u64) {
        self.focus.integrate(dt_us);
        self.rotary.integrate(dt_us);
        self.timer.advance(dt_us);
        self.now_us += dt_us;

        let now = self.now_us;
        let mut sampler = std::mem::take(&mut self.sampler);
        sampler.fire_due(now, || self.convert());
        self.sampler = sampler;
    }
}

type World = Arc<Mutex<SimState>>;

// ─── Board ──────────────────────────────────────────────────────────

/// Runner side of the simulation.
pub struct SimBoard {
    world: World,
}

/// Peripheral handles passed to the control core.
pub struct SimPeripherals {
    pub sampler: SimSampler,
    pub bus: SimBus,
    pub timer: SimTimer,
    pub focus: SimFocus,
    pub rotary: SimRotary,
}

impl SimBoard {
    /// Create a board and its peripheral handles.
    pub fn new(params: SimParams) -> (Self, SimPeripherals) {
        info!(
            "Simulation board: focus at {} counts, slew {} counts/ms, noise ±{}",
            params.initial_position_raw, params.focus_slew_per_ms, params.noise_counts
        );
        let world: World = Arc::new(Mutex::new(SimState::new(params)));
        let peripherals = SimPeripherals {
            sampler: SimSampler {
                world: Arc::clone(&world),
            },
            bus: SimBus {
                world: Arc::clone(&world),
            },
            timer: SimTimer {
                world: Arc::clone(&world),
            },
            focus: SimFocus {
                world: Arc::clone(&world),
            },
            rotary: SimRotary {
                world: Arc::clone(&world),
            },
        };
        (Self { world }, peripherals)
    }

    /// Advance simulated time.
    pub fn advance(&mut self, dt_us: u64) {
        self.world.lock().advance(dt_us);
    }

    pub fn now_us(&self) -> u64 {
        self.world.lock().now_us
    }

    pub fn params(&self) -> SimParams {
        self.world.lock().params.clone()
    }

    // ─── Focus plant ────────────────────────────────────────────────

    pub fn focus_position_raw(&self) -> u32 {
        self.world.lock().focus.position_raw()
    }

    /// Move the carriage by hand.
    pub fn set_focus_position_raw(&mut self, raw: u32) {
        self.world.lock().focus.set_position_raw(raw);
    }

    pub fn focus_enabled(&self) -> bool {
        self.world.lock().focus.enabled
    }

    pub fn focus_drive(&self) -> FocusDrive {
        self.world.lock().focus.drive
    }

    // ─── Rotary plant ───────────────────────────────────────────────

    /// Travel of axis pairs A and B.
    pub fn rotary_travel(&self) -> (f64, f64) {
        self.world.lock().rotary.travel
    }

    pub fn rotary_enabled(&self) -> bool {
        self.world.lock().rotary.enabled
    }

    pub fn rotary_drive(&self) -> (AxisDrive, AxisDrive) {
        self.world.lock().rotary.drive
    }

    /// The last [`ROTARY_HISTORY_DEPTH`] drive commands, oldest first.
    pub fn rotary_history(&self) -> Vec<RotaryCommand> {
        self.world.lock().rotary_history.iter().copied().collect()
    }

    /// Phase the mechanism physically sits in.
    pub fn mechanical_phase(&self) -> Option<Phase> {
        mechanical_phase(self.world.lock().rotary.travel)
    }

    // ─── Bus wire ───────────────────────────────────────────────────

    /// Put a frame on the wire. Returns true if it reached the receive FIFO.
    pub fn inject_frame(&mut self, raw_id: u16, data_low: u32, data_high: u32) -> bool {
        self.world
            .lock()
            .bus
            .deliver(raw_id, data_low, data_high, FRAME_DLC)
    }

    /// Send a command frame.
    pub fn send_command(&mut self, data_low: u32) -> bool {
        self.inject_frame(BUS_ID_COMMAND, data_low, 0)
    }

    /// Send a status request frame.
    pub fn request_status(&mut self) -> bool {
        self.inject_frame(BUS_ID_STATUS, 0, 0)
    }

    /// Recently completed transmissions, oldest first.
    pub fn sent_frames(&self) -> Vec<SentFrame> {
        self.world.lock().bus.sent.iter().copied().collect()
    }

    pub fn take_sent_frames(&mut self) -> Vec<SentFrame> {
        let mut world = self.world.lock();
        let frames = world.bus.sent.iter().copied().collect();
        world.bus.sent.clear();
        frames
    }

    pub fn bus_filters(&self) -> Vec<u16> {
        self.world.lock().bus.filters.to_vec()
    }

    pub fn bus_started(&self) -> bool {
        self.world.lock().bus.started
    }

    /// Frames dropped by the acceptance filter.
    pub fn filtered_out(&self) -> u64 {
        self.world.lock().bus.filtered_out
    }

    // ─── Fault injection ────────────────────────────────────────────

    pub fn bus_faults(&self) -> BusFaults {
        self.world.lock().bus.faults
    }

    pub fn inject_arbitration_loss(&mut self, count: u32) {
        self.world.lock().bus.faults.arbitration_loss += count;
    }

    pub fn inject_transmit_errors(&mut self, count: u32) {
        self.world.lock().bus.faults.transmit_error += count;
    }

    /// Make a lane never report completion.
    pub fn set_lane_unresponsive(&mut self, lane: usize, unresponsive: bool) {
        if let Some(slot) = self.world.lock().bus.faults.unresponsive.get_mut(lane) {
            *slot = unresponsive;
        }
    }

    pub fn set_error_counters(&mut self, rx_errors: u8, tx_errors: u8) {
        let mut world = self.world.lock();
        world.bus.health.rx_errors = rx_errors;
        world.bus.health.tx_errors = tx_errors;
    }

    pub fn set_bus_off(&mut self, bus_off: bool) {
        self.world.lock().bus.health.bus_off = bus_off;
    }

    /// Fault the next `count` acquisition transfers.
    pub fn inject_transfer_errors(&mut self, count: u32) {
        self.world.lock().sampler.inject_errors += count;
    }

    // ─── Sampler / timer inspection ─────────────────────────────────

    pub fn sampler_running(&self) -> bool {
        self.world.lock().sampler.running
    }

    pub fn sampler_plan(&self) -> Option<AcquisitionPlan> {
        self.world.lock().sampler.plan
    }

    /// Completed trigger edges since start.
    pub fn sampler_completions(&self) -> u64 {
        self.world.lock().sampler.completions
    }

    pub fn timer_armed(&self) -> bool {
        self.world.lock().timer.armed
    }

    pub fn timer_period_ms(&self) -> u32 {
        self.world.lock().timer.period_ms
    }
}

// ─── Peripheral handles ─────────────────────────────────────────────

/// Simulated acquisition peripheral.
pub struct SimSampler {
    world: World,
}

impl SamplerPeripheral for SimSampler {
    fn configure(&mut self, plan: &AcquisitionPlan) -> Result<(), HalError> {
        if plan.period_us == 0 {
            return Err(HalError::ConfigError(
                "trigger period must be greater than 0".to_string(),
            ));
        }
        let mut world = self.world.lock();
        if world.sampler.running {
            return Err(HalError::ConfigError(
                "acquisition already running".to_string(),
            ));
        }
        debug!(
            period_us = plan.period_us,
            circular = plan.circular,
            "Acquisition configured"
        );
        world.sampler.plan = Some(*plan);
        Ok(())
    }

    fn start(&mut self) -> Result<(), HalError> {
        let mut world = self.world.lock();
        let now = world.now_us;
        if world.sampler.start(now) {
            Ok(())
        } else {
            Err(HalError::NotReady("acquisition not configured"))
        }
    }

    fn poll_transfer(&mut self) -> Option<TransferEvent> {
        self.world.lock().sampler.take()
    }
}

/// Simulated bus controller.
pub struct SimBus {
    world: World,
}

impl BusPeripheral for SimBus {
    fn lane_count(&self) -> usize {
        TX_LANES
    }

    fn configure_filters(&mut self, ids: &[u16]) -> Result<(), HalError> {
        self.world
            .lock()
            .bus
            .set_filters(ids)
            .map_err(HalError::ConfigError)?;
        debug!(?ids, "Acceptance filters installed");
        Ok(())
    }

    fn start(&mut self) -> Result<(), HalError> {
        self.world.lock().bus.started = true;
        Ok(())
    }

    fn rx_pending(&self) -> bool {
        self.world.lock().bus.rx_pending()
    }

    fn take_rx_overrun(&mut self) -> bool {
        self.world.lock().bus.take_rx_overrun()
    }

    fn receive(&mut self) -> Option<InboundMessage> {
        self.world.lock().bus.receive()
    }

    fn clear_length(&mut self, lane: usize) {
        self.world.lock().bus.clear_length(lane);
    }

    fn load(&mut self, lane: usize, msg: &OutboundMessage) {
        self.world.lock().bus.load(lane, msg);
    }

    fn request_transmit(&mut self, lane: usize) {
        self.world.lock().bus.request_transmit(lane);
    }

    fn lane_status(&mut self, lane: usize) -> LaneStatus {
        let mut world = self.world.lock();
        let now = world.now_us;
        world.bus.lane_status(lane, now)
    }

    fn link_health(&self) -> LinkHealth {
        self.world.lock().bus.health
    }
}

/// Simulated one-pulse settle timer.
pub struct SimTimer {
    world: World,
}

impl SettleTimer for SimTimer {
    fn configure(&mut self, period_ms: u32) -> Result<(), HalError> {
        if period_ms == 0 {
            return Err(HalError::ConfigError(
                "settle period must be greater than 0".to_string(),
            ));
        }
        self.world.lock().timer.period_ms = period_ms;
        Ok(())
    }

    fn disarm(&mut self) {
        self.world.lock().timer.disarm();
    }

    fn reset_counter(&mut self) {
        self.world.lock().timer.reset_counter();
    }

    fn arm_one_shot(&mut self) {
        self.world.lock().timer.arm();
    }

    fn is_elapsed(&self) -> bool {
        self.world.lock().timer.elapsed
    }

    fn clear_elapsed(&mut self) {
        self.world.lock().timer.elapsed = false;
    }
}

/// Simulated focus bridge.
pub struct SimFocus {
    world: World,
}

impl FocusActuator for SimFocus {
    fn set_enabled(&mut self, enabled: bool) {
        self.world.lock().focus.enabled = enabled;
    }

    fn drive(&mut self, command: FocusDrive) {
        self.world.lock().focus.drive = command;
    }
}

/// Simulated rotary bridges.
pub struct SimRotary {
    world: World,
}

impl RotaryActuator for SimRotary {
    fn set_enabled(&mut self, enabled: bool) {
        self.world.lock().rotary.enabled = enabled;
    }

    fn drive(&mut self, axis_a: AxisDrive, axis_b: AxisDrive) {
        let mut world = self.world.lock();
        let at_us = world.now_us;
        world.rotary.drive = (axis_a, axis_b);
        push_bounded(
            &mut world.rotary_history,
            RotaryCommand {
                at_us,
                axis_a,
                axis_b,
            },
        );
    }
}
