//! Controller: interrupt servicing and the cooperative main loop.
//!
//! ## Execution model
//! Single core. Three interrupt sources (bus receive, acquisition
//! completion, settle timer) preempt the main loop and never each other.
//! `&mut self` on every entry point gives the same exclusivity: a handler
//! and the loop body can never overlap.
//!
//! ## Step
//! 1. `service_interrupts()` runs every pending handler back-to-back.
//! 2. `iterate()` runs one main-loop pass: rotary guard, then focus guard.

use lens_common::control::config::LensConfig;
use lens_common::control::flags::{StatusFlags, Subsystem};
use lens_common::control::types::{FocusDrive, Phase};
use lens_common::hal::driver::{
    BusPeripheral, FocusActuator, RotaryActuator, SamplerPeripheral, SettleTimer,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::bus::{BusLink, LinkStats};
use crate::error::ControlError;
use crate::sampler::{PositionSampler, SamplerStats};
use crate::sequencer::{PhaseRequest, RotarySequencer, SequencerStats};
use crate::servo::FocusServo;
use crate::shared::{SharedControlState, StateView};

// ─── Loop Statistics ────────────────────────────────────────────────

/// O(1) per-iteration main loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    /// Main loop passes.
    pub iterations: u64,
    /// Passes where the rotary guard held.
    pub rotary_passes: u64,
    /// Passes where the focus guard held.
    pub focus_passes: u64,
    /// Focus passes that saw the same sample as the previous pass.
    pub stale_samples: u64,
    /// Commit sequence of the last sample the servo consumed.
    pub last_sample_sequence: u32,
    /// Receive interrupts serviced.
    pub bus_interrupts: u64,
    /// Acquisition interrupts serviced.
    pub transfer_interrupts: u64,
    /// Settle interrupts serviced.
    pub settle_interrupts: u64,
}

/// Step timing, measured by the caller. Same layout as a cycle timer:
/// min/max/avg with no allocation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepTiming {
    pub count: u64,
    pub last_ns: u64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub sum_ns: u64,
}

impl StepTiming {
    pub const fn new() -> Self {
        Self {
            count: 0,
            last_ns: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.count += 1;
        self.last_ns = duration_ns;
        self.min_ns = self.min_ns.min(duration_ns);
        self.max_ns = self.max_ns.max(duration_ns);
        self.sum_ns = self.sum_ns.saturating_add(duration_ns);
    }

    /// Average step time [ns] (returns 0 if no steps).
    #[inline]
    pub fn avg_ns(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum_ns / self.count
        }
    }
}

impl Default for StepTiming {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupts handled by one `service_interrupts` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceReport {
    pub bus: u32,
    pub transfer: bool,
    pub settle: bool,
}

// ─── Snapshot ───────────────────────────────────────────────────────

/// Flag words as bits, for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagBits {
    pub bus: u8,
    pub sampler: u8,
    pub sequencer: u8,
}

/// Observable state of the controller at one instant. Non-destructive.
#[derive(Debug, Clone, Serialize)]
pub struct ControlSnapshot {
    pub focus_target: u32,
    pub focus_position: u32,
    pub focus_command: FocusDrive,
    pub rotary_target: Phase,
    pub current_phase: Phase,
    pub transition_in_progress: bool,
    pub sample_sequence: u32,
    pub flags: FlagBits,
    pub loop_stats: LoopStats,
    pub link: LinkStats,
    pub sampler: SamplerStats,
    pub sequencer: SequencerStats,
}

// ─── Controller ─────────────────────────────────────────────────────

/// Peripheral set handed to the controller.
pub struct Peripherals<S, B, T, F, R> {
    pub sampler: S,
    pub bus: B,
    pub timer: T,
    pub focus: F,
    pub rotary: R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Initialized,
    Running,
}

/// Owns every component and the peripherals.
pub struct Controller<S, B, T, F, R>
where
    S: SamplerPeripheral,
    B: BusPeripheral,
    T: SettleTimer,
    F: FocusActuator,
    R: RotaryActuator,
{
    config: LensConfig,
    view: StateView,
    sampler: PositionSampler<S>,
    bus: BusLink<B>,
    sequencer: RotarySequencer<T, R>,
    servo: FocusServo,
    focus: F,
    lifecycle: Lifecycle,
    stats: LoopStats,
}

impl<S, B, T, F, R> Controller<S, B, T, F, R>
where
    S: SamplerPeripheral,
    B: BusPeripheral,
    T: SettleTimer,
    F: FocusActuator,
    R: RotaryActuator,
{
    /// Validate `config` and wire the components to one shared state.
    pub fn new(
        config: LensConfig,
        peripherals: Peripherals<S, B, T, F, R>,
    ) -> Result<Self, ControlError> {
        config.validate()?;

        let (view, targets, sampler_port, sequencer_port) = SharedControlState::new().split();
        let Peripherals {
            sampler,
            bus,
            timer,
            focus,
            rotary,
        } = peripherals;

        Ok(Self {
            sampler: PositionSampler::new(sampler, sampler_port, &config),
            bus: BusLink::new(bus, targets, view.clone(), &config),
            sequencer: RotarySequencer::new(timer, rotary, sequencer_port, &config),
            servo: FocusServo::new(config.focus.scaling()),
            view,
            focus,
            lifecycle: Lifecycle::Created,
            stats: LoopStats::default(),
            config,
        })
    }

    /// Sampler, sequencer, bus.
    pub fn init(&mut self) -> Result<(), ControlError> {
        if self.lifecycle != Lifecycle::Created {
            return Err(ControlError::lifecycle("controller", "already initialized"));
        }
        self.sampler.init()?;
        self.sequencer.init()?;
        self.bus.init()?;
        self.lifecycle = Lifecycle::Initialized;
        info!("{} initialized", self.config.shared.service_name);
        Ok(())
    }

    /// Sampler, sequencer, bus.
    pub fn start(&mut self) -> Result<(), ControlError> {
        if self.lifecycle != Lifecycle::Initialized {
            return Err(ControlError::lifecycle(
                "controller",
                "start requires a fresh init",
            ));
        }
        self.sampler.start()?;
        self.sequencer.start()?;
        self.bus.start()?;
        self.lifecycle = Lifecycle::Running;
        info!("{} running", self.config.shared.service_name);
        Ok(())
    }

    /// Run every pending interrupt handler.
    pub fn service_interrupts(&mut self) -> ServiceReport {
        let mut report = ServiceReport::default();

        while self.bus.rx_pending() {
            self.bus.on_receive();
            report.bus += 1;
        }
        self.stats.bus_interrupts += u64::from(report.bus);

        if let Some(outcome) = self.sampler.service() {
            if let Some(enabled) = outcome.focus_enable() {
                self.focus.set_enabled(enabled);
            }
            report.transfer = true;
            self.stats.transfer_interrupts += 1;
        }

        if self.sequencer.settle_pending() {
            if let Some(PhaseRequest::Started { from, to }) = self.sequencer.on_settle_elapsed() {
                debug!(?from, ?to, "Queued transition started");
            }
            report.settle = true;
            self.stats.settle_interrupts += 1;
        }

        report
    }

    /// One main-loop pass. The two guards are independent.
    pub fn iterate(&mut self) {
        self.stats.iterations += 1;

        if self.sequencer.is_ready() {
            self.stats.rotary_passes += 1;
            self.sequencer.set_phase(self.view.rotary_target());
        }

        if self.sampler.is_ready() {
            self.stats.focus_passes += 1;
            let snapshot = self.view.sample_snapshot();
            if snapshot.sequence == self.stats.last_sample_sequence {
                self.stats.stale_samples += 1;
            }
            self.stats.last_sample_sequence = snapshot.sequence;

            let command = self
                .servo
                .update(&snapshot.sample, self.view.focus_target());
            self.focus.drive(command);
        }
    }

    /// `service_interrupts` then `iterate`.
    pub fn step(&mut self) -> ServiceReport {
        let report = self.service_interrupts();
        self.iterate();
        report
    }

    // ─── Status queries ─────────────────────────────────────────────

    /// Bus flags; clears OVERRUN.
    pub fn bus_status(&mut self) -> StatusFlags {
        self.bus.query_status()
    }

    /// Sampler flags; clears OVERRUN.
    pub fn sampler_status(&mut self) -> StatusFlags {
        self.sampler.query_status()
    }

    pub fn sequencer_status(&self) -> StatusFlags {
        self.sequencer.query_status()
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let sample = self.view.sample_snapshot();
        ControlSnapshot {
            focus_target: self.view.focus_target(),
            focus_position: self.sampler.scaling().position(&sample.sample),
            focus_command: self.servo.last_command(),
            rotary_target: self.view.rotary_target(),
            current_phase: self.sequencer.current_phase(),
            transition_in_progress: self.sequencer.transition_in_progress(),
            sample_sequence: sample.sequence,
            flags: FlagBits {
                bus: self.view.flags(Subsystem::Bus).bits(),
                sampler: self.view.flags(Subsystem::Sampler).bits(),
                sequencer: self.view.flags(Subsystem::Sequencer).bits(),
            },
            loop_stats: self.stats,
            link: self.bus.stats(),
            sampler: self.sampler.stats(),
            sequencer: self.sequencer.stats(),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    pub fn view(&self) -> &StateView {
        &self.view
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn sampler(&self) -> &PositionSampler<S> {
        &self.sampler
    }

    pub fn bus(&self) -> &BusLink<B> {
        &self.bus
    }

    /// Mutable bus link, for explicit transmissions.
    pub fn bus_mut(&mut self) -> &mut BusLink<B> {
        &mut self.bus
    }

    pub fn sequencer(&self) -> &RotarySequencer<T, R> {
        &self.sequencer
    }

    pub fn servo(&self) -> &FocusServo {
        &self.servo
    }

    pub fn focus_actuator(&self) -> &F {
        &self.focus
    }
}
