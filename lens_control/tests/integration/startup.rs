//! Integration test: startup sequence.
//!
//! Validates: config validation → init order → first sample seeds the
//! focus target → rotary homing releases the sequencer.

use lens_common::config::ConfigError;
use lens_common::control::config::LensConfig;
use lens_common::control::flags::{StatusFlags, Subsystem};
use lens_common::control::types::{AxisDrive, FocusDrive, Phase};
use lens_control::config::load_config_from_str;
use lens_control::sim::SimController;
use lens_control::error::ControlError;
use lens_control::sampler::SamplerState;
use lens_sim::{SimBoard, SimParams};

use super::harness::{HOMED_MS, Rig, params_at};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn invalid_config_is_rejected_before_wiring() {
    let mut config = LensConfig::default();
    config.bus.status_lane = 5;
    let (_board, peripherals) = SimBoard::new(SimParams::default());
    let result = SimController::new(config, peripherals.into());
    assert!(matches!(
        result,
        Err(ControlError::Config(ConfigError::ValidationError(_)))
    ));
}

#[test]
fn init_installs_filters_and_marks_not_started() {
    let mut rig = Rig::initialized(LensConfig::default(), SimParams::default());

    assert_eq!(rig.board.bus_filters(), vec![0x92, 0x93]);
    assert!(!rig.board.bus_started());
    assert!(!rig.board.sampler_running());
    assert_eq!(rig.board.timer_period_ms(), 1000);

    let plan = rig.board.sampler_plan().unwrap();
    assert_eq!(plan.period_us, 1000);
    assert!(plan.circular);

    assert!(rig.controller.sampler_status().contains(StatusFlags::NOT_STARTED));
    assert!(rig.controller.sequencer_status().contains(StatusFlags::NOT_STARTED));
    assert_eq!(rig.controller.sampler().state(), SamplerState::Armed);
}

#[test]
fn lifecycle_order_is_enforced() {
    let (_board, peripherals) = SimBoard::new(SimParams::default());
    let mut controller = SimController::new(LensConfig::default(), peripherals.into()).unwrap();
    assert!(matches!(
        controller.start(),
        Err(ControlError::Lifecycle { .. })
    ));
    controller.init().unwrap();
    assert!(controller.init().is_err());
    controller.start().unwrap();
    assert!(controller.start().is_err());
}

#[test]
fn start_homes_rotary_selector() {
    let rig = Rig::started(LensConfig::default(), SimParams::default());

    assert!(rig.board.bus_started());
    assert!(rig.board.sampler_running());
    assert!(rig.board.rotary_enabled());
    assert_eq!(
        rig.board.rotary_drive(),
        (AxisDrive::Reverse, AxisDrive::Reverse)
    );
    assert!(rig.board.timer_armed());
    assert_eq!(rig.controller.sequencer().current_phase(), Phase::Phase0);
    assert!(rig.controller.sequencer().transition_in_progress());
}

#[test]
fn first_sample_seeds_focus_target() {
    let mut rig = Rig::started(LensConfig::default(), params_at(2050));
    assert!(!rig.board.focus_enabled());

    rig.run_ms(1);

    assert_eq!(rig.controller.view().focus_target(), 20);
    assert!(rig.board.focus_enabled());
    assert_eq!(rig.controller.sampler().state(), SamplerState::Sampling);
    assert!(rig.controller.sampler_status().is_empty());

    // The carriage holds still at its power-up position.
    rig.run_ms(50);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Stop);
    assert_eq!(rig.board.focus_position_raw(), 2050);
}

#[test]
fn seed_is_clamped_to_max_target() {
    let config = load_config_from_str("[focus]\nmax_target = 30\n").unwrap();
    let mut rig = Rig::started(config, params_at(4000));
    rig.run_ms(1);
    assert_eq!(rig.controller.view().focus_target(), 30);
}

#[test]
fn sequencer_ready_after_homing_window() {
    let mut rig = Rig::started(LensConfig::default(), SimParams::default());

    rig.run_ms(999);
    assert!(rig.controller.sequencer_status().contains(StatusFlags::NOT_STARTED));
    assert!(!rig.controller.sequencer().is_ready());

    rig.run_ms(HOMED_MS - 999);
    assert!(rig.controller.sequencer_status().is_empty());
    assert!(!rig.controller.sequencer().transition_in_progress());
    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Idle, AxisDrive::Idle));
    assert_eq!(rig.board.mechanical_phase(), Some(Phase::Phase0));
    assert_eq!(rig.controller.stats().settle_interrupts, 1);
}

#[test]
fn rotary_guard_waits_for_homing() {
    let mut rig = Rig::started(LensConfig::default(), SimParams::default());
    rig.run_ms(10);
    rig.command(0x0001);

    // Target accepted, but the selector does not move while homing.
    assert_eq!(rig.controller.view().rotary_target(), Phase::Phase1);
    assert_eq!(rig.controller.sequencer().current_phase(), Phase::Phase0);
    assert_eq!(rig.controller.stats().rotary_passes, 0);

    rig.run_ms(HOMED_MS);
    assert_eq!(rig.controller.sequencer().current_phase(), Phase::Phase1);
}

#[test]
fn sampler_overrun_survives_until_one_status_query() {
    let mut rig = Rig::started(LensConfig::default(), SimParams::default());
    rig.run_ms(5);
    let completions = rig.board.sampler_completions();
    let serviced = rig.controller.stats().transfer_interrupts;
    assert_eq!(completions, serviced);

    // Two trigger edges with no interrupt service in between.
    rig.board.advance(2_000);
    assert_eq!(rig.board.sampler_completions(), completions + 2);
    assert!(rig.controller.service_interrupts().transfer);
    assert_eq!(rig.controller.stats().transfer_interrupts, serviced + 1);
    assert_eq!(rig.controller.sampler().stats().overruns, 1);

    // Clean completions and loop passes leave the flag set.
    rig.run_ms(5);
    let flags = rig.controller.view().flags(Subsystem::Sampler);
    assert!(flags.contains(StatusFlags::OVERRUN));
    assert!(rig.controller.sampler().is_ready());

    assert!(rig.controller.sampler_status().contains(StatusFlags::OVERRUN));
    assert!(!rig.controller.sampler_status().contains(StatusFlags::OVERRUN));
    assert!(rig.controller.view().flags(Subsystem::Sampler).is_empty());
}
