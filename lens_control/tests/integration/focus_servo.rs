//! Integration test: focus servo closing on the simulated carriage.

use lens_common::control::config::LensConfig;
use lens_common::control::flags::StatusFlags;
use lens_common::control::types::FocusDrive;
use lens_sim::SimParams;

use super::harness::{Rig, params_at, payload};

fn scaled(raw: u32) -> u32 {
    raw / 100
}

fn running_at(raw: u32) -> Rig {
    let mut rig = Rig::started(LensConfig::default(), params_at(raw));
    rig.run_ms(2);
    rig
}

#[test]
fn carriage_moves_forward_to_target_and_stops() {
    let mut rig = running_at(2050);
    rig.command(payload(25, 0));
    rig.run_ms(2);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Forward);

    // 450 counts at 2 counts/ms.
    rig.run_ms(300);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Stop);
    assert_eq!(scaled(rig.board.focus_position_raw()), 25);
    assert_eq!(rig.controller.snapshot().focus_position, 25);
}

#[test]
fn carriage_moves_back_to_target_and_stops() {
    let mut rig = running_at(2050);
    rig.command(payload(10, 0));
    rig.run_ms(2);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Back);

    rig.run_ms(600);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Stop);
    assert_eq!(scaled(rig.board.focus_position_raw()), 10);
}

#[test]
fn retarget_reverses_direction() {
    let mut rig = running_at(2050);
    rig.command(payload(40, 0));
    rig.run_ms(100);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Forward);

    rig.command(payload(5, 0));
    rig.run_ms(2);
    assert_eq!(rig.board.focus_drive(), FocusDrive::Back);
    assert!(rig.controller.servo().changes() >= 2);
}

#[test]
fn transfer_error_disables_focus_group_until_clean_sample() {
    let mut rig = running_at(2050);
    assert!(rig.board.focus_enabled());

    rig.board.inject_transfer_errors(1);
    rig.run_ms(1);
    assert!(!rig.board.focus_enabled());
    assert!(rig.controller.sampler_status().contains(StatusFlags::ERROR));
    assert!(!rig.controller.sampler().is_ready());

    rig.run_ms(1);
    assert!(rig.board.focus_enabled());
    assert!(rig.controller.sampler_status().is_empty());
    assert_eq!(rig.controller.sampler().stats().transfer_errors, 1);
}

#[test]
fn faulted_transfer_is_not_published() {
    let mut rig = running_at(2050);
    let before = rig.controller.view().sample_snapshot().sequence;

    rig.board.inject_transfer_errors(1);
    rig.run_ms(1);
    assert_eq!(rig.controller.view().sample_snapshot().sequence, before);

    rig.run_ms(1);
    assert!(rig.controller.view().sample_snapshot().sequence > before);
}

#[test]
fn focus_guard_holds_during_sampling_fault() {
    let mut rig = running_at(2050);
    rig.board.inject_transfer_errors(1);
    rig.run_ms(1);
    let passes = rig.controller.stats().focus_passes;

    rig.command(payload(40, 0));
    assert_eq!(rig.controller.stats().focus_passes, passes);
}

#[test]
fn loop_counts_stale_iterations_between_samples() {
    let mut rig = running_at(2050);
    rig.run_ms(10);
    let stats = rig.controller.stats();

    // Ten loop passes per sample at the default tick.
    assert!(stats.focus_passes >= 100);
    assert!(stats.stale_samples >= stats.focus_passes * 8 / 10);
    assert!(stats.transfer_interrupts >= 11);
}

#[test]
fn noisy_sensor_still_settles_near_target() {
    let params = SimParams {
        initial_position_raw: 1000,
        noise_counts: 3,
        seed: 42,
        ..SimParams::default()
    };
    let mut rig = Rig::started(LensConfig::default(), params);
    rig.run_ms(2);
    rig.command(payload(15, 0));
    rig.run_ms(400);

    let position = scaled(rig.board.focus_position_raw());
    assert!((14..=15).contains(&position), "position {position}");
}
