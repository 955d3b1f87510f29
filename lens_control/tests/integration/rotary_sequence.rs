//! Integration test: rotary selector transitions on the simulated mechanism.

use lens_common::control::config::{LensConfig, SettlePolicy};
use lens_common::control::flags::StatusFlags;
use lens_common::control::types::{AxisDrive, Phase};
use lens_control::sequencer::transition_drive;
use lens_sim::SimParams;

use super::harness::{HOMED_MS, Rig, payload};

/// Settle window plus margin [ms].
const SETTLE_MS: u64 = 1_001;

fn homed() -> Rig {
    Rig::homed(LensConfig::default(), SimParams::default())
}

#[test]
fn phase0_to_phase2_drives_axis_b_then_settles() {
    let mut rig = homed();
    rig.command(payload(0, 2));

    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Idle, AxisDrive::Forward));
    assert_eq!(rig.controller.sequencer().current_phase(), Phase::Phase2);
    assert!(rig.controller.sequencer().transition_in_progress());
    assert!(rig.board.timer_armed());

    rig.run_ms(SETTLE_MS);

    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Idle, AxisDrive::Idle));
    assert!(!rig.controller.sequencer().transition_in_progress());
    assert!(!rig.controller.sequencer_status().contains(StatusFlags::NOT_STARTED));
    assert_eq!(rig.board.mechanical_phase(), Some(Phase::Phase2));
}

#[test]
fn mechanism_follows_a_tour_of_all_phases() {
    let mut rig = homed();
    for phase in [Phase::Phase1, Phase::Phase2, Phase::Phase0, Phase::Phase2, Phase::Phase1] {
        rig.command(payload(0, phase.as_u8()));
        rig.run_ms(SETTLE_MS);
        assert_eq!(rig.controller.sequencer().current_phase(), phase);
        assert_eq!(rig.board.mechanical_phase(), Some(phase));
    }
    assert_eq!(rig.controller.sequencer().stats().transitions, 5);
}

#[test]
fn drive_history_only_uses_table_pairs() {
    let mut rig = homed();
    let tour = [
        Phase::Phase2,
        Phase::Phase1,
        Phase::Phase0,
        Phase::Phase1,
        Phase::Phase2,
        Phase::Phase0,
    ];
    for phase in tour {
        rig.command(payload(0, phase.as_u8()));
        rig.run_ms(SETTLE_MS);
    }

    let history = rig.board.rotary_history();
    // Homing, then release.
    assert_eq!(
        (history[0].axis_a, history[0].axis_b),
        (AxisDrive::Reverse, AxisDrive::Reverse)
    );

    let mut from = Phase::Phase0;
    let drives: Vec<_> = history[1..]
        .iter()
        .map(|c| (c.axis_a, c.axis_b))
        .filter(|&d| d != (AxisDrive::Idle, AxisDrive::Idle))
        .collect();
    assert_eq!(drives.len(), tour.len());
    for (drive, to) in drives.into_iter().zip(tour) {
        assert_eq!(Some(drive), transition_drive(from, to));
        from = to;
    }
}

#[test]
fn repeated_target_does_not_retrigger() {
    let mut rig = homed();
    rig.command(payload(0, 1));
    rig.run_ms(SETTLE_MS);
    let before = rig.board.rotary_history().len();

    rig.command(payload(0, 1));
    rig.run_ms(10);
    assert_eq!(rig.board.rotary_history().len(), before);
    assert!(!rig.board.timer_armed());
}

#[test]
fn restart_policy_retargets_mid_settle() {
    let mut rig = homed();
    rig.command(payload(0, 1));
    rig.run_ms(200);
    rig.command(payload(0, 2));

    let seq = rig.controller.sequencer();
    assert_eq!(seq.current_phase(), Phase::Phase2);
    assert_eq!(seq.stats().restarts, 1);
    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Reverse, AxisDrive::Forward));

    // The window restarted with the second request.
    rig.run_ms(900);
    assert!(rig.controller.sequencer().transition_in_progress());
    rig.run_ms(110);
    assert!(!rig.controller.sequencer().transition_in_progress());
    assert_eq!(rig.board.mechanical_phase(), Some(Phase::Phase2));
}

#[test]
fn queue_policy_defers_until_settled() {
    let mut config = LensConfig::default();
    config.sequencer.settle_policy = SettlePolicy::Queue;
    let mut rig = Rig::homed(config, SimParams::default());

    rig.command(payload(0, 1));
    rig.run_ms(200);
    rig.command(payload(0, 0));
    rig.command(payload(0, 2));

    let seq = rig.controller.sequencer();
    assert_eq!(seq.current_phase(), Phase::Phase1);
    assert_eq!(seq.pending(), Some(Phase::Phase2));
    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Forward, AxisDrive::Idle));

    // First window expires; the latest queued request starts.
    rig.run_ms(810);
    let seq = rig.controller.sequencer();
    assert_eq!(seq.current_phase(), Phase::Phase2);
    assert_eq!(seq.pending(), None);
    assert!(seq.transition_in_progress());
    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Reverse, AxisDrive::Forward));

    rig.run_ms(SETTLE_MS);
    assert_eq!(rig.board.mechanical_phase(), Some(Phase::Phase2));
}

#[test]
fn queue_policy_applies_command_sent_while_homing() {
    let mut config = LensConfig::default();
    config.sequencer.settle_policy = SettlePolicy::Queue;
    let mut rig = Rig::started(config, SimParams::default());

    rig.run_ms(10);
    rig.command(payload(0, 2));
    assert_eq!(rig.controller.view().rotary_target(), Phase::Phase2);
    assert_eq!(rig.controller.sequencer().current_phase(), Phase::Phase0);
    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Reverse, AxisDrive::Reverse));

    // Homing settles at 1000 ms; the same step begins the transition.
    rig.run_ms(HOMED_MS);
    let seq = rig.controller.sequencer();
    assert_eq!(seq.current_phase(), Phase::Phase2);
    assert!(seq.transition_in_progress());
    assert_eq!(seq.pending(), None);
    assert_eq!(seq.stats().transitions, 1);
    assert_eq!(rig.board.rotary_drive(), (AxisDrive::Idle, AxisDrive::Forward));

    rig.run_ms(SETTLE_MS);
    assert!(!rig.controller.sequencer().transition_in_progress());
    assert_eq!(rig.board.mechanical_phase(), Some(Phase::Phase2));
}

#[test]
fn short_settle_window_from_config() {
    let mut config = LensConfig::default();
    config.sequencer.settle_ms = 100;
    let mut rig = Rig::started(config, SimParams::default());
    rig.run_ms(101);
    assert!(rig.controller.sequencer().is_ready());
}
