//! Integration test: bus commands, status replies and link health.

use lens_common::bus::frame::OutboundMessage;
use lens_common::consts::{BUS_ID_STATUS, FRAME_DLC};
use lens_common::control::config::LensConfig;
use lens_common::control::flags::StatusFlags;
use lens_common::control::types::Phase;
use lens_control::config::load_config_from_str;
use lens_control::error::TransmitError;
use lens_sim::SimParams;

use super::harness::{Rig, params_at, payload};

fn running_at(raw: u32) -> Rig {
    let mut rig = Rig::started(LensConfig::default(), params_at(raw));
    rig.run_ms(2);
    rig
}

// ── Commands ────────────────────────────────────────────────────────

#[test]
fn command_updates_both_targets() {
    let mut rig = running_at(0);
    rig.command(0x0000_3202);

    let view = rig.controller.view();
    assert_eq!(view.focus_target(), 50);
    assert_eq!(view.rotary_target(), Phase::Phase2);

    let stats = rig.controller.bus().stats();
    assert_eq!(stats.commands, 1);
    assert_eq!(stats.focus_applied, 1);
    assert_eq!(stats.rotary_applied, 1);
    assert_eq!(stats.fields_rejected, 0);
}

#[test]
fn undefined_rotary_keeps_previous_phase() {
    let mut rig = running_at(0);
    rig.command(payload(10, 1));
    rig.command(payload(40, 0x05));

    let view = rig.controller.view();
    assert_eq!(view.rotary_target(), Phase::Phase1);
    assert_eq!(view.focus_target(), 40);
    assert_eq!(rig.controller.bus().stats().fields_rejected, 1);
}

#[test]
fn focus_above_limit_is_ignored_independently() {
    let config = load_config_from_str("[focus]\nmax_target = 100\n").unwrap();
    let mut rig = Rig::started(config, SimParams::default());
    rig.run_ms(2);
    rig.command(payload(30, 0));
    rig.command(payload(200, 2));

    let view = rig.controller.view();
    assert_eq!(view.focus_target(), 30);
    assert_eq!(view.rotary_target(), Phase::Phase2);

    // Inclusive limit.
    rig.command(payload(100, 2));
    assert_eq!(rig.controller.view().focus_target(), 100);
}

#[test]
fn upper_payload_bits_are_ignored() {
    let mut rig = running_at(0);
    rig.command(0xABCD_0A01);
    assert_eq!(rig.controller.view().focus_target(), 10);
    assert_eq!(rig.controller.view().rotary_target(), Phase::Phase1);
}

#[test]
fn unknown_identifiers_never_reach_the_core() {
    let mut rig = running_at(0);
    assert!(!rig.board.inject_frame(0x100, payload(99, 2), 0));
    rig.tick();
    assert_eq!(rig.board.filtered_out(), 1);
    assert_eq!(rig.controller.bus().stats().frames_received, 0);
}

// ── Status replies ──────────────────────────────────────────────────

#[test]
fn status_request_reports_rotary_target_and_position() {
    let mut rig = running_at(2050);
    rig.command(payload(20, 1));
    rig.board.take_sent_frames();

    assert!(rig.board.request_status());
    rig.tick();

    let frames = rig.board.take_sent_frames();
    assert_eq!(frames.len(), 1);
    let frame = frames[0];
    assert_eq!(frame.lane, 0);
    assert_eq!(frame.raw_id, BUS_ID_STATUS);
    assert_eq!(frame.dlc, FRAME_DLC);
    assert_eq!(frame.data_low & 0xFF, 1);
    assert_eq!((frame.data_low >> 8) & 0xFF, 20);
    assert_eq!(frame.data_high, 0);
    assert_eq!(rig.controller.bus().stats().replies_sent, 1);
}

#[test]
fn status_lane_follows_config() {
    let config = load_config_from_str("[bus]\nstatus_lane = 2\n").unwrap();
    let mut rig = Rig::started(config, SimParams::default());
    rig.run_ms(2);
    rig.board.request_status();
    rig.tick();
    assert_eq!(rig.board.sent_frames()[0].lane, 2);
}

#[test]
fn failed_reply_is_counted_not_retried() {
    let mut rig = running_at(0);
    rig.board.inject_arbitration_loss(1);
    rig.board.request_status();
    rig.tick();

    assert!(rig.board.sent_frames().is_empty());
    let stats = rig.controller.bus().stats();
    assert_eq!(stats.replies_failed, 1);
    assert_eq!(stats.replies_sent, 0);

    // The next request goes through.
    rig.board.request_status();
    rig.tick();
    assert_eq!(rig.board.sent_frames().len(), 1);
}

#[test]
fn explicit_send_reports_terminal_errors() {
    let config = load_config_from_str("[bus]\ntx_poll_limit = 50\n").unwrap();
    let mut rig = Rig::started(config, SimParams::default());
    rig.run_ms(2);
    let msg = OutboundMessage::status(0x1234);
    let bus = rig.controller.bus_mut();

    assert_eq!(bus.send(0, &msg), Ok(()));

    rig.board.inject_transmit_errors(1);
    let bus = rig.controller.bus_mut();
    assert_eq!(bus.send(1, &msg), Err(TransmitError::TransmitFailed { lane: 1 }));

    rig.board.inject_arbitration_loss(1);
    let bus = rig.controller.bus_mut();
    assert_eq!(bus.send(1, &msg), Err(TransmitError::ArbitrationLost { lane: 1 }));

    rig.board.set_lane_unresponsive(2, true);
    let bus = rig.controller.bus_mut();
    assert_eq!(
        bus.send(2, &msg),
        Err(TransmitError::Unresponsive { lane: 2, polls: 50 })
    );
    assert_eq!(
        bus.send(3, &msg),
        Err(TransmitError::InvalidLane { lane: 3, lanes: 3 })
    );
}

// ── Link health ─────────────────────────────────────────────────────

#[test]
fn receive_overrun_clears_after_one_query() {
    let mut rig = running_at(0);
    for focus in 1..=3 {
        assert!(rig.board.send_command(payload(focus, 0)));
    }
    assert!(!rig.board.send_command(payload(4, 0)));
    rig.tick();

    // The three queued frames were applied in order.
    assert_eq!(rig.controller.view().focus_target(), 3);
    assert!(rig.controller.bus_status().contains(StatusFlags::OVERRUN));
    assert!(!rig.controller.bus_status().contains(StatusFlags::OVERRUN));
}

#[test]
fn error_counters_and_bus_off_are_reported() {
    let mut rig = running_at(0);
    assert!(rig.controller.bus_status().is_empty());

    rig.board.set_error_counters(3, 0);
    assert_eq!(rig.controller.bus_status(), StatusFlags::ERROR);

    rig.board.set_error_counters(0, 0);
    assert!(rig.controller.bus_status().is_empty());

    rig.board.set_bus_off(true);
    assert!(rig.controller.bus_status().contains(StatusFlags::BUS_OFF));
    // Nothing gets through while off the bus.
    assert!(!rig.board.send_command(payload(9, 1)));

    rig.board.set_bus_off(false);
    assert!(!rig.controller.bus_status().contains(StatusFlags::BUS_OFF));
}
