//! Property tests: command decoding and rotary sequencing over arbitrary input.

use lens_common::control::config::LensConfig;
use lens_common::control::types::{AxisDrive, FocusDrive, Phase};
use lens_control::sequencer::{RotarySequencer, transition_drive};
use lens_control::servo::decide;
use lens_control::shared::SharedControlState;
use lens_sim::{SimBoard, SimParams};
use proptest::prelude::*;

use super::harness::Rig;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn command_fields_are_validated_independently(data_low in any::<u32>(), start in 0u8..3) {
        let mut rig = Rig::started(LensConfig::default(), SimParams::default());
        rig.run_ms(2);
        rig.command(u32::from(start));

        rig.command(data_low);

        let view = rig.controller.view();
        let rotary = (data_low & 0xFF) as u8;
        let focus = (data_low >> 8) & 0xFF;
        prop_assert_eq!(view.focus_target(), focus);
        let expected = Phase::from_u8(rotary).or(Phase::from_u8(start));
        prop_assert_eq!(Some(view.rotary_target()), expected);
    }

    #[test]
    fn servo_stops_only_on_equality(position in 0u32..=40, target in 0u32..=40) {
        let command = decide(position, target);
        prop_assert_eq!(command == FocusDrive::Stop, position == target);
        match command {
            FocusDrive::Forward => prop_assert!(position < target),
            FocusDrive::Back => prop_assert!(position > target),
            FocusDrive::Stop => {}
        }
    }

    #[test]
    fn any_phase_sequence_follows_the_table(requests in prop::collection::vec(0u8..3, 1..24)) {
        let (board, peripherals) = SimBoard::new(SimParams::default());
        let (_view, _targets, _sampler, port) = SharedControlState::new().split();
        let mut seq = RotarySequencer::new(
            peripherals.timer,
            peripherals.rotary,
            port,
            &LensConfig::default(),
        );
        seq.init().unwrap();

        let mut expected = Phase::Phase0;
        let mut drives = Vec::new();
        for raw in requests {
            let target = Phase::from_u8(raw).unwrap();
            if let Some(drive) = transition_drive(expected, target) {
                drives.push(drive);
            }
            seq.set_phase(target);
            expected = target;
            prop_assert_eq!(seq.current_phase(), expected);
        }

        let recorded: Vec<(AxisDrive, AxisDrive)> = board
            .rotary_history()
            .iter()
            .map(|c| (c.axis_a, c.axis_b))
            .collect();
        prop_assert_eq!(recorded, drives);
    }
}
