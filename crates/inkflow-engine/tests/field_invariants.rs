//! Property tests: invariants that hold after any frame.

use inkflow_core::{Field, ForcingAction, FrameId, InkChannel};
use inkflow_engine::{NullSink, SimConfig, SimParams, TimeStepScheduler};
use inkflow_ops::CpuOperators;
use inkflow_test_utils::ReplayForcing;
use proptest::prelude::*;

const SIDE: usize = 16;

fn arb_channel() -> impl Strategy<Value = InkChannel> {
    prop_oneof![
        Just(InkChannel::Red),
        Just(InkChannel::Green),
        Just(InkChannel::Blue),
    ]
}

fn arb_action() -> impl Strategy<Value = (u64, ForcingAction)> {
    (
        0u64..3,
        arb_channel(),
        -2i64..(SIDE as i64 + 2),
        -2i64..(SIDE as i64 + 2),
        -200.0f32..200.0,
        -200.0f32..200.0,
        0.0f32..100.0,
    )
        .prop_map(|(frame, channel, x, y, u, v, amount)| {
            (
                frame,
                ForcingAction {
                    channel,
                    x,
                    y,
                    u,
                    v,
                    amount,
                },
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn ink_stays_finite_and_non_negative(
        actions in proptest::collection::vec(arb_action(), 0..6),
    ) {
        let mut scheduler = TimeStepScheduler::new(
            &SimConfig::new(SIDE, SIDE),
            SimParams::default(),
            Box::new(CpuOperators::new()),
        )
        .unwrap();
        let mut forcing = ReplayForcing::new(
            actions.into_iter().map(|(f, a)| (FrameId(f), a)).collect(),
        );
        let pool = scheduler.fields().config().scratch_slots;

        for _ in 0..3 {
            scheduler.step(&mut forcing, &mut NullSink).unwrap();
            let fields = scheduler.fields();
            for field in [Field::InkRed, Field::InkGreen, Field::InkBlue] {
                for &value in fields.current(field) {
                    prop_assert!(value.is_finite() && value >= 0.0, "{field}: {value}");
                }
            }
            prop_assert_eq!(fields.scratch_available(), pool);
        }
    }
}
