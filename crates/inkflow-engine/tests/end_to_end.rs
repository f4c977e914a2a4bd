//! Integration test: whole-pipeline behaviour with the CPU kernels.
//!
//! Covers the scripted single-drop scenario, the constant scenario's
//! forcing cadence, the projection's effect on divergence, and the
//! three ways a run can end.

use inkflow_core::{Field, FieldReader, FrameId, GridDims, InkChannel};
use inkflow_engine::{NullSink, SimConfig, SimParams, Simulation, StopReason, TimeStepScheduler};
use inkflow_forcing::{ForcingSource, LiveInput, Scenario, ScenarioGenerator, ScriptedEvents};
use inkflow_ops::{CpuOperators, FluidOperators, Velocity};
use inkflow_test_utils::fixtures::l2_norm;
use inkflow_test_utils::{IdentityOperators, RecordingOperators};

fn cpu_scheduler(width: usize, height: usize) -> TimeStepScheduler {
    TimeStepScheduler::new(
        &SimConfig::new(width, height),
        SimParams::default(),
        Box::new(CpuOperators::new()),
    )
    .unwrap()
}

fn total_ink(scheduler: &TimeStepScheduler) -> f64 {
    scheduler
        .fields()
        .snapshot(scheduler.frame())
        .total_ink()
}

// ── Scripted single drop ────────────────────────────────────────

#[test]
fn single_drop_lands_at_centre_then_holds() {
    let dims = GridDims::new(64, 64);
    let mut scheduler = cpu_scheduler(64, 64);
    let mut script = ScriptedEvents::parse("0 10 0.5 0.5 0.5 0.5 50\n", dims).unwrap();

    scheduler.step(&mut script, &mut NullSink).unwrap();
    let red = scheduler.fields().current(Field::InkRed);
    let centre = red[dims.index(32, 32)];
    assert!(centre > 0.0);
    for (x, y) in [(31, 32), (33, 32), (32, 31), (32, 33)] {
        assert!(
            centre > red[dims.index(x, y)],
            "centre {centre} not above neighbour ({x}, {y})"
        );
    }

    // Frames 1..=10; the event emits through frame 9.
    for _ in 1..=10 {
        scheduler.step(&mut script, &mut NullSink).unwrap();
    }
    assert!(script.is_exhausted());

    let mut previous = total_ink(&scheduler);
    for _ in 11..30 {
        let metrics = scheduler.step(&mut script, &mut NullSink).unwrap();
        assert_eq!(metrics.forcing_actions, 0);
        let now = total_ink(&scheduler);
        assert!(
            now <= previous + 1e-6 * previous.max(1.0),
            "ink mass grew from {previous} to {now}"
        );
        previous = now;
    }
}

// ── Scenario cadence ────────────────────────────────────────────

#[test]
fn constant_scenario_forces_every_tenth_frame() {
    let dims = GridDims::new(32, 32);
    let mut scheduler = cpu_scheduler(32, 32);
    let mut scenario = ScenarioGenerator::new(Scenario::Constant, dims);

    let mut forced = Vec::new();
    for frame in 0..100 {
        let metrics = scheduler.step(&mut scenario, &mut NullSink).unwrap();
        if metrics.forcing_actions > 0 {
            assert_eq!(metrics.forcing_actions, InkChannel::ALL.len());
            forced.push(frame);
        }
    }
    assert_eq!(forced, (0..100).step_by(10).collect::<Vec<u64>>());
}

#[test]
fn identity_operators_accumulate_exact_amounts() {
    let dims = GridDims::new(32, 32);
    let mut scheduler = TimeStepScheduler::new(
        &SimConfig::new(32, 32),
        SimParams::default(),
        Box::new(IdentityOperators),
    )
    .unwrap();
    let mut scenario = ScenarioGenerator::new(Scenario::Constant, dims);
    for _ in 0..25 {
        scheduler.step(&mut scenario, &mut NullSink).unwrap();
    }
    // Frames 0, 10 and 20 each add 50 red, 30 green and 10 blue.
    let (cx, cy) = dims.center();
    let i = dims.checked_index(cx, cy).unwrap();
    let fields = scheduler.fields();
    assert_eq!(fields.current(Field::InkRed)[i], 150.0);
    assert_eq!(fields.current(Field::InkGreen)[i], 90.0);
    assert_eq!(fields.current(Field::InkBlue)[i], 30.0);
    assert_eq!(fields.current(Field::VelocityX)[i], 300.0);
}

// ── Projection ──────────────────────────────────────────────────

#[test]
fn projection_reduces_divergence_every_frame() {
    let dims = GridDims::new(32, 32);
    let ops = RecordingOperators::cpu();
    let log = ops.log();
    let mut scheduler = TimeStepScheduler::new(
        &SimConfig::new(32, 32),
        SimParams::default(),
        Box::new(ops),
    )
    .unwrap();
    let mut scenario = ScenarioGenerator::new(Scenario::Constant, dims);
    let cpu = CpuOperators::new();
    let mut div = vec![0.0; dims.cell_count()];

    for frame in 0..30 {
        scheduler.step(&mut scenario, &mut NullSink).unwrap();
        let before = *log.divergence_norms().last().unwrap();

        let snapshot = scheduler.fields().snapshot(FrameId(frame));
        let vel = Velocity {
            u: snapshot.read(Field::VelocityX),
            v: snapshot.read(Field::VelocityY),
        };
        cpu.divergence(
            scheduler.context(),
            vel,
            scheduler.params().halfrdx(),
            &mut div,
        )
        .unwrap();
        let after = l2_norm(&div);

        if before > 1e-6 {
            assert!(
                after < before,
                "frame {frame}: divergence {before} -> {after}"
            );
        }
    }
}

// ── Run termination ─────────────────────────────────────────────

#[test]
fn scripted_run_ends_when_script_is_exhausted() {
    let config = SimConfig::new(16, 16);
    let text = "0 4 0.2 0.8 0.5 0.5 20\n2 6 0.5 0.5 0.2 0.8 10\n";
    let script = ScriptedEvents::parse(text, config.dims()).unwrap();
    let mut sim = Simulation::new(
        &config,
        SimParams::default(),
        Box::new(CpuOperators::new()),
        Some(Box::new(script)),
        Box::new(NullSink),
    )
    .unwrap()
    .with_frame_limit(1000);

    let summary = sim.run().unwrap();
    assert_eq!(summary.reason, StopReason::SourceExhausted);
    // The last event retires when frame 6 asks for forcing.
    assert_eq!(summary.frames, 7);
}

#[test]
fn live_run_ends_when_input_disconnects() {
    let config = SimConfig::new(16, 16);
    let (live, sender) = LiveInput::new(config.height);
    drop(sender);
    let mut sim = Simulation::new(
        &config,
        SimParams::default(),
        Box::new(CpuOperators::new()),
        Some(Box::new(live)),
        Box::new(NullSink),
    )
    .unwrap();
    let summary = sim.run().unwrap();
    assert_eq!(summary.reason, StopReason::SourceExhausted);
}

#[test]
fn stop_from_another_thread() {
    let config = SimConfig::new(16, 16);
    let mut sim = Simulation::new(
        &config,
        SimParams::default(),
        Box::new(CpuOperators::new()),
        None,
        Box::new(NullSink),
    )
    .unwrap();
    let stop = sim.stop_handle();
    let worker = std::thread::spawn(move || sim.run().unwrap());
    stop.stop();
    let summary = worker.join().unwrap();
    assert_eq!(summary.reason, StopReason::Stopped);
}
