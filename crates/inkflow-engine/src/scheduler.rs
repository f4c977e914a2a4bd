//! The fractional-step scheduler.
//!
//! [`TimeStepScheduler`] executes one frame as a fixed sequence of
//! stages: `Boundary → Advect → Force → Diffuse → Project → Finalize`.
//! Every operator call goes through the injected [`FluidOperators`];
//! every buffer comes from the owned [`GridFieldSet`].
//!
//! # Stage ordering
//!
//! Advection precedes forcing, forcing precedes diffusion, and the
//! projection is the last stage that writes velocity. The Jacobi solves
//! run exactly `poisson_steps` sweeps with no residual check, so every
//! frame costs the same.

use std::time::Instant;

use inkflow_arena::{ArenaError, GridFieldSet};
use inkflow_core::{Field, FrameId, OperatorError, Stage};
use inkflow_forcing::ForcingSource;
use inkflow_ops::{FluidOperators, GridContext, Velocity};

use crate::config::{ConfigError, SimConfig};
use crate::error::StepError;
use crate::metrics::FrameMetrics;
use crate::params::SimParams;
use crate::sink::{ExportCadence, FrameView, SnapshotSink};

const INK_FIELDS: [Field; 3] = [Field::InkRed, Field::InkGreen, Field::InkBlue];

/// Boundary scale for velocity: no-slip.
const VELOCITY_SCALE: f32 = -1.0;
/// Boundary scale for pressure: pure Neumann.
const PRESSURE_SCALE: f32 = 1.0;
/// Boundary scale for ink: fixed zero.
const INK_SCALE: f32 = 0.0;

fn op_failed(stage: Stage, operator: &'static str) -> impl FnOnce(OperatorError) -> StepError {
    move |reason| StepError::OperatorFailed {
        stage,
        operator,
        reason,
    }
}

fn buffer_failed(stage: Stage) -> impl FnOnce(ArenaError) -> StepError {
    move |reason| StepError::Buffer { stage, reason }
}

fn velocity(fields: &GridFieldSet) -> Velocity<'_> {
    Velocity {
        u: fields.current(Field::VelocityX),
        v: fields.current(Field::VelocityY),
    }
}

/// Executes frames of the fractional-step pipeline.
///
/// Owns the field set exclusively. Field borrows handed to operators
/// and sinks never outlive the call that receives them.
pub struct TimeStepScheduler {
    fields: GridFieldSet,
    ops: Box<dyn FluidOperators>,
    ctx: GridContext,
    params: SimParams,
    cadence: ExportCadence,
    frame: FrameId,
    last_metrics: FrameMetrics,
}

impl TimeStepScheduler {
    /// Validate `config` and `params`, then allocate zeroed fields.
    pub fn new(
        config: &SimConfig,
        params: SimParams,
        ops: Box<dyn FluidOperators>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        params.validate()?;
        let fields = GridFieldSet::allocate(config.arena_config())?;
        let ctx = config.grid_context();
        tracing::info!(
            grid = %ctx.dims,
            tile_width = ctx.tile_width,
            tile_height = ctx.tile_height,
            backend = ops.name(),
            memory_bytes = fields.memory_bytes(),
            "scheduler ready"
        );
        Ok(Self {
            fields,
            ops,
            ctx,
            params,
            cadence: config.export_cadence(),
            frame: FrameId(0),
            last_metrics: FrameMetrics::default(),
        })
    }

    /// The next frame to execute.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Current fields.
    pub fn fields(&self) -> &GridFieldSet {
        &self.fields
    }

    /// Mutable access to the fields between frames, for seeding initial
    /// conditions.
    pub fn fields_mut(&mut self) -> &mut GridFieldSet {
        &mut self.fields
    }

    /// Operator context.
    pub fn context(&self) -> &GridContext {
        &self.ctx
    }

    /// Simulation parameters.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// The injected operator set.
    pub fn operators(&self) -> &dyn FluidOperators {
        self.ops.as_ref()
    }

    /// Export cadence in effect.
    pub fn cadence(&self) -> ExportCadence {
        self.cadence
    }

    /// Metrics of the most recent completed frame.
    pub fn last_metrics(&self) -> &FrameMetrics {
        &self.last_metrics
    }

    /// Zero every field. The frame counter keeps running.
    pub fn reset(&mut self) -> Result<(), ArenaError> {
        self.fields.reset()?;
        tracing::info!(frame = %self.frame, "fields reset");
        Ok(())
    }

    /// Execute one frame.
    ///
    /// Either every stage completes and the frame counter advances, or
    /// an error is returned. A failed frame leaves the fields in an
    /// unspecified intermediate state; the run must not continue.
    pub fn step(
        &mut self,
        forcing: &mut dyn ForcingSource,
        sink: &mut dyn SnapshotSink,
    ) -> Result<&FrameMetrics, StepError> {
        let frame = self.frame;
        let frame_start = Instant::now();
        let generation_before = self.fields.generation();
        let mut metrics = FrameMetrics {
            frame,
            ..FrameMetrics::default()
        };

        for stage in Stage::ALL {
            let stage_start = Instant::now();
            match stage {
                Stage::Boundary => self.enforce_boundaries(Stage::Boundary, true)?,
                Stage::Advect => self.advect()?,
                Stage::Force => metrics.forcing_actions = self.apply_forcing(forcing)?,
                Stage::Diffuse => self.diffuse()?,
                Stage::Project => self.project()?,
                Stage::Finalize => metrics.exported = self.finalize(sink)?,
            }
            let us = stage_start.elapsed().as_micros() as u64;
            metrics.record(stage, us);
            tracing::trace!(frame = frame.0, stage = stage.name(), us, "stage complete");
        }

        metrics.commits = self.fields.generation() - generation_before;
        metrics.total_us = frame_start.elapsed().as_micros() as u64;
        tracing::debug!(
            frame = frame.0,
            total_us = metrics.total_us,
            forcing = metrics.forcing_actions,
            exported = metrics.exported,
            "frame complete"
        );
        self.frame = frame.next();
        self.last_metrics = metrics;
        Ok(&self.last_metrics)
    }

    // ── Stages ──────────────────────────────────────────────────

    fn enforce_boundaries(&mut self, stage: Stage, include_ink: bool) -> Result<(), StepError> {
        let mut targets = vec![
            (Field::VelocityX, VELOCITY_SCALE),
            (Field::VelocityY, VELOCITY_SCALE),
        ];
        if include_ink {
            targets.extend(INK_FIELDS.map(|f| (f, INK_SCALE)));
        }
        for (field, scale) in targets {
            self.ops
                .boundary(&self.ctx, self.fields.current_mut(field), scale)
                .map_err(op_failed(stage, "boundary"))?;
        }
        Ok(())
    }

    fn advect(&mut self) -> Result<(), StepError> {
        let stage = Stage::Advect;
        let Self {
            fields,
            ops,
            ctx,
            params,
            ..
        } = self;
        let (dt, rdx) = (params.dt, params.rdx());

        // Both velocity components trace through the same old velocity.
        let mut u_new = fields.take_scratch().map_err(buffer_failed(stage))?;
        let mut v_new = fields.take_scratch().map_err(buffer_failed(stage))?;
        let vel = velocity(fields);
        ops.advect(ctx, vel.u, vel, dt, rdx, &mut u_new)
            .map_err(op_failed(stage, "advect"))?;
        ops.advect(ctx, vel.v, vel, dt, rdx, &mut v_new)
            .map_err(op_failed(stage, "advect"))?;
        fields
            .commit(Field::VelocityX, u_new)
            .map_err(buffer_failed(stage))?;
        fields
            .commit(Field::VelocityY, v_new)
            .map_err(buffer_failed(stage))?;

        for field in [Field::Pressure, Field::InkRed, Field::InkGreen, Field::InkBlue] {
            let mut out = fields.take_scratch().map_err(buffer_failed(stage))?;
            ops.advect(ctx, fields.current(field), velocity(fields), dt, rdx, &mut out)
                .map_err(op_failed(stage, "advect"))?;
            fields.commit(field, out).map_err(buffer_failed(stage))?;
        }
        Ok(())
    }

    fn apply_forcing(&mut self, forcing: &mut dyn ForcingSource) -> Result<usize, StepError> {
        let stage = Stage::Force;
        let batch = forcing.forcing_for_frame(self.frame);
        for action in &batch {
            let (u, v, ink) = self
                .fields
                .current_mut3(Field::VelocityX, Field::VelocityY, action.channel.field())
                .map_err(buffer_failed(stage))?;
            self.ops
                .add_ink(&self.ctx, u, v, ink, action)
                .map_err(op_failed(stage, "add_ink"))?;
        }
        if !batch.is_empty() {
            tracing::trace!(
                frame = self.frame.0,
                source = forcing.name(),
                actions = batch.len(),
                "forcing applied"
            );
        }
        Ok(batch.len())
    }

    fn diffuse(&mut self) -> Result<(), StepError> {
        let stage = Stage::Diffuse;
        let Self {
            fields,
            ops,
            ctx,
            params,
            ..
        } = self;
        let (alpha, rbeta) = (params.alpha_diffusion(), params.rbeta_diffusion());

        for field in [Field::VelocityX, Field::VelocityY] {
            // First sweep reads x = b = the pre-diffusion value, which is
            // then held out of the pool as the fixed right-hand side.
            let mut out = fields.take_scratch().map_err(buffer_failed(stage))?;
            let current = fields.current(field);
            ops.jacobi(ctx, current, current, alpha, rbeta, &mut out)
                .map_err(op_failed(stage, "jacobi"))?;
            let rhs = fields.exchange(field, out).map_err(buffer_failed(stage))?;

            for _ in 1..params.poisson_steps {
                let mut out = fields.take_scratch().map_err(buffer_failed(stage))?;
                ops.jacobi(ctx, fields.current(field), &rhs, alpha, rbeta, &mut out)
                    .map_err(op_failed(stage, "jacobi"))?;
                fields.commit(field, out).map_err(buffer_failed(stage))?;
            }
            fields.release(rhs).map_err(buffer_failed(stage))?;
        }
        Ok(())
    }

    fn project(&mut self) -> Result<(), StepError> {
        let stage = Stage::Project;
        {
            let Self {
                fields,
                ops,
                ctx,
                params,
                ..
            } = &mut *self;
            let halfrdx = params.halfrdx();

            let mut div = fields.take_scratch().map_err(buffer_failed(stage))?;
            ops.divergence(ctx, velocity(fields), halfrdx, &mut div)
                .map_err(op_failed(stage, "divergence"))?;

            let (alpha, rbeta) = (params.alpha_pressure(), params.rbeta_pressure());
            for _ in 0..params.poisson_steps {
                ops.boundary(ctx, fields.current_mut(Field::Pressure), PRESSURE_SCALE)
                    .map_err(op_failed(stage, "boundary"))?;
                let mut out = fields.take_scratch().map_err(buffer_failed(stage))?;
                ops.jacobi(ctx, fields.current(Field::Pressure), &div, alpha, rbeta, &mut out)
                    .map_err(op_failed(stage, "jacobi"))?;
                fields
                    .commit(Field::Pressure, out)
                    .map_err(buffer_failed(stage))?;
            }
            fields.release(div).map_err(buffer_failed(stage))?;
        }

        self.enforce_boundaries(stage, false)?;

        let Self {
            fields,
            ops,
            ctx,
            params,
            ..
        } = self;
        let mut u_new = fields.take_scratch().map_err(buffer_failed(stage))?;
        let mut v_new = fields.take_scratch().map_err(buffer_failed(stage))?;
        ops.subtract_gradient(
            ctx,
            fields.current(Field::Pressure),
            velocity(fields),
            params.halfrdx(),
            &mut u_new,
            &mut v_new,
        )
        .map_err(op_failed(stage, "subtract_gradient"))?;
        fields
            .commit(Field::VelocityX, u_new)
            .map_err(buffer_failed(stage))?;
        fields
            .commit(Field::VelocityY, v_new)
            .map_err(buffer_failed(stage))?;

        if params.check_finite {
            for field in [Field::VelocityX, Field::VelocityY] {
                if let Some(cell) = fields.current(field).iter().position(|v| !v.is_finite()) {
                    return Err(StepError::NonFinite { field, cell });
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self, sink: &mut dyn SnapshotSink) -> Result<bool, StepError> {
        if !self.cadence.is_due(self.frame) {
            return Ok(false);
        }
        self.ops
            .synchronize()
            .map_err(op_failed(Stage::Finalize, "synchronize"))?;
        let view = FrameView::new(
            self.fields.snapshot(self.frame),
            self.ops.as_ref(),
            &self.ctx,
        );
        sink.consume(&view)?;
        tracing::debug!(frame = self.frame.0, sink = sink.name(), "frame exported");
        Ok(true)
    }
}

impl std::fmt::Debug for TimeStepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStepScheduler")
            .field("frame", &self.frame)
            .field("ops", &self.ops.name())
            .field("ctx", &self.ctx)
            .field("cadence", &self.cadence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkflow_core::{ForcingAction, ForcingBatch, InkChannel};
    use inkflow_ops::CpuOperators;

    use crate::sink::NullSink;

    struct Quiet;

    impl ForcingSource for Quiet {
        fn name(&self) -> &str {
            "quiet"
        }

        fn forcing_for_frame(&mut self, _frame: FrameId) -> ForcingBatch {
            ForcingBatch::new()
        }
    }

    struct CenterDrop;

    impl ForcingSource for CenterDrop {
        fn name(&self) -> &str {
            "center_drop"
        }

        fn forcing_for_frame(&mut self, frame: FrameId) -> ForcingBatch {
            let mut batch = ForcingBatch::new();
            if frame == FrameId(0) {
                batch.push(ForcingAction {
                    channel: InkChannel::Green,
                    x: 8,
                    y: 8,
                    u: 0.0,
                    v: 0.0,
                    amount: 40.0,
                });
            }
            batch
        }
    }

    fn scheduler(width: usize, height: usize) -> TimeStepScheduler {
        TimeStepScheduler::new(
            &SimConfig::new(width, height),
            SimParams::default(),
            Box::new(CpuOperators::new()),
        )
        .unwrap()
    }

    #[test]
    fn quiescent_fields_stay_zero() {
        let mut s = scheduler(16, 16);
        for _ in 0..3 {
            s.step(&mut Quiet, &mut NullSink).unwrap();
        }
        assert_eq!(s.frame(), FrameId(3));
        for field in Field::ALL {
            assert!(s.fields().current(field).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn commits_per_frame_are_fixed() {
        let mut s = scheduler(16, 16);
        let steps = u64::from(s.params().poisson_steps);
        // advect 6 + diffuse 2·steps + pressure steps + gradient 2
        let expected = 6 + 2 * steps + steps + 2;
        let m = s.step(&mut Quiet, &mut NullSink).unwrap();
        assert_eq!(m.commits, expected);
        let m = s.step(&mut CenterDrop, &mut NullSink).unwrap();
        assert_eq!(m.commits, expected);
    }

    #[test]
    fn forcing_lands_in_selected_channel() {
        let mut s = scheduler(16, 16);
        let m = s.step(&mut CenterDrop, &mut NullSink).unwrap();
        assert_eq!(m.forcing_actions, 1);
        let idx = s.context().dims.index(8, 8);
        assert!(s.fields().current(Field::InkGreen)[idx] > 0.0);
        assert!(s.fields().current(Field::InkRed).iter().all(|&v| v == 0.0));
        assert!(s.fields().current(Field::InkBlue).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn scratch_pool_is_whole_after_each_frame() {
        let mut s = scheduler(8, 8);
        let pool = s.fields().config().scratch_slots;
        for _ in 0..2 {
            s.step(&mut CenterDrop, &mut NullSink).unwrap();
            assert_eq!(s.fields().scratch_available(), pool);
        }
    }

    #[test]
    fn reset_clears_fields_but_not_frame() {
        let mut s = scheduler(16, 16);
        s.step(&mut CenterDrop, &mut NullSink).unwrap();
        s.reset().unwrap();
        assert_eq!(s.frame(), FrameId(1));
        assert!(s.fields().current(Field::InkGreen).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn non_finite_velocity_is_reported() {
        let params = SimParams {
            check_finite: true,
            ..SimParams::default()
        };
        let mut s = TimeStepScheduler::new(
            &SimConfig::new(8, 8),
            params,
            Box::new(CpuOperators::new()),
        )
        .unwrap();
        let idx = s.context().dims.index(4, 4);
        s.fields_mut().current_mut(Field::VelocityX)[idx] = f32::NAN;
        match s.step(&mut Quiet, &mut NullSink) {
            Err(StepError::NonFinite { .. }) => {}
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }

    #[test]
    fn invalid_params_fail_construction() {
        let params = SimParams {
            poisson_steps: 0,
            ..SimParams::default()
        };
        let err = TimeStepScheduler::new(
            &SimConfig::new(8, 8),
            params,
            Box::new(CpuOperators::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Params(_)));
    }
}
