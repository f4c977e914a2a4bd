//! Reusable operator-set fixtures.
//!
//! - [`RecordingOperators`]: delegates to another operator set and
//!   logs every call in order, plus the Jacobi right-hand sides and the
//!   velocity left by each forcing call.
//! - [`IdentityOperators`]: analytically trivial transforms: advection
//!   and Jacobi copy their input, divergence is zero.
//! - [`FailingOperators`]: fails one named operator after N calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use inkflow_core::{ForcingAction, InkChannel, OperatorError};
use inkflow_ops::{CpuOperators, FluidOperators, GridContext, Velocity};

/// One recorded operator call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OpCall {
    Advect,
    Jacobi { alpha: f32 },
    Divergence,
    SubtractGradient,
    Boundary { scale: f32 },
    AddInk { channel: InkChannel },
    Synchronize,
    PressureColors,
    InkColors,
}

/// Shared, cloneable call log written by [`RecordingOperators`].
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<OpCall>>>,
    divergence_norms: Arc<Mutex<Vec<f64>>>,
    jacobi_rhs: Arc<Mutex<Vec<(f32, Vec<f32>)>>>,
    forced_velocity: Arc<Mutex<Vec<(Vec<f32>, Vec<f32>)>>>,
}

impl CallLog {
    fn push(&self, call: OpCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<OpCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// L2 norm of each `divergence` output, in call order.
    pub fn divergence_norms(&self) -> Vec<f64> {
        self.divergence_norms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(alpha, b)` of each `jacobi` call, in call order.
    pub fn jacobi_rhs(&self) -> Vec<(f32, Vec<f32>)> {
        self.jacobi_rhs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(u, v)` as left by each `add_ink` call, in call order.
    pub fn forced_velocity(&self) -> Vec<(Vec<f32>, Vec<f32>)> {
        self.forced_velocity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.divergence_norms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.jacobi_rhs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.forced_velocity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// L2 norm of a field.
pub fn l2_norm(field: &[f32]) -> f64 {
    field
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt()
}

// ── RecordingOperators ──────────────────────────────────────────

/// Logs each call, then delegates to the wrapped operator set.
pub struct RecordingOperators {
    inner: Box<dyn FluidOperators>,
    log: CallLog,
}

impl RecordingOperators {
    pub fn new(inner: impl FluidOperators) -> Self {
        Self {
            inner: Box::new(inner),
            log: CallLog::default(),
        }
    }

    /// Record calls made to the CPU reference kernels.
    pub fn cpu() -> Self {
        Self::new(CpuOperators::new())
    }

    /// Handle to the call log. Stays valid after `self` is boxed.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl FluidOperators for RecordingOperators {
    fn name(&self) -> &str {
        "recording"
    }

    fn advect(
        &self,
        ctx: &GridContext,
        q: &[f32],
        vel: Velocity<'_>,
        dt: f32,
        rdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::Advect);
        self.inner.advect(ctx, q, vel, dt, rdx, out)
    }

    fn jacobi(
        &self,
        ctx: &GridContext,
        x: &[f32],
        b: &[f32],
        alpha: f32,
        rbeta: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::Jacobi { alpha });
        self.log
            .jacobi_rhs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((alpha, b.to_vec()));
        self.inner.jacobi(ctx, x, b, alpha, rbeta, out)
    }

    fn divergence(
        &self,
        ctx: &GridContext,
        vel: Velocity<'_>,
        halfrdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::Divergence);
        self.inner.divergence(ctx, vel, halfrdx, out)?;
        self.log
            .divergence_norms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(l2_norm(out));
        Ok(())
    }

    fn subtract_gradient(
        &self,
        ctx: &GridContext,
        p: &[f32],
        vel: Velocity<'_>,
        halfrdx: f32,
        u_out: &mut [f32],
        v_out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::SubtractGradient);
        self.inner
            .subtract_gradient(ctx, p, vel, halfrdx, u_out, v_out)
    }

    fn boundary(&self, ctx: &GridContext, x: &mut [f32], scale: f32) -> Result<(), OperatorError> {
        self.log.push(OpCall::Boundary { scale });
        self.inner.boundary(ctx, x, scale)
    }

    fn add_ink(
        &self,
        ctx: &GridContext,
        u: &mut [f32],
        v: &mut [f32],
        ink: &mut [f32],
        action: &ForcingAction,
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::AddInk {
            channel: action.channel,
        });
        self.inner.add_ink(ctx, u, v, ink, action)?;
        self.log
            .forced_velocity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((u.to_vec(), v.to_vec()));
        Ok(())
    }

    fn synchronize(&self) -> Result<(), OperatorError> {
        self.log.push(OpCall::Synchronize);
        self.inner.synchronize()
    }

    fn pressure_colors(
        &self,
        ctx: &GridContext,
        p: &[f32],
        out: &mut [u8],
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::PressureColors);
        self.inner.pressure_colors(ctx, p, out)
    }

    fn ink_colors(
        &self,
        ctx: &GridContext,
        red: &[f32],
        green: &[f32],
        blue: &[f32],
        out: &mut [u8],
    ) -> Result<(), OperatorError> {
        self.log.push(OpCall::InkColors);
        self.inner.ink_colors(ctx, red, green, blue, out)
    }
}

// ── IdentityOperators ───────────────────────────────────────────

/// Operators whose results are known without any numerics.
///
/// `advect` and `jacobi` copy their input, `divergence` writes zeros,
/// `subtract_gradient` copies velocity, `boundary` leaves the field
/// alone, and `add_ink` adds the action at its cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityOperators;

impl FluidOperators for IdentityOperators {
    fn name(&self) -> &str {
        "identity"
    }

    fn advect(
        &self,
        ctx: &GridContext,
        q: &[f32],
        _vel: Velocity<'_>,
        _dt: f32,
        _rdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        ctx.check_field("advect", q.len())?;
        ctx.check_field("advect", out.len())?;
        out.copy_from_slice(q);
        Ok(())
    }

    fn jacobi(
        &self,
        ctx: &GridContext,
        x: &[f32],
        _b: &[f32],
        _alpha: f32,
        _rbeta: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        ctx.check_field("jacobi", x.len())?;
        ctx.check_field("jacobi", out.len())?;
        out.copy_from_slice(x);
        Ok(())
    }

    fn divergence(
        &self,
        ctx: &GridContext,
        _vel: Velocity<'_>,
        _halfrdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        ctx.check_field("divergence", out.len())?;
        out.fill(0.0);
        Ok(())
    }

    fn subtract_gradient(
        &self,
        ctx: &GridContext,
        _p: &[f32],
        vel: Velocity<'_>,
        _halfrdx: f32,
        u_out: &mut [f32],
        v_out: &mut [f32],
    ) -> Result<(), OperatorError> {
        for len in [vel.u.len(), vel.v.len(), u_out.len(), v_out.len()] {
            ctx.check_field("subtract_gradient", len)?;
        }
        u_out.copy_from_slice(vel.u);
        v_out.copy_from_slice(vel.v);
        Ok(())
    }

    fn boundary(
        &self,
        ctx: &GridContext,
        x: &mut [f32],
        _scale: f32,
    ) -> Result<(), OperatorError> {
        ctx.check_field("boundary", x.len())
    }

    fn add_ink(
        &self,
        ctx: &GridContext,
        u: &mut [f32],
        v: &mut [f32],
        ink: &mut [f32],
        action: &ForcingAction,
    ) -> Result<(), OperatorError> {
        for len in [u.len(), v.len(), ink.len()] {
            ctx.check_field("add_ink", len)?;
        }
        if let Some(i) = ctx.dims.checked_index(action.x, action.y) {
            u[i] += action.u;
            v[i] += action.v;
            ink[i] += action.amount;
        }
        Ok(())
    }
}

// ── FailingOperators ────────────────────────────────────────────

/// CPU operators, except that the operator named `target` fails once it
/// has succeeded `succeed_count` times.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Send`.
pub struct FailingOperators {
    inner: CpuOperators,
    target: &'static str,
    succeed_count: usize,
    calls: AtomicUsize,
}

impl FailingOperators {
    pub fn new(target: &'static str, succeed_count: usize) -> Self {
        Self {
            inner: CpuOperators::new(),
            target,
            succeed_count,
            calls: AtomicUsize::new(0),
        }
    }

    fn gate(&self, operator: &'static str) -> Result<(), OperatorError> {
        if operator != self.target {
            return Ok(());
        }
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(OperatorError::Backend {
                reason: format!(
                    "deliberate {operator} failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }
}

impl FluidOperators for FailingOperators {
    fn name(&self) -> &str {
        "failing"
    }

    fn advect(
        &self,
        ctx: &GridContext,
        q: &[f32],
        vel: Velocity<'_>,
        dt: f32,
        rdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.gate("advect")?;
        self.inner.advect(ctx, q, vel, dt, rdx, out)
    }

    fn jacobi(
        &self,
        ctx: &GridContext,
        x: &[f32],
        b: &[f32],
        alpha: f32,
        rbeta: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.gate("jacobi")?;
        self.inner.jacobi(ctx, x, b, alpha, rbeta, out)
    }

    fn divergence(
        &self,
        ctx: &GridContext,
        vel: Velocity<'_>,
        halfrdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.gate("divergence")?;
        self.inner.divergence(ctx, vel, halfrdx, out)
    }

    fn subtract_gradient(
        &self,
        ctx: &GridContext,
        p: &[f32],
        vel: Velocity<'_>,
        halfrdx: f32,
        u_out: &mut [f32],
        v_out: &mut [f32],
    ) -> Result<(), OperatorError> {
        self.gate("subtract_gradient")?;
        self.inner
            .subtract_gradient(ctx, p, vel, halfrdx, u_out, v_out)
    }

    fn boundary(&self, ctx: &GridContext, x: &mut [f32], scale: f32) -> Result<(), OperatorError> {
        self.gate("boundary")?;
        self.inner.boundary(ctx, x, scale)
    }

    fn add_ink(
        &self,
        ctx: &GridContext,
        u: &mut [f32],
        v: &mut [f32],
        ink: &mut [f32],
        action: &ForcingAction,
    ) -> Result<(), OperatorError> {
        self.gate("add_ink")?;
        self.inner.add_ink(ctx, u, v, ink, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkflow_core::GridDims;

    fn ctx() -> GridContext {
        GridContext::with_default_tiles(GridDims::new(4, 4))
    }

    #[test]
    fn recording_logs_in_order() {
        let ops = RecordingOperators::cpu();
        let log = ops.log();
        let mut field = vec![0.0; 16];
        ops.boundary(&ctx(), &mut field, -1.0).unwrap();
        let zeros = vec![0.0; 16];
        let mut out = vec![0.0; 16];
        ops.divergence(
            &ctx(),
            Velocity {
                u: &zeros,
                v: &zeros,
            },
            5.0,
            &mut out,
        )
        .unwrap();
        assert_eq!(
            log.calls(),
            vec![OpCall::Boundary { scale: -1.0 }, OpCall::Divergence]
        );
        assert_eq!(log.divergence_norms(), vec![0.0]);
        let b: Vec<f32> = (0..16).map(|i| i as f32).collect();
        ops.jacobi(&ctx(), &zeros, &b, 2.0, 0.5, &mut out).unwrap();
        assert_eq!(log.jacobi_rhs(), vec![(2.0, b)]);
        log.clear();
        assert!(log.calls().is_empty());
        assert!(log.jacobi_rhs().is_empty());
    }

    #[test]
    fn identity_advect_copies() {
        let q: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let zeros = vec![0.0; 16];
        let mut out = vec![0.0; 16];
        IdentityOperators
            .advect(
                &ctx(),
                &q,
                Velocity {
                    u: &zeros,
                    v: &zeros,
                },
                0.1,
                10.0,
                &mut out,
            )
            .unwrap();
        assert_eq!(out, q);
    }

    #[test]
    fn failing_gate_counts_only_target() {
        let ops = FailingOperators::new("jacobi", 1);
        let mut field = vec![0.0; 16];
        ops.boundary(&ctx(), &mut field, 1.0).unwrap();
        let x = vec![0.0; 16];
        let mut out = vec![0.0; 16];
        ops.jacobi(&ctx(), &x, &x, 1.0, 0.2, &mut out).unwrap();
        assert!(ops.jacobi(&ctx(), &x, &x, 1.0, 0.2, &mut out).is_err());
    }
}
