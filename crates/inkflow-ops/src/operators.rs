//! The [`FluidOperators`] trait.
//!
//! Operators are stateless transforms over fields. Stencil operators
//! (`advect`, `jacobi`, `divergence`, `subtract_gradient`) compute the
//! interior cells of their output. Output border cells copy the input
//! field's border, except `divergence`, whose border is zero; the next
//! `boundary` call owns them.

use inkflow_core::{ForcingAction, OperatorError};

use crate::color;
use crate::context::GridContext;

/// Borrowed velocity field `(u, v)`.
#[derive(Clone, Copy, Debug)]
pub struct Velocity<'a> {
    /// Horizontal component.
    pub u: &'a [f32],
    /// Vertical component.
    pub v: &'a [f32],
}

/// The operator set the time-stepping pipeline dispatches to.
///
/// # Contract
///
/// - Every call is blocking from the caller's point of view: once it
///   returns, later calls observe its full output (or the backend makes
///   that true by the next dependent call and by [`synchronize`]).
/// - Output buffers never alias input buffers. Callers hand in scratch
///   buffers for every `out` parameter.
/// - Buffers whose length disagrees with the context are rejected with
///   [`OperatorError::DimensionMismatch`].
/// - Stencil operators and `boundary` need a grid of at least
///   [`GridContext::MIN_STENCIL_SIDE`] cells per side and return
///   [`OperatorError::GridTooSmall`] otherwise.
///
/// # Object safety
///
/// This trait is object-safe; the scheduler stores it as
/// `Box<dyn FluidOperators>`.
///
/// # Examples
///
/// A Jacobi sweep leaves a constant field unchanged when `b` holds the
/// same constant and `rbeta = 1 / (4 + alpha)`:
///
/// ```
/// use inkflow_core::GridDims;
/// use inkflow_ops::{CpuOperators, FluidOperators, GridContext};
///
/// let ctx = GridContext::with_default_tiles(GridDims::new(8, 8));
/// let x = vec![2.0_f32; 64];
/// let mut out = vec![0.0_f32; 64];
/// let alpha = 10.0;
/// CpuOperators::new()
///     .jacobi(&ctx, &x, &x, alpha, 1.0 / (4.0 + alpha), &mut out)
///     .unwrap();
/// assert!(out.iter().all(|v| (v - 2.0).abs() < 1e-6));
/// ```
///
/// [`synchronize`]: FluidOperators::synchronize
pub trait FluidOperators: Send + 'static {
    /// Human-readable backend name for logs and errors.
    fn name(&self) -> &str;

    /// Semi-Lagrangian transport of `q` by `vel`.
    ///
    /// Each interior cell `(x, y)` traces back to
    /// `(x - dt·rdx·u, y - dt·rdx·v)`, clamps the point into the grid
    /// and bilinearly samples `q` there.
    fn advect(
        &self,
        ctx: &GridContext,
        q: &[f32],
        vel: Velocity<'_>,
        dt: f32,
        rdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError>;

    /// One Jacobi sweep: `out = (xL + xR + xB + xT + alpha·b) · rbeta`.
    fn jacobi(
        &self,
        ctx: &GridContext,
        x: &[f32],
        b: &[f32],
        alpha: f32,
        rbeta: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError>;

    /// Central-difference divergence `halfrdx·((uR - uL) + (vT - vB))`.
    fn divergence(
        &self,
        ctx: &GridContext,
        vel: Velocity<'_>,
        halfrdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError>;

    /// Remove the pressure gradient from `vel`:
    /// `u -= halfrdx·(pR - pL)`, `v -= halfrdx·(pT - pB)`.
    fn subtract_gradient(
        &self,
        ctx: &GridContext,
        p: &[f32],
        vel: Velocity<'_>,
        halfrdx: f32,
        u_out: &mut [f32],
        v_out: &mut [f32],
    ) -> Result<(), OperatorError>;

    /// Set border cells from the interior, in place.
    ///
    /// Edge cells take `scale` times their adjacent interior cell;
    /// corners take `scale` times their diagonal interior cell. Border
    /// values depend on interior values only, so the operation is
    /// idempotent.
    fn boundary(
        &self,
        ctx: &GridContext,
        x: &mut [f32],
        scale: f32,
    ) -> Result<(), OperatorError>;

    /// Add `action`'s velocity impulse and ink amount at one cell.
    ///
    /// An action outside the grid is ignored.
    fn add_ink(
        &self,
        ctx: &GridContext,
        u: &mut [f32],
        v: &mut [f32],
        ink: &mut [f32],
        action: &ForcingAction,
    ) -> Result<(), OperatorError>;

    /// Wait for every outstanding write to complete.
    ///
    /// Called before any field is read back for export or display.
    /// Backends whose calls already block return immediately.
    fn synchronize(&self) -> Result<(), OperatorError> {
        Ok(())
    }

    /// Render pressure into RGBA bytes with the diverging colour map.
    fn pressure_colors(
        &self,
        ctx: &GridContext,
        p: &[f32],
        out: &mut [u8],
    ) -> Result<(), OperatorError> {
        color::pressure_rgba(ctx, p, out)
    }

    /// Render the three ink channels into RGBA bytes.
    fn ink_colors(
        &self,
        ctx: &GridContext,
        red: &[f32],
        green: &[f32],
        blue: &[f32],
        out: &mut [u8],
    ) -> Result<(), OperatorError> {
        color::ink_rgba(ctx, red, green, blue, out)
    }
}
