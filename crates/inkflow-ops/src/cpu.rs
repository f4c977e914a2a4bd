//! Host reference implementation of [`FluidOperators`].
//!
//! Stencil kernels run in parallel over bands of `tile_height` rows with
//! rayon. Each call finishes all of its writes before returning, so
//! [`FluidOperators::synchronize`] has nothing to wait for.

use inkflow_core::{ForcingAction, GridDims, OperatorError};
use rayon::prelude::*;

use crate::context::GridContext;
use crate::operators::{FluidOperators, Velocity};

/// Rayon-parallel CPU backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuOperators;

impl CpuOperators {
    /// Create the CPU backend. It uses the global rayon thread pool.
    pub fn new() -> Self {
        Self
    }
}

/// Run `row_kernel(y, row)` for every output row, in parallel bands of
/// `tile_height` rows.
fn for_each_row<F>(ctx: &GridContext, out: &mut [f32], row_kernel: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    let width = ctx.dims.width;
    let band_rows = ctx.tile_height;
    out.par_chunks_mut(band_rows * width)
        .enumerate()
        .for_each(|(band, chunk)| {
            for (r, row) in chunk.chunks_mut(width).enumerate() {
                row_kernel(band * band_rows + r, row);
            }
        });
}

fn is_border_row(dims: &GridDims, y: usize) -> bool {
    y == 0 || y + 1 == dims.height
}

/// Bilinear sample of `q` at `(px, py)`, clamped into the grid.
fn sample(q: &[f32], dims: &GridDims, px: f32, py: f32) -> f32 {
    let max_x = (dims.width - 1) as f32;
    let max_y = (dims.height - 1) as f32;
    let px = px.clamp(0.0, max_x);
    let py = py.clamp(0.0, max_y);

    let x0 = px.floor() as usize;
    let y0 = py.floor() as usize;
    let x1 = (x0 + 1).min(dims.width - 1);
    let y1 = (y0 + 1).min(dims.height - 1);
    let fx = px - x0 as f32;
    let fy = py - y0 as f32;

    let bottom = q[dims.index(x0, y0)] * (1.0 - fx) + q[dims.index(x1, y0)] * fx;
    let top = q[dims.index(x0, y1)] * (1.0 - fx) + q[dims.index(x1, y1)] * fx;
    bottom * (1.0 - fy) + top * fy
}

impl FluidOperators for CpuOperators {
    fn name(&self) -> &str {
        "cpu"
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
        for len in [q.len(), vel.u.len(), vel.v.len(), out.len()] {
            ctx.check_field("advect", len)?;
        }
        ctx.check_stencil("advect")?;
        let dims = ctx.dims;
        let scale = dt * rdx;
        for_each_row(ctx, out, |y, row| {
            let base = y * dims.width;
            if is_border_row(&dims, y) {
                row.copy_from_slice(&q[base..base + dims.width]);
                return;
            }
            row[0] = q[base];
            row[dims.width - 1] = q[base + dims.width - 1];
            for x in 1..dims.width - 1 {
                let i = base + x;
                let px = x as f32 - scale * vel.u[i];
                let py = y as f32 - scale * vel.v[i];
                row[x] = sample(q, &dims, px, py);
            }
        });
        Ok(())
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
        for len in [x.len(), b.len(), out.len()] {
            ctx.check_field("jacobi", len)?;
        }
        ctx.check_stencil("jacobi")?;
        let dims = ctx.dims;
        let w = dims.width;
        for_each_row(ctx, out, |y, row| {
            let base = y * w;
            if is_border_row(&dims, y) {
                row.copy_from_slice(&x[base..base + w]);
                return;
            }
            row[0] = x[base];
            row[w - 1] = x[base + w - 1];
            for cx in 1..w - 1 {
                let i = base + cx;
                let neighbours = x[i - 1] + x[i + 1] + x[i - w] + x[i + w];
                row[cx] = (neighbours + alpha * b[i]) * rbeta;
            }
        });
        Ok(())
    }

    fn divergence(
        &self,
        ctx: &GridContext,
        vel: Velocity<'_>,
        halfrdx: f32,
        out: &mut [f32],
    ) -> Result<(), OperatorError> {
        for len in [vel.u.len(), vel.v.len(), out.len()] {
            ctx.check_field("divergence", len)?;
        }
        ctx.check_stencil("divergence")?;
        let dims = ctx.dims;
        let w = dims.width;
        for_each_row(ctx, out, |y, row| {
            row.fill(0.0);
            if is_border_row(&dims, y) {
                return;
            }
            let base = y * w;
            for cx in 1..w - 1 {
                let i = base + cx;
                let du = vel.u[i + 1] - vel.u[i - 1];
                let dv = vel.v[i + w] - vel.v[i - w];
                row[cx] = halfrdx * (du + dv);
            }
        });
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
        for len in [p.len(), vel.u.len(), vel.v.len(), u_out.len(), v_out.len()] {
            ctx.check_field("subtract_gradient", len)?;
        }
        ctx.check_stencil("subtract_gradient")?;
        let dims = ctx.dims;
        let w = dims.width;
        let band = ctx.tile_height * w;
        u_out
            .par_chunks_mut(band)
            .zip(v_out.par_chunks_mut(band))
            .enumerate()
            .for_each(|(band_idx, (u_band, v_band))| {
                let rows = u_band.chunks_mut(w).zip(v_band.chunks_mut(w));
                for (r, (u_row, v_row)) in rows.enumerate() {
                    let y = band_idx * ctx.tile_height + r;
                    let base = y * w;
                    u_row.copy_from_slice(&vel.u[base..base + w]);
                    v_row.copy_from_slice(&vel.v[base..base + w]);
                    if is_border_row(&dims, y) {
                        continue;
                    }
                    for cx in 1..w - 1 {
                        let i = base + cx;
                        u_row[cx] -= halfrdx * (p[i + 1] - p[i - 1]);
                        v_row[cx] -= halfrdx * (p[i + w] - p[i - w]);
                    }
                }
            });
        Ok(())
    }

    fn boundary(
        &self,
        ctx: &GridContext,
        x: &mut [f32],
        scale: f32,
    ) -> Result<(), OperatorError> {
        ctx.check_field("boundary", x.len())?;
        ctx.check_stencil("boundary")?;
        let dims = ctx.dims;
        let (w, h) = (dims.width, dims.height);
        let at = |cx: usize, cy: usize| dims.index(cx, cy);

        for cy in 1..h - 1 {
            x[at(0, cy)] = scale * x[at(1, cy)];
            x[at(w - 1, cy)] = scale * x[at(w - 2, cy)];
        }
        for cx in 1..w - 1 {
            x[at(cx, 0)] = scale * x[at(cx, 1)];
            x[at(cx, h - 1)] = scale * x[at(cx, h - 2)];
        }
        x[at(0, 0)] = scale * x[at(1, 1)];
        x[at(w - 1, 0)] = scale * x[at(w - 2, 1)];
        x[at(0, h - 1)] = scale * x[at(1, h - 2)];
        x[at(w - 1, h - 1)] = scale * x[at(w - 2, h - 2)];
        Ok(())
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
