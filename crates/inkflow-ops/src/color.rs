//! Colour conversion of simulation fields into RGBA bytes.

use inkflow_core::OperatorError;
use rayon::prelude::*;

use crate::context::GridContext;

/// Gain applied to pressure magnitude before saturating to 8 bits.
pub const PRESSURE_GAIN: f32 = 50.0;

/// Diverging map: negative pressure is blue, positive is red. Magnitude
/// `|p|·50` saturates at 255 and also drives alpha, so zero pressure is
/// fully transparent.
pub fn pressure_rgba(ctx: &GridContext, p: &[f32], out: &mut [u8]) -> Result<(), OperatorError> {
    ctx.check_field("pressure_colors", p.len())?;
    ctx.check_rgba("pressure_colors", out.len())?;
    out.par_chunks_mut(4)
        .zip(p.par_iter())
        .for_each(|(px, &value)| px.copy_from_slice(&pressure_pixel(value)));
    Ok(())
}

fn pressure_pixel(value: f32) -> [u8; 4] {
    let magnitude = (value.abs() * PRESSURE_GAIN).min(255.0) as u8;
    if value < 0.0 {
        [0, 0, magnitude, magnitude]
    } else {
        [magnitude, 0, 0, magnitude]
    }
}

/// Direct RGB: each ink density is clamped to `[0, 255]` and truncated.
/// Alpha is opaque.
pub fn ink_rgba(
    ctx: &GridContext,
    red: &[f32],
    green: &[f32],
    blue: &[f32],
    out: &mut [u8],
) -> Result<(), OperatorError> {
    for channel in [red, green, blue] {
        ctx.check_field("ink_colors", channel.len())?;
    }
    ctx.check_rgba("ink_colors", out.len())?;
    out.par_chunks_mut(4).enumerate().for_each(|(i, px)| {
        px.copy_from_slice(&[
            to_byte(red[i]),
            to_byte(green[i]),
            to_byte(blue[i]),
            u8::MAX,
        ]);
    });
    Ok(())
}

fn to_byte(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
