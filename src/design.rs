//! Default filter design.
//!
//! This module computes the coefficients loaded into the halfband and FIR
//! stages at power-on. Both filters are equiripple lowpass filters designed
//! with the Parks-McClellan algorithm using the [pm-remez](mod@pm_remez)
//! crate, and quantized to Q1.15 with unity DC gain.

use crate::constants::{COEFFICIENT_FRAC_BITS, FIR_TAPS, HALFBAND_TAPS};
use anyhow::Result;
use pm_remez::{constant, pm_parameters, pm_remez, BandSetting};

/// Passband edge of the default halfband filter, relative to its input
/// sample rate.
///
/// The stopband starts at the mirror frequency `0.5 - HALFBAND_PASSBAND`.
pub const HALFBAND_PASSBAND: f64 = 0.22;

/// Passband edge of the default FIR filter, relative to its input sample
/// rate.
pub const FIR_PASSBAND: f64 = 0.15;

/// Stopband edge of the default FIR filter, relative to its input sample
/// rate.
pub const FIR_STOPBAND: f64 = 0.25;

/// Default halfband coefficients.
///
/// All the even-indexed taps except the center tap are exactly zero.
pub fn halfband_coefficients() -> Result<[i32; HALFBAND_TAPS]> {
    let center = HALFBAND_TAPS / 2;
    // With symmetric bands around a quarter of the sample rate, the
    // equiripple design is a halfband filter up to numerical error.
    let taps: Vec<f64> = pm_lowpass(HALFBAND_TAPS, HALFBAND_PASSBAND, 0.5 - HALFBAND_PASSBAND)?
        .into_iter()
        .enumerate()
        .map(|(n, h)| {
            if n != center && n.abs_diff(center) % 2 == 0 {
                0.0
            } else {
                h
            }
        })
        .collect();
    let mut coefficients = quantize(&taps);
    // put the rounding residual on the center tap to get exact unity DC gain
    let residual = (1 << COEFFICIENT_FRAC_BITS) - coefficients.iter().sum::<i32>();
    coefficients[center] += residual;
    Ok(to_array(coefficients))
}

/// Default FIR coefficients.
pub fn fir_coefficients() -> Result<[i32; FIR_TAPS]> {
    let taps = pm_lowpass(FIR_TAPS, FIR_PASSBAND, FIR_STOPBAND)?;
    Ok(to_array(quantize(&taps)))
}

/// Equiripple lowpass filter with `num_taps` taps and band edges relative to
/// the sample rate.
fn pm_lowpass(num_taps: usize, passband_end: f64, stopband_start: f64) -> Result<Vec<f64>> {
    let bands = [
        BandSetting::new(0.0, passband_end, constant(1.0))?,
        BandSetting::new(stopband_start, 0.5, constant(0.0))?,
    ];
    let parameters = pm_parameters(num_taps, &bands)?;
    let design = pm_remez(&parameters)?;
    tracing::debug!(
        "designed {num_taps}-tap lowpass with weighted error {:.3e}",
        design.weighted_error
    );
    let h = design.impulse_response;
    // mirror the first half, so that the taps are exactly symmetric
    Ok((0..num_taps).map(|n| h[n.min(num_taps - 1 - n)]).collect())
}

/// Quantizes taps to Q1.15 so that they sum to approximately one.
fn quantize(taps: &[f64]) -> Vec<i32> {
    let sum = taps.iter().sum::<f64>();
    let scale = f64::from(1u32 << COEFFICIENT_FRAC_BITS) / sum;
    taps.iter().map(|&t| (t * scale).round() as i32).collect()
}

fn to_array<const N: usize>(coefficients: Vec<i32>) -> [i32; N] {
    let mut out = [0; N];
    out.copy_from_slice(&coefficients);
    out
}
