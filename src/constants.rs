//! Decimator implementation constants.
//!
//! This module contains constants that define the structure of the decimator:
//! the number of stages and taps, the decimation factors, and the word widths
//! of the datapath.

/// Maximum number of CIC stages.
///
/// This is also the default number of stages after reset. The restriction is
/// given by the width of the CIC registers (see [`CIC_REGISTER_BITS`]).
pub const CIC_STAGES: usize = 5;

/// Decimation factor of the CIC stage.
pub const CIC_DECIMATION: usize = 16;

/// Decimation factor of the halfband stage.
pub const HALFBAND_DECIMATION: usize = 2;

/// Decimation factor of the FIR stage.
pub const FIR_DECIMATION: usize = 2;

/// Overall decimation factor of the pipeline.
pub const DECIMATION_FACTOR: usize = CIC_DECIMATION * HALFBAND_DECIMATION * FIR_DECIMATION;

/// Number of FIR filter taps.
pub const FIR_TAPS: usize = 64;

/// Number of halfband filter taps.
pub const HALFBAND_TAPS: usize = 33;

/// Width of the input samples.
pub const INPUT_BITS: u32 = 16;

/// Width of the CIC integrator and comb registers.
///
/// Must be at least `INPUT_BITS + CIC_STAGES * log2(CIC_DECIMATION)` so that
/// the wrap-around of the integrators cancels out in the combs.
pub const CIC_REGISTER_BITS: u32 = 36;

/// Datapath word width growth kept by the CIC output.
pub const WIDTH_GROWTH: u32 = 2;

/// Width of the samples between the CIC, halfband and FIR stages.
pub const STAGE_BITS: u32 = INPUT_BITS + WIDTH_GROWTH;

/// Width of the output samples.
pub const OUTPUT_BITS: u32 = 16;

/// Number of fractional bits of the filter coefficients.
///
/// Coefficients are in Q1.15 format, so a unity gain filter has coefficients
/// that add up to `1 << COEFFICIENT_FRAC_BITS`.
pub const COEFFICIENT_FRAC_BITS: u32 = 15;

/// Truncation of the multiply-accumulate (MACC) output in the halfband and FIR
/// stages.
pub const MACC_TRUNC: [u32; 2] = [
    COEFFICIENT_FRAC_BITS,
    COEFFICIENT_FRAC_BITS + WIDTH_GROWTH,
];

/// Latency of the register read channel, in clock cycles.
pub const CSR_READ_LATENCY: usize = 1;

const _: () = assert!(
    INPUT_BITS + CIC_STAGES as u32 * CIC_DECIMATION.ilog2() <= CIC_REGISTER_BITS
);
const _: () = assert!(DECIMATION_FACTOR == 64);
const _: () = assert!(HALFBAND_TAPS % 4 == 1);
