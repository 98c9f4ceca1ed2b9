//! FIR decimator.
//!
//! General [`FIR_TAPS`]-tap FIR filter that decimates by 2 and produces the
//! final output of the pipeline. Unlike the halfband stage, no structure is
//! assumed in the coefficients: every output sample is computed with the full
//! convolution, one tap per clock cycle.

use crate::coeffs::CoefficientBank;
use crate::constants::{FIR_DECIMATION, FIR_TAPS, MACC_TRUNC, OUTPUT_BITS};
use crate::fixed::RangeViolation;
use crate::macc::{full_schedule, Macc};
use crate::stage::Stage;

/// FIR decimator.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Fir {
    coefficients: CoefficientBank<FIR_TAPS>,
    macc: Macc<FIR_TAPS>,
}

impl Fir {
    /// Creates a FIR decimator with the given coefficients.
    pub fn new(coefficients: [i32; FIR_TAPS]) -> Fir {
        Fir {
            coefficients: CoefficientBank::new(coefficients),
            macc: Macc::new(
                FIR_DECIMATION,
                MACC_TRUNC[1],
                OUTPUT_BITS,
                full_schedule(FIR_TAPS),
            ),
        }
    }

    /// Gives access to the coefficient bank.
    pub fn coefficients(&self) -> &CoefficientBank<FIR_TAPS> {
        &self.coefficients
    }

    /// Gives mutable access to the coefficient bank.
    ///
    /// Writes are committed the next time that the stage accepts a sample.
    pub fn coefficients_mut(&mut self) -> &mut CoefficientBank<FIR_TAPS> {
        &mut self.coefficients
    }
}

impl Stage for Fir {
    fn can_accept(&self) -> bool {
        self.macc.can_accept()
    }

    fn accept(&mut self, sample: i32) {
        if self.coefficients.commit() {
            tracing::debug!("FIR coefficients committed");
        }
        self.macc.push(sample);
    }

    fn step(&mut self) -> Option<RangeViolation> {
        self.macc.step(self.coefficients.active())
    }

    fn take_output(&mut self) -> Option<i32> {
        self.macc.take_output()
    }

    fn has_output(&self) -> bool {
        self.macc.has_output()
    }

    fn is_computing(&self) -> bool {
        self.macc.is_computing()
    }

    fn progress(&self) -> u32 {
        self.macc.progress()
    }

    fn reset(&mut self) {
        self.macc.reset();
        self.coefficients.commit();
    }
}
