//! CIC decimator.
//!
//! Cascaded integrator-comb decimator with a configurable number of stages
//! (up to [`CIC_STAGES`]) and a fixed decimation of [`CIC_DECIMATION`]. The
//! integrators run at the input rate and the combs run at the decimated rate,
//! one comb stage per clock cycle.

use crate::constants::{
    CIC_DECIMATION, CIC_REGISTER_BITS, CIC_STAGES, INPUT_BITS, STAGE_BITS, WIDTH_GROWTH,
};
use crate::fixed::{self, RangeViolation};
use crate::stage::Stage;

/// CIC decimator.
///
/// All the integrator and comb registers are [`CIC_REGISTER_BITS`] wide and
/// use wrapping arithmetic. The wrap-around of the integrators cancels out in
/// the combs, so it is not an error. The comb output is scaled and narrowed
/// to [`STAGE_BITS`] bits, and that narrowing is where range violations are
/// detected.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Cic {
    integrators: [i64; CIC_STAGES],
    combs: [i64; CIC_STAGES],
    stages: usize,
    pending_stages: Option<usize>,
    phase: usize,
    comb: Option<Comb>,
    output: Option<i32>,
}

// comb cascade in flight
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Comb {
    stage: usize,
    value: i64,
}

impl Cic {
    /// Creates a CIC decimator with `stages` stages.
    ///
    /// # Panics
    ///
    /// Panics if `stages` is not supported (see [`Cic::supports_stages`]).
    pub fn new(stages: usize) -> Cic {
        assert!(Cic::supports_stages(stages));
        Cic {
            integrators: [0; CIC_STAGES],
            combs: [0; CIC_STAGES],
            stages,
            pending_stages: None,
            phase: 0,
            comb: None,
            output: None,
        }
    }

    /// Returns `true` if a CIC with `stages` stages can be realized.
    ///
    /// The registers must be wide enough to hold the bit growth of the
    /// filter, which is `stages * log2(CIC_DECIMATION)` bits.
    pub fn supports_stages(stages: usize) -> bool {
        (1..=CIC_STAGES).contains(&stages)
            && INPUT_BITS + stages as u32 * CIC_DECIMATION.ilog2() <= CIC_REGISTER_BITS
    }

    /// Number of stages currently used.
    pub fn stages(&self) -> usize {
        self.stages
    }

    /// Sets the number of stages.
    ///
    /// The change takes effect at the start of the next decimation window.
    /// Returns `false` and leaves the configuration unchanged if `stages` is
    /// not supported.
    pub fn set_stages(&mut self, stages: usize) -> bool {
        if !Cic::supports_stages(stages) {
            return false;
        }
        self.pending_stages = Some(stages);
        if self.phase == 0 && self.comb.is_none() {
            self.apply_pending_stages();
        }
        true
    }

    fn apply_pending_stages(&mut self) {
        if let Some(stages) = self.pending_stages.take() {
            if stages != self.stages {
                tracing::debug!("CIC stages changed from {} to {stages}", self.stages);
            }
            self.stages = stages;
        }
    }

    /// Right shift applied to the comb output to normalize the gain of the
    /// filter, keeping [`WIDTH_GROWTH`] bits of headroom.
    pub fn gain_shift(&self) -> u32 {
        self.stages as u32 * CIC_DECIMATION.ilog2() - WIDTH_GROWTH
    }

    /// Number of samples accepted in the current decimation window.
    pub fn phase(&self) -> usize {
        self.phase
    }
}

impl Stage for Cic {
    fn can_accept(&self) -> bool {
        self.comb.is_none() && (self.phase + 1 < CIC_DECIMATION || self.output.is_none())
    }

    fn accept(&mut self, sample: i32) {
        debug_assert!(self.can_accept());
        if self.phase == 0 {
            self.apply_pending_stages();
        }
        // All the integrators run, including those of unused stages, so that
        // changing the number of stages does not need to clear them.
        let mut x = i64::from(sample);
        for integrator in self.integrators.iter_mut() {
            *integrator = fixed::wrap(*integrator + x, CIC_REGISTER_BITS);
            x = *integrator;
        }
        self.phase += 1;
        if self.phase == CIC_DECIMATION {
            self.phase = 0;
            self.comb = Some(Comb {
                stage: 0,
                value: self.integrators[self.stages - 1],
            });
        }
    }

    fn step(&mut self) -> Option<RangeViolation> {
        let comb = self.comb?;
        let x = comb.value;
        let y = fixed::wrap(x - self.combs[comb.stage], CIC_REGISTER_BITS);
        self.combs[comb.stage] = x;
        let stage = comb.stage + 1;
        if stage < self.stages {
            self.comb = Some(Comb { stage, value: y });
            return None;
        }
        self.comb = None;
        // The gain shift cancels the R^N gain, so with 16-bit inputs this
        // never saturates. Narrowing is kept so that the output width holds.
        let (value, violation) = fixed::saturate(y >> self.gain_shift(), STAGE_BITS);
        self.output = Some(value as i32);
        if self.pending_stages.is_some() && self.phase == 0 {
            self.apply_pending_stages();
        }
        violation
    }

    fn take_output(&mut self) -> Option<i32> {
        self.output.take()
    }

    fn has_output(&self) -> bool {
        self.output.is_some()
    }

    fn is_computing(&self) -> bool {
        self.comb.is_some()
    }

    fn progress(&self) -> u32 {
        self.comb.map_or(0, |c| c.stage as u32 + 1)
    }

    fn reset(&mut self) {
        let stages = self.pending_stages.unwrap_or(self.stages);
        *self = Cic::new(stages);
    }
}
