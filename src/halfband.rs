//! Halfband decimator.
//!
//! Symmetric [`HALFBAND_TAPS`]-tap FIR filter that decimates by 2. In a
//! halfband filter all the even-indexed taps except the center tap are zero,
//! and the filter is symmetric, so most of the multiply-accumulate work can
//! be skipped. The schedule is derived from the coefficients that are
//! actually loaded: zero taps are skipped and pairs of equal taps are folded
//! into a single multiplication. Both optimizations are exact, so the output
//! is identical to that of the full convolution for any coefficients.

use crate::coeffs::CoefficientBank;
use crate::constants::{HALFBAND_DECIMATION, HALFBAND_TAPS, MACC_TRUNC, STAGE_BITS};
use crate::fixed::RangeViolation;
use crate::macc::{Mac, Macc};
use crate::stage::Stage;

/// Halfband decimator.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Halfband {
    coefficients: CoefficientBank<HALFBAND_TAPS>,
    macc: Macc<HALFBAND_TAPS>,
}

impl Halfband {
    /// Creates a halfband decimator with the given coefficients.
    pub fn new(coefficients: [i32; HALFBAND_TAPS]) -> Halfband {
        Halfband {
            macc: Macc::new(
                HALFBAND_DECIMATION,
                MACC_TRUNC[0],
                STAGE_BITS,
                schedule(&coefficients),
            ),
            coefficients: CoefficientBank::new(coefficients),
        }
    }

    /// Gives access to the coefficient bank.
    pub fn coefficients(&self) -> &CoefficientBank<HALFBAND_TAPS> {
        &self.coefficients
    }

    /// Gives mutable access to the coefficient bank.
    ///
    /// Writes are committed the next time that the stage accepts a sample.
    pub fn coefficients_mut(&mut self) -> &mut CoefficientBank<HALFBAND_TAPS> {
        &mut self.coefficients
    }

    /// Number of multiplications done per output sample.
    pub fn multiplications(&self) -> usize {
        self.macc.schedule().len()
    }

    fn commit(&mut self) {
        if self.coefficients.commit() {
            tracing::debug!("halfband coefficients committed");
            self.macc.set_schedule(schedule(self.coefficients.active()));
        }
    }
}

/// MACC schedule for halfband coefficients.
///
/// Taps are processed from the outside in, with the center tap last.
pub fn schedule(coefficients: &[i32; HALFBAND_TAPS]) -> Vec<Mac> {
    let center = HALFBAND_TAPS / 2;
    let mut schedule = Vec::with_capacity(center + 1);
    for k in 0..center {
        let mirror = HALFBAND_TAPS - 1 - k;
        if coefficients[k] == coefficients[mirror] {
            if coefficients[k] != 0 {
                schedule.push(Mac::Folded(k, mirror));
            }
        } else {
            if coefficients[k] != 0 {
                schedule.push(Mac::Single(k));
            }
            if coefficients[mirror] != 0 {
                schedule.push(Mac::Single(mirror));
            }
        }
    }
    if coefficients[center] != 0 {
        schedule.push(Mac::Single(center));
    }
    schedule
}

impl Stage for Halfband {
    fn can_accept(&self) -> bool {
        self.macc.can_accept()
    }

    fn accept(&mut self, sample: i32) {
        // no convolution is in flight, so this cannot tear one
        self.commit();
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
        // the schedule can only change once no convolution is in flight
        self.macc.reset();
        self.commit();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::design;
    use crate::macc::full_schedule;

    fn run(stage: &mut impl Stage, x: &[i32]) -> Vec<i32> {
        let mut y = Vec::new();
        for &sample in x {
            while !stage.can_accept() {
                stage.step();
                y.extend(stage.take_output());
            }
            stage.accept(sample);
        }
        while stage.is_computing() {
            stage.step();
        }
        y.extend(stage.take_output());
        y
    }

    fn full_convolution(coefficients: &[i32; HALFBAND_TAPS], x: &[i32]) -> Vec<i32> {
        let mut macc =
            Macc::<HALFBAND_TAPS>::new(2, MACC_TRUNC[0], STAGE_BITS, full_schedule(HALFBAND_TAPS));
        let mut y = Vec::new();
        for &sample in x {
            macc.push(sample);
            while macc.is_computing() {
                macc.step(coefficients);
            }
            y.extend(macc.take_output());
        }
        y
    }

    fn test_signal() -> Vec<i32> {
        (0..200).map(|n| ((n * 104729) % 200_000) - 100_000).collect()
    }

    #[test]
    fn default_schedule_skips_zeros() {
        let h = design::halfband_coefficients().unwrap();
        let schedule = schedule(&h);
        // 8 folded pairs of odd taps plus the center tap
        assert_eq!(schedule.len(), 9);
        assert_eq!(*schedule.last().unwrap(), Mac::Single(HALFBAND_TAPS / 2));
        assert!(schedule.iter().all(|mac| matches!(mac, Mac::Folded(..))
            || *mac == Mac::Single(HALFBAND_TAPS / 2)));
    }

    #[test]
    fn matches_full_convolution() {
        let x = test_signal();
        let h = design::halfband_coefficients().unwrap();
        let mut halfband = Halfband::new(h);
        assert_eq!(run(&mut halfband, &x), full_convolution(&h, &x));
    }

    #[test]
    fn matches_full_convolution_asymmetric() {
        let x = test_signal();
        let mut h = [0; HALFBAND_TAPS];
        for (k, c) in h.iter_mut().enumerate() {
            *c = (k as i32 * 37) % 11 - 5;
        }
        let mut halfband = Halfband::new(h);
        assert_eq!(run(&mut halfband, &x), full_convolution(&h, &x));
    }

    #[test]
    fn decimates_by_two() {
        let mut halfband = Halfband::new(design::halfband_coefficients().unwrap());
        let y = run(&mut halfband, &[1000; 100]);
        assert_eq!(y.len(), 50);
        assert_eq!(*y.last().unwrap(), 1000);
    }

    #[test]
    fn tap_progress() {
        let mut halfband = Halfband::new(design::halfband_coefficients().unwrap());
        halfband.accept(1);
        assert_eq!(halfband.progress(), 0);
        halfband.accept(1);
        let mut taps = Vec::new();
        while halfband.is_computing() {
            taps.push(halfband.progress());
            halfband.step();
        }
        assert_eq!(taps, vec![2, 4, 6, 8, 10, 12, 14, 16, 17]);
        assert_eq!(halfband.progress(), 0);
    }

    #[test]
    fn coefficient_write_waits_for_next_sample() {
        let h = design::halfband_coefficients().unwrap();
        let center = HALFBAND_TAPS / 2;
        let x = test_signal();
        let mut reference = Halfband::new(h);
        let mut halfband = Halfband::new(h);
        for &sample in &x[..40] {
            for stage in [&mut reference, &mut halfband] {
                stage.accept(sample);
                while stage.is_computing() {
                    stage.step();
                }
                stage.take_output();
            }
        }
        for stage in [&mut reference, &mut halfband] {
            stage.accept(x[40]);
            stage.accept(x[41]);
        }
        assert!(halfband.is_computing());
        halfband.step();
        halfband.coefficients_mut().write(center, 0);
        assert_eq!(halfband.coefficients().read(center), Some(0));
        for stage in [&mut reference, &mut halfband] {
            while stage.is_computing() {
                stage.step();
            }
        }
        // the convolution in flight completes with the old coefficients
        assert_eq!(halfband.take_output(), reference.take_output());
        assert!(halfband.coefficients().is_dirty());
        for stage in [&mut reference, &mut halfband] {
            stage.accept(x[42]);
            stage.accept(x[43]);
            while stage.is_computing() {
                stage.step();
            }
        }
        assert!(!halfband.coefficients().is_dirty());
        assert_eq!(halfband.multiplications(), 8);
        assert_ne!(halfband.take_output(), reference.take_output());
    }

    #[test]
    fn reset_during_convolution_commits_pending_write() {
        let mut halfband = Halfband::new(design::halfband_coefficients().unwrap());
        halfband.accept(1000);
        halfband.accept(1000);
        halfband.step();
        assert!(halfband.is_computing());
        halfband.coefficients_mut().write(HALFBAND_TAPS / 2, 0);
        halfband.reset();
        assert!(!halfband.is_busy());
        assert!(!halfband.coefficients().is_dirty());
        assert_eq!(halfband.coefficients().active()[HALFBAND_TAPS / 2], 0);
        assert_eq!(halfband.multiplications(), 8);
    }

    #[test]
    fn overflow_is_saturated() {
        let mut h = [0; HALFBAND_TAPS];
        h[0] = 4 << 15;
        let mut halfband = Halfband::new(h);
        halfband.accept(100_000);
        halfband.accept(100_000);
        let mut violation = None;
        while halfband.is_computing() {
            violation = violation.or(halfband.step());
        }
        assert_eq!(violation, Some(RangeViolation::Overflow));
        assert_eq!(halfband.take_output(), Some(131071));
    }
}
