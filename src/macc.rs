//! Multiply-accumulate engine.
//!
//! This module contains the tap-delay line and the multiply-accumulate (MACC)
//! engine shared by the halfband and FIR stages. The engine performs one
//! entry of its schedule per clock cycle, so that the tap being processed can
//! be observed while a convolution is in flight.

use crate::fixed::{self, RangeViolation};

/// Entry of a MACC schedule.
///
/// Tap `k` multiplies the sample that was pushed `k` samples ago.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Mac {
    /// Multiply a single tap.
    Single(usize),
    /// Add the samples of two taps with equal coefficients and multiply the
    /// sum by the coefficient of the first tap.
    Folded(usize, usize),
}

impl Mac {
    /// First tap processed by this entry.
    pub fn tap(&self) -> usize {
        match *self {
            Mac::Single(k) | Mac::Folded(k, _) => k,
        }
    }
}

/// Schedule that processes every tap, one per cycle.
pub fn full_schedule(taps: usize) -> Vec<Mac> {
    (0..taps).map(Mac::Single).collect()
}

/// Tap-delay line with `N` taps.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DelayLine<const N: usize> {
    samples: [i32; N],
    // index of the newest sample
    head: usize,
}

impl<const N: usize> DelayLine<N> {
    /// Creates a delay line filled with zeros.
    pub fn new() -> DelayLine<N> {
        DelayLine {
            samples: [0; N],
            head: 0,
        }
    }

    /// Pushes a new sample, dropping the oldest one.
    pub fn push(&mut self, sample: i32) {
        self.head = (self.head + 1) % N;
        self.samples[self.head] = sample;
    }

    /// Gives the sample pushed `k` samples ago.
    pub fn tap(&self, k: usize) -> i32 {
        debug_assert!(k < N);
        self.samples[(self.head + N - k) % N]
    }

    /// Fills the delay line with zeros.
    pub fn clear(&mut self) {
        *self = DelayLine::new();
    }
}

impl<const N: usize> Default for DelayLine<N> {
    fn default() -> DelayLine<N> {
        DelayLine::new()
    }
}

/// MACC engine with `N` taps and decimation.
///
/// Every `decimation` pushed samples, the engine runs its schedule over the
/// delay line, one entry per cycle. The accumulator is shifted right by
/// `shift` bits and saturated to `output_bits` bits.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Macc<const N: usize> {
    delay: DelayLine<N>,
    schedule: Vec<Mac>,
    cursor: Option<usize>,
    acc: i64,
    phase: usize,
    decimation: usize,
    shift: u32,
    output_bits: u32,
    output: Option<i32>,
}

impl<const N: usize> Macc<N> {
    /// Creates a new engine.
    pub fn new(decimation: usize, shift: u32, output_bits: u32, schedule: Vec<Mac>) -> Macc<N> {
        assert!(decimation > 0);
        assert!(schedule.iter().all(|mac| match *mac {
            Mac::Single(k) => k < N,
            Mac::Folded(a, b) => a < N && b < N,
        }));
        Macc {
            delay: DelayLine::new(),
            schedule,
            cursor: None,
            acc: 0,
            phase: 0,
            decimation,
            shift,
            output_bits,
            output: None,
        }
    }

    /// Replaces the schedule.
    ///
    /// Must not be called while a convolution is in flight.
    pub fn set_schedule(&mut self, schedule: Vec<Mac>) {
        debug_assert!(self.cursor.is_none());
        self.schedule = schedule;
    }

    /// Gives the current schedule.
    pub fn schedule(&self) -> &[Mac] {
        &self.schedule
    }

    /// Returns `true` if a convolution is in flight.
    pub fn is_computing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns `true` if a sample can be pushed in this cycle.
    ///
    /// Samples cannot be pushed while a convolution is in flight, since that
    /// would shift the delay line under it. The sample that completes a
    /// decimation window can only be pushed if the output register is free.
    pub fn can_accept(&self) -> bool {
        !self.is_computing() && (self.phase + 1 < self.decimation || self.output.is_none())
    }

    /// Pushes a sample into the delay line.
    ///
    /// If the sample completes a decimation window, a convolution is started.
    /// Returns `true` in that case.
    pub fn push(&mut self, sample: i32) -> bool {
        debug_assert!(self.can_accept());
        self.delay.push(sample);
        self.phase += 1;
        if self.phase < self.decimation {
            return false;
        }
        self.phase = 0;
        self.acc = 0;
        if self.schedule.is_empty() {
            self.output = Some(0);
        } else {
            self.cursor = Some(0);
        }
        true
    }

    /// Runs one schedule entry.
    ///
    /// `coefficients` are the coefficients of the taps. When the last entry
    /// is run, the result is placed in the output register and any range
    /// violation found when narrowing it is returned.
    pub fn step(&mut self, coefficients: &[i32; N]) -> Option<RangeViolation> {
        let cursor = self.cursor?;
        self.acc += match self.schedule[cursor] {
            Mac::Single(k) => i64::from(coefficients[k]) * i64::from(self.delay.tap(k)),
            Mac::Folded(a, b) => {
                i64::from(coefficients[a])
                    * (i64::from(self.delay.tap(a)) + i64::from(self.delay.tap(b)))
            }
        };
        if cursor + 1 < self.schedule.len() {
            self.cursor = Some(cursor + 1);
            return None;
        }
        self.cursor = None;
        let (value, violation) = fixed::saturate(self.acc >> self.shift, self.output_bits);
        self.output = Some(value as i32);
        violation
    }

    /// Takes the sample in the output register.
    pub fn take_output(&mut self) -> Option<i32> {
        self.output.take()
    }

    /// Returns `true` if the output register holds a sample.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Tap in progress (1-based), or 0 when idle.
    pub fn progress(&self) -> u32 {
        self.cursor
            .map_or(0, |c| self.schedule[c].tap() as u32 + 1)
    }

    /// Gives the delay line.
    pub fn delay(&self) -> &DelayLine<N> {
        &self.delay
    }

    /// Clears the delay line, the accumulator, the decimation phase and the
    /// output register. The schedule is kept.
    pub fn reset(&mut self) {
        self.delay.clear();
        self.cursor = None;
        self.acc = 0;
        self.phase = 0;
        self.output = None;
    }
}
