//! Pipeline stage interface.
//!
//! The [`Stage`] trait is the view of a filter stage that the pipeline
//! controller uses to run the valid/ready handshake between stages.

use crate::fixed::RangeViolation;

/// Filter stage.
///
/// A stage accepts at most one input sample per cycle, does some internal
/// work on each cycle, and holds at most one output sample in an output
/// register until the downstream stage takes it.
pub trait Stage {
    /// Returns `true` if the stage can accept an input sample in this cycle.
    ///
    /// This is the stage's ready signal.
    fn can_accept(&self) -> bool;

    /// Accepts an input sample.
    ///
    /// Must only be called when [`Stage::can_accept`] returns `true`.
    fn accept(&mut self, sample: i32);

    /// Advances the internal work of the stage by one cycle.
    ///
    /// Returns the range violation found if the cycle produced an output
    /// sample that had to be saturated.
    fn step(&mut self) -> Option<RangeViolation>;

    /// Takes the sample in the output register, if there is one.
    ///
    /// This is the stage's valid signal together with the transfer.
    fn take_output(&mut self) -> Option<i32>;

    /// Returns `true` if the output register holds a sample.
    fn has_output(&self) -> bool;

    /// Returns `true` if a computation is in flight.
    fn is_computing(&self) -> bool;

    /// Returns `true` if the stage has work in flight or holds an output
    /// sample that has not been transferred.
    fn is_busy(&self) -> bool {
        self.is_computing() || self.has_output()
    }

    /// Index of the step in progress (1-based), or 0 when idle.
    fn progress(&self) -> u32;

    /// Returns the stage to its initial state.
    fn reset(&mut self);
}

/// Moves the output sample of `upstream` into `downstream` if `upstream` has
/// a valid sample and `downstream` is ready.
///
/// Returns `true` if a sample was transferred.
pub fn transfer<U, D>(upstream: &mut U, downstream: &mut D) -> bool
where
    U: Stage + ?Sized,
    D: Stage + ?Sized,
{
    if !upstream.has_output() || !downstream.can_accept() {
        return false;
    }
    match upstream.take_output() {
        Some(sample) => {
            downstream.accept(sample);
            true
        }
        None => false,
    }
}
