//! Error latch.
//!
//! Errors detected anywhere in the decimator are reported to an
//! [`ErrorLatch`], which keeps the first one until the decimator is reset.
//! Errors never stop the datapath; they are only visible through the status.

pub use decimator_json::ErrorType;

/// Error latch.
///
/// Holds the first error reported since the last reset.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct ErrorLatch {
    latched: ErrorType,
    last: ErrorType,
    reported: u64,
}

impl ErrorLatch {
    /// Creates a cleared latch.
    pub fn new() -> ErrorLatch {
        ErrorLatch::default()
    }

    /// Reports an error.
    ///
    /// The error is latched if no error has been latched since the last
    /// reset. Reporting [`ErrorType::None`] has no effect.
    pub fn report(&mut self, error: ErrorType) {
        if error == ErrorType::None {
            return;
        }
        self.reported += 1;
        self.last = error;
        if self.latched == ErrorType::None {
            tracing::warn!("error latched: {error}");
            self.latched = error;
        }
    }

    /// Reports an optional error.
    pub fn report_opt<E: Into<ErrorType>>(&mut self, error: Option<E>) {
        if let Some(error) = error {
            self.report(error.into());
        }
    }

    /// Returns `true` if an error is latched.
    pub fn is_set(&self) -> bool {
        self.latched != ErrorType::None
    }

    /// Gives the latched error type.
    pub fn error_type(&self) -> ErrorType {
        self.latched
    }

    /// Gives the most recently reported error, whether or not it was latched.
    pub fn last_reported(&self) -> ErrorType {
        self.last
    }

    /// Gives the number of errors reported since the last reset, including
    /// the ones that were not latched.
    pub fn reported(&self) -> u64 {
        self.reported
    }

    /// Clears the latch.
    pub fn clear(&mut self) {
        *self = ErrorLatch::default();
    }
}
