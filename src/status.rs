//! Pipeline status.
//!
//! This module contains [`Status`], the snapshot of the status outputs of the
//! decimator, and the packing of the aggregated status word that is read
//! through the register interface.

use crate::error::ErrorType;

/// Bit of the status word that is set when the pipeline is busy.
pub const STATUS_BUSY: u32 = 1 << 0;
/// Bit of the status word that is set when an error is latched.
pub const STATUS_ERROR: u32 = 1 << 1;
/// Position of the error type code in the status word.
pub const STATUS_ERROR_TYPE_SHIFT: u32 = 2;
/// Mask of the error type code in the status word (after shifting).
pub const STATUS_ERROR_TYPE_MASK: u32 = 0x7;
/// Bit of the status word that is set when the pipeline cannot accept input.
pub const STATUS_STALLED: u32 = 1 << 5;

/// Status of the decimator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Status {
    /// The pipeline can accept an input sample.
    pub ready: bool,
    /// Some stage is computing or holds an untransferred output sample.
    pub busy: bool,
    /// An error is latched.
    pub error: bool,
    /// Latched error type.
    pub error_type: ErrorType,
    /// CIC comb stage in progress (1-based, 0 when idle).
    pub cic_stage: u32,
    /// Halfband tap in progress (1-based, 0 when idle).
    pub halfband_tap: u32,
    /// FIR tap in progress (1-based, 0 when idle).
    pub fir_tap: u32,
}

impl Status {
    /// Status right after reset.
    pub fn reset() -> Status {
        Status {
            ready: true,
            ..Status::default()
        }
    }

    /// Packs the aggregated status word.
    pub fn word(&self) -> u32 {
        let mut word = 0;
        if self.busy {
            word |= STATUS_BUSY;
        }
        if self.error {
            word |= STATUS_ERROR;
        }
        word |= (u32::from(self.error_type.code()) & STATUS_ERROR_TYPE_MASK)
            << STATUS_ERROR_TYPE_SHIFT;
        if !self.ready {
            word |= STATUS_STALLED;
        }
        word
    }

    /// Returns `true` if all the stages are idle.
    pub fn is_idle(&self) -> bool {
        !self.busy && self.cic_stage == 0 && self.halfband_tap == 0 && self.fir_tap == 0
    }
}

/// Decodes the error type field of a status word.
pub fn word_error_type(word: u32) -> Option<ErrorType> {
    ErrorType::from_code(((word >> STATUS_ERROR_TYPE_SHIFT) & STATUS_ERROR_TYPE_MASK) as u8)
}

impl From<Status> for decimator_json::Status {
    fn from(status: Status) -> decimator_json::Status {
        decimator_json::Status {
            ready: status.ready,
            busy: status.busy,
            error: status.error,
            error_type: status.error_type,
            word: status.word(),
            cic_stage: status.cic_stage,
            halfband_tap: status.halfband_tap,
            fir_tap: status.fir_tap,
        }
    }
}
