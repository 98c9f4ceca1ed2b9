//! Fixed-point helpers.
//!
//! This module contains the arithmetic used to keep datapath values within
//! the width of the register that holds them, either by wrapping (CIC
//! registers) or by saturating (stage outputs).

use decimator_json::ErrorType;

/// Range violation found when narrowing a value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RangeViolation {
    /// The value exceeded the positive range.
    Overflow,
    /// The value exceeded the negative range.
    Underflow,
}

impl From<RangeViolation> for ErrorType {
    fn from(violation: RangeViolation) -> ErrorType {
        match violation {
            RangeViolation::Overflow => ErrorType::Overflow,
            RangeViolation::Underflow => ErrorType::Underflow,
        }
    }
}

/// Largest value representable in a signed word of `bits` bits.
pub const fn max_value(bits: u32) -> i64 {
    (1 << (bits - 1)) - 1
}

/// Smallest value representable in a signed word of `bits` bits.
pub const fn min_value(bits: u32) -> i64 {
    -(1 << (bits - 1))
}

/// Wraps `value` to a two's complement word of `bits` bits.
pub fn wrap(value: i64, bits: u32) -> i64 {
    let shift = 64 - bits;
    (value << shift) >> shift
}

/// Saturates `value` to a signed word of `bits` bits.
///
/// Returns the saturated value together with the range violation, if any.
pub fn saturate(value: i64, bits: u32) -> (i64, Option<RangeViolation>) {
    if value > max_value(bits) {
        (max_value(bits), Some(RangeViolation::Overflow))
    } else if value < min_value(bits) {
        (min_value(bits), Some(RangeViolation::Underflow))
    } else {
        (value, None)
    }
}
