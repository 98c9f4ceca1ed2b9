//! decimator-json contains the JSON schemas used by adc-decimator for
//! configuration files and run summaries.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// Error type code.
///
/// This enum lists the error codes that the decimator can latch in its status.
/// The numeric value of each variant is the code that appears in the
/// `error_type` field of the status word.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ErrorType {
    /// No error.
    #[default]
    None = 0,
    /// A stage result exceeded its positive range.
    Overflow = 1,
    /// A stage result exceeded its negative range.
    Underflow = 2,
    /// A configuration write was outside the parameter domain.
    InvalidConfig = 3,
    /// A register access targeted an undefined or read-only address.
    InvalidAddress = 4,
}

impl ErrorType {
    /// Returns the numeric code of the error type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Converts a numeric code into an error type.
    ///
    /// Returns `None` if the code does not correspond to any error type.
    pub fn from_code(code: u8) -> Option<ErrorType> {
        Some(match code {
            0 => ErrorType::None,
            1 => ErrorType::Overflow,
            2 => ErrorType::Underflow,
            3 => ErrorType::InvalidConfig,
            4 => ErrorType::InvalidAddress,
            _ => return None,
        })
    }
}

macro_rules! impl_str_conv {
    ($ty:ty, $($s:expr => $v:ident),*) => {
        impl std::str::FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, ()> {
                Ok(match s {
                    $(
                        $s => <$ty>::$v,
                    )*
                        _ => return Err(()),
                })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", match self {
                    $(
                        <$ty>::$v => $s,
                    )*
                })
            }
        }
    }
}

impl_str_conv!(ErrorType,
               "none" => None,
               "overflow" => Overflow,
               "underflow" => Underflow,
               "invalid config" => InvalidConfig,
               "invalid address" => InvalidAddress);

/// Sample file format.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum SampleFormat {
    /// Raw little-endian signed 16-bit samples.
    #[default]
    Raw,
    /// One decimal sample per line.
    Text,
}

impl_str_conv!(SampleFormat,
               "raw" => Raw,
               "text" => Text);

/// Structural parameters JSON schema.
///
/// These are fixed when the decimator is built and can be queried but not
/// modified.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameters {
    /// Maximum (and default) number of CIC stages.
    pub cic_stages: u32,
    /// Number of FIR taps.
    pub fir_taps: u32,
    /// Number of halfband taps.
    pub halfband_taps: u32,
    /// Overall decimation factor.
    pub decimation: u32,
    /// Decimation factor of the CIC stage.
    pub cic_decimation: u32,
    /// Decimation factor of the halfband stage.
    pub halfband_decimation: u32,
    /// Decimation factor of the FIR stage.
    pub fir_decimation: u32,
}

/// Status JSON schema.
///
/// This is a snapshot of the aggregated status of the decimator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Status {
    /// The pipeline can accept an input sample.
    pub ready: bool,
    /// Some stage has work in flight.
    pub busy: bool,
    /// An error is latched.
    pub error: bool,
    /// Latched error type.
    pub error_type: ErrorType,
    /// Packed status word, as read at the status register.
    pub word: u32,
    /// CIC comb stage in progress (1-based, 0 when idle).
    pub cic_stage: u32,
    /// Halfband tap in progress (1-based, 0 when idle).
    pub halfband_tap: u32,
    /// FIR tap in progress (1-based, 0 when idle).
    pub fir_tap: u32,
}

/// Register write JSON schema.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CsrWrite {
    /// Register address.
    pub address: u8,
    /// Data word.
    pub data: u32,
}

/// Configuration file JSON schema.
///
/// All the fields are optional. They are applied through the register
/// interface in the following order: enable, CIC stages, FIR coefficients,
/// halfband coefficients, and finally the raw register writes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    /// Enable flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Number of CIC stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cic_stages: Option<u32>,
    /// FIR coefficients in Q1.15 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fir_coefficients: Option<Vec<i32>>,
    /// Halfband coefficients in Q1.15 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halfband_coefficients: Option<Vec<i32>>,
    /// Raw register writes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writes: Vec<CsrWrite>,
}

/// Run summary JSON schema.
///
/// This is printed by the command line front-end after processing a file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of input samples read from the input.
    pub input_samples: u64,
    /// Number of samples accepted by the enabled pipeline.
    pub accepted_samples: u64,
    /// Number of samples discarded while the pipeline was disabled.
    pub discarded_samples: u64,
    /// Number of output samples produced.
    pub output_samples: u64,
    /// Ratio between input and output samples.
    ///
    /// This is `None` if no output samples were produced.
    pub decimation_ratio: Option<f64>,
    /// Number of clock cycles simulated.
    pub cycles: u64,
    /// Final status.
    pub status: Status,
    /// Structural parameters.
    pub parameters: Parameters,
}
