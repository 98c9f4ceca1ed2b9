//! Control and status registers.
//!
//! This module contains the register map of the decimator, the signals of
//! the register interface, and the read channel, which returns the register
//! contents after a fixed latency of [`CSR_READ_LATENCY`] cycles.

use crate::constants::{CSR_READ_LATENCY, FIR_TAPS, HALFBAND_TAPS};
use std::ops::RangeInclusive;

/// Address of the enable register.
pub const ENABLE_ADDR: u8 = 0x00;
/// Address of the CIC stages register.
pub const CIC_STAGES_ADDR: u8 = 0x01;
/// Address of the first FIR coefficient.
pub const FIR_COEFFICIENTS_ADDR: u8 = 0x10;
/// Address of the first halfband coefficient.
pub const HALFBAND_COEFFICIENTS_ADDR: u8 = 0x50;
/// Address of the status register.
pub const STATUS_ADDR: u8 = 0x80;

/// Addresses of the FIR coefficients.
pub const FIR_COEFFICIENTS: RangeInclusive<u8> =
    FIR_COEFFICIENTS_ADDR..=FIR_COEFFICIENTS_ADDR + (FIR_TAPS as u8 - 1);
/// Addresses of the halfband coefficients.
pub const HALFBAND_COEFFICIENTS: RangeInclusive<u8> =
    HALFBAND_COEFFICIENTS_ADDR..=HALFBAND_COEFFICIENTS_ADDR + (HALFBAND_TAPS as u8 - 1);

const _: () = assert!(FIR_COEFFICIENTS_ADDR as usize + FIR_TAPS == 0x50);
const _: () = assert!(HALFBAND_COEFFICIENTS_ADDR as usize + HALFBAND_TAPS == 0x71);

/// Register of the decimator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Register {
    /// Enable flag (0 or 1).
    Enable,
    /// Number of CIC stages.
    CicStages,
    /// FIR coefficient slot.
    FirCoefficient(usize),
    /// Halfband coefficient slot.
    HalfbandCoefficient(usize),
    /// Aggregated status word (read-only).
    Status,
}

impl Register {
    /// Decodes a register address.
    ///
    /// Returns `None` for addresses that are not in the register map.
    pub fn decode(address: u8) -> Option<Register> {
        if address == ENABLE_ADDR {
            Some(Register::Enable)
        } else if address == CIC_STAGES_ADDR {
            Some(Register::CicStages)
        } else if FIR_COEFFICIENTS.contains(&address) {
            Some(Register::FirCoefficient(usize::from(
                address - FIR_COEFFICIENTS_ADDR,
            )))
        } else if HALFBAND_COEFFICIENTS.contains(&address) {
            Some(Register::HalfbandCoefficient(usize::from(
                address - HALFBAND_COEFFICIENTS_ADDR,
            )))
        } else if address == STATUS_ADDR {
            Some(Register::Status)
        } else {
            None
        }
    }

    /// Address of the register.
    pub fn address(&self) -> u8 {
        match *self {
            Register::Enable => ENABLE_ADDR,
            Register::CicStages => CIC_STAGES_ADDR,
            Register::FirCoefficient(slot) => FIR_COEFFICIENTS_ADDR + slot as u8,
            Register::HalfbandCoefficient(slot) => HALFBAND_COEFFICIENTS_ADDR + slot as u8,
            Register::Status => STATUS_ADDR,
        }
    }
}

/// Register interface inputs for one cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct CsrInputs {
    /// Register address, shared by the write and read channels.
    pub addr: u8,
    /// A write is presented in this cycle.
    pub wr_valid: bool,
    /// Write data.
    pub wr_data: u32,
    /// A read is requested.
    ///
    /// The request must be held until the read data is valid.
    pub rd_ready: bool,
}

impl CsrInputs {
    /// Inputs that present a write.
    pub fn write(addr: u8, data: u32) -> CsrInputs {
        CsrInputs {
            addr,
            wr_valid: true,
            wr_data: data,
            rd_ready: false,
        }
    }

    /// Inputs that request a read.
    pub fn read(addr: u8) -> CsrInputs {
        CsrInputs {
            addr,
            rd_ready: true,
            ..CsrInputs::default()
        }
    }
}

/// Read channel.
///
/// A read is started when a request is presented on a new address. The read
/// is performed once the latency has elapsed, and its data stays valid for
/// as long as the request is held on the same address.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct ReadChannel {
    request: Option<ReadRequest>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct ReadRequest {
    address: u8,
    wait: usize,
    data: Option<u32>,
}

impl ReadChannel {
    /// Creates an idle read channel.
    pub fn new() -> ReadChannel {
        ReadChannel::default()
    }

    /// Advances the channel by one cycle.
    ///
    /// Returns the address that must be read in this cycle, if any. The
    /// result of the read must then be given to [`ReadChannel::complete`].
    pub fn tick(&mut self, rd_ready: bool, address: u8) -> Option<u8> {
        if !rd_ready {
            self.request = None;
            return None;
        }
        let mut request = match self.request {
            Some(request) if request.address == address => request,
            _ => ReadRequest {
                address,
                wait: CSR_READ_LATENCY,
                data: None,
            },
        };
        let issue = if request.data.is_none() {
            request.wait = request.wait.saturating_sub(1);
            request.wait == 0
        } else {
            false
        };
        self.request = Some(request);
        issue.then_some(address)
    }

    /// Completes the read issued by the last call to [`ReadChannel::tick`].
    pub fn complete(&mut self, data: u32) {
        if let Some(request) = self.request.as_mut() {
            request.data = Some(data);
        }
    }

    /// Returns `true` if the read data is valid.
    pub fn valid(&self) -> bool {
        self.data().is_some()
    }

    /// Gives the read data, if it is valid.
    pub fn data(&self) -> Option<u32> {
        self.request.and_then(|request| request.data)
    }

    /// Cancels any read in flight.
    pub fn reset(&mut self) {
        self.request = None;
    }
}
