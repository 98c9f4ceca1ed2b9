//! Pipeline controller.
//!
//! This module contains [`Decimator`], which chains the CIC, halfband and FIR
//! stages, runs the valid/ready handshake between them, serves the register
//! interface, and aggregates the status and error state of the pipeline.
//!
//! The decimator is a cycle-level model. Each call to [`Decimator::tick`] is
//! one clock cycle: the inputs are sampled and the registered outputs are
//! updated, and can then be read with [`Decimator::outputs`].

use crate::cic::Cic;
use crate::constants::{
    CIC_DECIMATION, CIC_STAGES, DECIMATION_FACTOR, FIR_DECIMATION, FIR_TAPS,
    HALFBAND_DECIMATION, HALFBAND_TAPS,
};
use crate::csr::{CsrInputs, ReadChannel, Register};
use crate::design;
use crate::error::{ErrorLatch, ErrorType};
use crate::fir::Fir;
use crate::halfband::Halfband;
use crate::stage::{self, Stage};
use crate::status::Status;
use anyhow::Result;

/// Inputs of the decimator for one cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Inputs {
    /// Enable pin.
    pub enable: bool,
    /// Input sample.
    pub data: i16,
    /// The input sample is valid.
    pub valid: bool,
    /// Register interface inputs.
    pub csr: CsrInputs,
}

/// Registered outputs of the decimator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Outputs {
    /// The decimator accepts an input sample in the next cycle.
    pub ready: bool,
    /// An output sample was produced in this cycle.
    pub valid: bool,
    /// Output sample.
    pub data: i16,
    /// Some stage is computing or holds an untransferred sample.
    pub busy: bool,
    /// An error is latched.
    pub error: bool,
    /// Latched error type.
    pub error_type: ErrorType,
    /// Aggregated status word.
    pub status: u32,
    /// CIC comb stage in progress.
    pub cic_stage_status: u32,
    /// FIR tap in progress.
    pub fir_tap_status: u32,
    /// Halfband tap in progress.
    pub halfband_tap_status: u32,
    /// The register interface accepts writes.
    pub csr_wr_ready: bool,
    /// The read data is valid.
    pub csr_rd_valid: bool,
    /// Read data.
    pub csr_rd_data: u32,
}

impl Outputs {
    fn reset() -> Outputs {
        Outputs {
            ready: true,
            csr_wr_ready: true,
            ..Outputs::default()
        }
    }
}

/// Sample and cycle counters, cleared on reset.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Stats {
    /// Clock cycles.
    pub cycles: u64,
    /// Input samples accepted into the CIC.
    pub accepted_samples: u64,
    /// Input samples accepted while disabled, which are discarded.
    pub discarded_samples: u64,
    /// Output samples produced.
    pub output_samples: u64,
}

/// Multi-stage decimator.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Decimator {
    cic: Cic,
    halfband: Halfband,
    fir: Fir,
    errors: ErrorLatch,
    // enable register
    enable: bool,
    // CIC stages register
    cic_stages: u32,
    // enable pin or register, as sampled in the last cycle
    enabled: bool,
    read: ReadChannel,
    outputs: Outputs,
    stats: Stats,
}

impl Decimator {
    /// Creates a decimator with the default filter coefficients, in its
    /// reset state.
    ///
    /// Fails if the design of the default coefficients fails.
    pub fn new() -> Result<Decimator> {
        Ok(Decimator::with_coefficients(
            design::fir_coefficients()?,
            design::halfband_coefficients()?,
        ))
    }

    /// Creates a decimator with the given filter coefficients, in its reset
    /// state.
    pub fn with_coefficients(
        fir: [i32; FIR_TAPS],
        halfband: [i32; HALFBAND_TAPS],
    ) -> Decimator {
        Decimator {
            cic: Cic::new(CIC_STAGES),
            halfband: Halfband::new(halfband),
            fir: Fir::new(fir),
            errors: ErrorLatch::new(),
            enable: false,
            cic_stages: CIC_STAGES as u32,
            enabled: false,
            read: ReadChannel::new(),
            outputs: Outputs::reset(),
            stats: Stats::default(),
        }
    }

    /// Gives the structural parameters of the decimator.
    pub fn parameters(&self) -> decimator_json::Parameters {
        decimator_json::Parameters {
            cic_stages: CIC_STAGES as u32,
            fir_taps: FIR_TAPS as u32,
            halfband_taps: HALFBAND_TAPS as u32,
            decimation: DECIMATION_FACTOR as u32,
            cic_decimation: CIC_DECIMATION as u32,
            halfband_decimation: HALFBAND_DECIMATION as u32,
            fir_decimation: FIR_DECIMATION as u32,
        }
    }

    /// Resets the decimator.
    ///
    /// All the stage state, the error latch and the counters are cleared, and
    /// the enable and CIC stages registers return to their defaults. The
    /// filter coefficients are kept, and pending coefficient writes are
    /// committed.
    pub fn reset(&mut self) {
        tracing::debug!("resetting decimator");
        self.cic.set_stages(CIC_STAGES);
        self.cic.reset();
        self.halfband.reset();
        self.fir.reset();
        self.errors.clear();
        self.enable = false;
        self.cic_stages = CIC_STAGES as u32;
        self.enabled = false;
        self.read.reset();
        self.outputs = Outputs::reset();
        self.stats = Stats::default();
    }

    /// Runs one clock cycle.
    ///
    /// An input sample is accepted if it is valid and the registered ready
    /// output is asserted. The registered outputs are updated at the end of
    /// the cycle and are returned.
    pub fn tick(&mut self, inputs: &Inputs) -> &Outputs {
        self.stats.cycles += 1;
        let ready = self.outputs.ready;

        if inputs.csr.wr_valid {
            self.write_register(inputs.csr.addr, inputs.csr.wr_data);
        }
        if let Some(address) = self.read.tick(inputs.csr.rd_ready, inputs.csr.addr) {
            let data = self.read_register(address);
            self.read.complete(data);
        }

        // Stages are evaluated from downstream to upstream, so that a sample
        // moves at most one stage per cycle.
        let violation = self.fir.step();
        self.errors.report_opt(violation);
        let output = self.fir.take_output();
        stage::transfer(&mut self.halfband, &mut self.fir);
        let violation = self.halfband.step();
        self.errors.report_opt(violation);
        stage::transfer(&mut self.cic, &mut self.halfband);
        let violation = self.cic.step();
        self.errors.report_opt(violation);

        if inputs.valid && ready {
            if self.enabled {
                self.cic.accept(i32::from(inputs.data));
                self.stats.accepted_samples += 1;
            } else {
                self.stats.discarded_samples += 1;
            }
        }
        self.enabled = inputs.enable || self.enable;

        let status = self.status();
        let (valid, data) = match output {
            Some(sample) => {
                self.stats.output_samples += 1;
                tracing::trace!("output sample {sample}");
                // the FIR output is already saturated to 16 bits
                (true, sample as i16)
            }
            None => (false, 0),
        };
        self.outputs = Outputs {
            ready: status.ready,
            valid,
            data,
            busy: status.busy,
            error: status.error,
            error_type: status.error_type,
            status: status.word(),
            cic_stage_status: status.cic_stage,
            fir_tap_status: status.fir_tap,
            halfband_tap_status: status.halfband_tap,
            csr_wr_ready: true,
            csr_rd_valid: self.read.valid(),
            csr_rd_data: self.read.data().unwrap_or(0),
        };
        &self.outputs
    }

    /// Gives the registered outputs.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Gives the current status.
    pub fn status(&self) -> Status {
        Status {
            ready: !self.enabled || self.cic.can_accept(),
            busy: self.cic.is_busy() || self.halfband.is_busy() || self.fir.is_busy(),
            error: self.errors.is_set(),
            error_type: self.errors.error_type(),
            cic_stage: self.cic.progress(),
            halfband_tap: self.halfband.progress(),
            fir_tap: self.fir.progress(),
        }
    }

    /// Gives the sample and cycle counters.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Returns `true` if the pipeline was enabled in the last cycle.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Gives the error latch.
    pub fn errors(&self) -> &ErrorLatch {
        &self.errors
    }

    /// Gives the CIC stage.
    pub fn cic(&self) -> &Cic {
        &self.cic
    }

    /// Gives the halfband stage.
    pub fn halfband(&self) -> &Halfband {
        &self.halfband
    }

    /// Gives the FIR stage.
    pub fn fir(&self) -> &Fir {
        &self.fir
    }

    fn write_register(&mut self, address: u8, data: u32) {
        match Register::decode(address) {
            Some(Register::Enable) => match data {
                0 | 1 => {
                    self.enable = data == 1;
                    tracing::debug!("enable register set to {}", self.enable);
                }
                _ => {
                    tracing::debug!("invalid enable value {data}");
                    self.errors.report(ErrorType::InvalidConfig);
                }
            },
            Some(Register::CicStages) => {
                if usize::try_from(data).is_ok_and(|stages| self.cic.set_stages(stages)) {
                    self.cic_stages = data;
                } else {
                    tracing::debug!("invalid number of CIC stages {data}");
                    self.errors.report(ErrorType::InvalidConfig);
                }
            }
            Some(Register::FirCoefficient(slot)) => {
                self.fir.coefficients_mut().write(slot, data);
            }
            Some(Register::HalfbandCoefficient(slot)) => {
                self.halfband.coefficients_mut().write(slot, data);
            }
            // the status register is read-only
            Some(Register::Status) | None => {
                tracing::debug!("write to invalid address {address:#04x}");
                self.errors.report(ErrorType::InvalidAddress);
            }
        }
    }

    fn read_register(&mut self, address: u8) -> u32 {
        match Register::decode(address) {
            Some(Register::Enable) => u32::from(self.enable),
            Some(Register::CicStages) => self.cic_stages,
            Some(Register::FirCoefficient(slot)) => {
                self.fir.coefficients().read(slot).unwrap_or(0)
            }
            Some(Register::HalfbandCoefficient(slot)) => {
                self.halfband.coefficients().read(slot).unwrap_or(0)
            }
            Some(Register::Status) => self.status().word(),
            None => {
                tracing::debug!("read from invalid address {address:#04x}");
                self.errors.report(ErrorType::InvalidAddress);
                0
            }
        }
    }
}
