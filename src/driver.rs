//! Cycle-level driver.
//!
//! This module contains [`Driver`], which drives the pins of a [`Decimator`]
//! the way a bus master and a sample source would: it writes and reads
//! registers through the register interface, waits for the handshake signals,
//! pushes input samples and collects the output samples.

use crate::constants::{FIR_TAPS, HALFBAND_TAPS};
use crate::csr::{
    CsrInputs, CIC_STAGES_ADDR, ENABLE_ADDR, FIR_COEFFICIENTS_ADDR, HALFBAND_COEFFICIENTS_ADDR,
    STATUS_ADDR,
};
use crate::pipeline::{Decimator, Inputs, Outputs};
use anyhow::Result;
use decimator_json::{Config, RunSummary};

/// Decimator driver.
#[derive(Debug, Clone)]
pub struct Driver {
    decimator: Decimator,
    enable: bool,
    timeout: u64,
    samples: Vec<i16>,
    input_samples: u64,
}

impl Driver {
    /// Default number of cycles to wait for a handshake before giving up.
    pub const DEFAULT_TIMEOUT: u64 = 1000;

    /// Creates a driver for a decimator.
    ///
    /// The decimator is reset.
    pub fn new(mut decimator: Decimator) -> Driver {
        decimator.reset();
        Driver {
            decimator,
            enable: false,
            timeout: Self::DEFAULT_TIMEOUT,
            samples: Vec::new(),
            input_samples: 0,
        }
    }

    /// Gives the decimator.
    pub fn decimator(&self) -> &Decimator {
        &self.decimator
    }

    /// Gives the registered outputs of the decimator.
    pub fn outputs(&self) -> &Outputs {
        self.decimator.outputs()
    }

    /// Sets the number of cycles to wait for a handshake.
    pub fn set_timeout(&mut self, cycles: u64) {
        self.timeout = cycles;
    }

    /// Drives the enable pin.
    ///
    /// The pin is sampled in the next cycle.
    pub fn set_enable(&mut self, enable: bool) {
        self.enable = enable;
    }

    /// Resets the decimator.
    ///
    /// Collected output samples are discarded. The enable pin keeps its
    /// value.
    pub fn reset(&mut self) {
        self.decimator.reset();
        self.samples.clear();
        self.input_samples = 0;
    }

    fn cycle(&mut self, valid: bool, data: i16, csr: CsrInputs) -> Outputs {
        let outputs = *self.decimator.tick(&Inputs {
            enable: self.enable,
            data,
            valid,
            csr,
        });
        if outputs.valid {
            self.samples.push(outputs.data);
        }
        outputs
    }

    /// Runs one cycle without presenting a sample or a register access.
    pub fn tick(&mut self) -> Outputs {
        self.cycle(false, 0, CsrInputs::default())
    }

    /// Runs `cycles` idle cycles.
    pub fn idle(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// Waits until the decimator is ready to accept a sample.
    ///
    /// Returns the number of cycles waited.
    pub fn wait_for_ready(&mut self) -> Result<u64> {
        let mut cycles = 0;
        while !self.outputs().ready {
            if cycles == self.timeout {
                anyhow::bail!("decimator not ready after {cycles} cycles");
            }
            self.tick();
            cycles += 1;
        }
        Ok(cycles)
    }

    /// Waits until the pipeline has finished processing all the samples that
    /// it has accepted.
    pub fn drain(&mut self) -> Result<()> {
        let mut cycles = 0;
        while self.outputs().busy {
            if cycles == self.timeout {
                anyhow::bail!("decimator still busy after {cycles} cycles");
            }
            self.tick();
            cycles += 1;
        }
        Ok(())
    }

    /// Pushes an input sample, waiting for the decimator to be ready.
    pub fn push(&mut self, sample: i16) -> Result<()> {
        self.wait_for_ready()?;
        self.cycle(true, sample, CsrInputs::default());
        self.input_samples += 1;
        Ok(())
    }

    /// Pushes all the input samples, waits for the pipeline to drain and
    /// returns the output samples produced so far.
    #[tracing::instrument(name = "Driver::process", level = "debug", skip_all,
                          fields(samples = samples.len()))]
    pub fn process(&mut self, samples: &[i16]) -> Result<Vec<i16>> {
        for &sample in samples {
            self.push(sample)?;
        }
        self.drain()?;
        let output = self.take_samples();
        tracing::debug!("{} output samples", output.len());
        Ok(output)
    }

    /// Takes the output samples collected so far.
    pub fn take_samples(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.samples)
    }

    /// Writes a register.
    ///
    /// The write itself always succeeds. Writes that the decimator rejects
    /// are reported through its error status.
    pub fn write_config(&mut self, addr: u8, data: u32) -> Result<()> {
        let mut cycles = 0;
        while !self.outputs().csr_wr_ready {
            if cycles == self.timeout {
                anyhow::bail!("register write not accepted after {cycles} cycles");
            }
            self.tick();
            cycles += 1;
        }
        self.cycle(false, 0, CsrInputs::write(addr, data));
        Ok(())
    }

    /// Reads a register.
    pub fn read_config(&mut self, addr: u8) -> Result<u32> {
        let mut cycles = 0;
        loop {
            let outputs = self.cycle(false, 0, CsrInputs::read(addr));
            if outputs.csr_rd_valid {
                // release the request
                self.tick();
                return Ok(outputs.csr_rd_data);
            }
            cycles += 1;
            if cycles == self.timeout {
                anyhow::bail!("register read of {addr:#04x} not valid after {cycles} cycles");
            }
        }
    }

    /// Reads the status register.
    pub fn read_status(&mut self) -> Result<u32> {
        self.read_config(STATUS_ADDR)
    }

    /// Applies a configuration through register writes.
    ///
    /// Coefficient lists shorter than the number of taps are extended with
    /// zeros. Fails if a coefficient list is too long, or if the decimator
    /// reports an error while the writes are done. Errors that were already
    /// latched before the call are ignored.
    #[tracing::instrument(name = "Driver::apply_config", level = "debug", skip_all)]
    pub fn apply_config(&mut self, config: &Config) -> Result<()> {
        let reported = self.decimator.errors().reported();
        if let Some(enable) = config.enable {
            self.write_config(ENABLE_ADDR, u32::from(enable))?;
        }
        if let Some(stages) = config.cic_stages {
            self.write_config(CIC_STAGES_ADDR, stages)?;
        }
        if let Some(coefficients) = &config.fir_coefficients {
            self.write_coefficients(FIR_COEFFICIENTS_ADDR, FIR_TAPS, coefficients)?;
        }
        if let Some(coefficients) = &config.halfband_coefficients {
            self.write_coefficients(HALFBAND_COEFFICIENTS_ADDR, HALFBAND_TAPS, coefficients)?;
        }
        for write in &config.writes {
            self.write_config(write.address, write.data)?;
        }
        let errors = self.decimator.errors();
        if errors.reported() != reported {
            anyhow::bail!("configuration rejected: {}", errors.last_reported());
        }
        Ok(())
    }

    fn write_coefficients(&mut self, base: u8, taps: usize, coefficients: &[i32]) -> Result<()> {
        if coefficients.len() > taps {
            anyhow::bail!(
                "coefficient list too long ({} coefficients, {taps} taps)",
                coefficients.len()
            );
        }
        for slot in 0..taps {
            let coefficient = coefficients.get(slot).map_or(0, |c| *c);
            let addr = base + u8::try_from(slot)?;
            self.write_config(addr, coefficient as u32)?;
        }
        Ok(())
    }

    /// Summarizes the run since the last reset.
    pub fn summary(&self) -> RunSummary {
        let stats = self.decimator.stats();
        RunSummary {
            input_samples: self.input_samples,
            accepted_samples: stats.accepted_samples,
            discarded_samples: stats.discarded_samples,
            output_samples: stats.output_samples,
            decimation_ratio: (stats.output_samples != 0)
                .then(|| stats.accepted_samples as f64 / stats.output_samples as f64),
            cycles: stats.cycles,
            status: self.decimator.status().into(),
            parameters: self.decimator.parameters(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::DECIMATION_FACTOR;
    use crate::error::ErrorType;
    use crate::status::{word_error_type, STATUS_ERROR};
    use std::f64::consts::PI;

    // 100 MHz sample clock
    const SAMPLE_RATE: f64 = 1e8;

    fn sine(samples: usize, frequency: f64, amplitude: f64) -> Vec<i16> {
        (0..samples)
            .map(|n| (amplitude * (2.0 * PI * frequency * n as f64 / SAMPLE_RATE).sin()) as i16)
            .collect()
    }

    fn enabled_driver() -> Driver {
        let mut driver = Driver::new(Decimator::new().unwrap());
        driver.set_enable(true);
        driver.tick();
        driver
    }

    #[test]
    fn basic_data_flow() {
        let mut driver = enabled_driver();
        let input = sine(1000, 1000.0, 1000.0);
        let output = driver.process(&input).unwrap();
        assert!(!output.is_empty());
        assert!(output.len() <= input.len() / DECIMATION_FACTOR);
        assert_eq!(output.len(), 15);
        assert!(!driver.outputs().error);
        let summary = driver.summary();
        assert_eq!(summary.input_samples, 1000);
        assert_eq!(summary.accepted_samples, 1000);
        assert_eq!(summary.output_samples, 15);
    }

    #[test]
    fn configuration_round_trip() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        let writes = [
            (ENABLE_ADDR, 0x01),
            (CIC_STAGES_ADDR, 5),
            (FIR_COEFFICIENTS_ADDR, 0x1234_5678),
            (HALFBAND_COEFFICIENTS_ADDR, 0x8765_4321),
            (FIR_COEFFICIENTS_ADDR + 63, 0xffff_fffe),
            (HALFBAND_COEFFICIENTS_ADDR + 32, 7),
        ];
        for (addr, data) in writes {
            driver.write_config(addr, data).unwrap();
        }
        for (addr, data) in writes {
            assert_eq!(driver.read_config(addr).unwrap(), data);
        }
        assert!(!driver.outputs().error);
    }

    #[test]
    fn invalid_address_is_detected() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        driver.write_config(0xff, 0x1234_5678).unwrap();
        let mut detected = false;
        for _ in 0..10 {
            if driver.tick().error {
                detected = true;
                break;
            }
        }
        assert!(detected);
        assert_eq!(driver.outputs().error_type, ErrorType::InvalidAddress);
        assert_eq!(driver.read_config(ENABLE_ADDR).unwrap(), 0);
        assert_eq!(driver.read_config(CIC_STAGES_ADDR).unwrap(), 5);
        let status = driver.read_status().unwrap();
        assert_ne!(status & STATUS_ERROR, 0);
        assert_eq!(word_error_type(status), Some(ErrorType::InvalidAddress));
    }

    #[test]
    fn max_amplitude() {
        let mut driver = enabled_driver();
        let input = sine(1000, 1000.0, f64::from(i16::MAX));
        let output = driver.process(&input).unwrap();
        assert_eq!(output.len(), 15);
        assert!(matches!(
            driver.outputs().error_type,
            ErrorType::None | ErrorType::Overflow | ErrorType::Underflow
        ));
    }

    #[test]
    fn full_scale_steps_are_saturated() {
        let mut driver = enabled_driver();
        let mut input = vec![i16::MAX; 48 * DECIMATION_FACTOR];
        input.extend(vec![i16::MIN; 48 * DECIMATION_FACTOR]);
        let output = driver.process(&input).unwrap();
        assert_eq!(output.len(), 96);
        assert!(matches!(
            driver.outputs().error_type,
            ErrorType::None | ErrorType::Overflow | ErrorType::Underflow
        ));
        assert!(output.iter().any(|&y| y > 30000));
        assert!(output.iter().any(|&y| y < -30000));
    }

    #[test]
    fn overflow_with_large_coefficients() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        // pass-through halfband, so that the FIR input has the sign of the
        // input
        let mut halfband = vec![0; HALFBAND_TAPS];
        halfband[HALFBAND_TAPS / 2] = 1 << 15;
        let config = Config {
            fir_coefficients: Some(vec![0x1234_5678; FIR_TAPS]),
            halfband_coefficients: Some(halfband),
            ..Config::default()
        };
        driver.apply_config(&config).unwrap();
        driver.set_enable(true);
        driver.tick();
        let output = driver.process(&[1000; 640]).unwrap();
        assert_eq!(output.len(), 10);
        assert!(driver.outputs().error);
        assert_eq!(driver.outputs().error_type, ErrorType::Overflow);
        assert_eq!(*output.last().unwrap(), i16::MAX);

        // the coefficients survive reset
        driver.reset();
        assert!(!driver.outputs().error);
        assert_eq!(
            driver.read_config(FIR_COEFFICIENTS_ADDR).unwrap(),
            0x1234_5678
        );
        let output = driver.process(&[-1000; 640]).unwrap();
        assert_eq!(output.len(), 10);
        assert_eq!(driver.outputs().error_type, ErrorType::Underflow);
        assert_eq!(*output.last().unwrap(), i16::MIN);
    }

    #[test]
    fn error_latch_holds_first_error() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        driver.write_config(CIC_STAGES_ADDR, 9).unwrap();
        driver.write_config(0x90, 0).unwrap();
        driver.idle(5);
        assert_eq!(driver.outputs().error_type, ErrorType::InvalidConfig);
        // the decimator keeps working
        driver.set_enable(true);
        driver.tick();
        let output = driver.process(&[100; 128]).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(driver.outputs().error_type, ErrorType::InvalidConfig);
        driver.reset();
        assert_eq!(driver.outputs().error_type, ErrorType::None);
        assert_eq!(driver.outputs().status, 0);
    }

    #[test]
    fn idle_gaps_in_input() {
        let mut driver = enabled_driver();
        let input = sine(640, 50_000.0, 8000.0);
        for (n, &sample) in input.iter().enumerate() {
            driver.push(sample).unwrap();
            driver.idle(n % 5);
        }
        driver.drain().unwrap();
        let gapped = driver.take_samples();
        let mut reference = enabled_driver();
        let contiguous = reference.process(&input).unwrap();
        assert_eq!(gapped.len(), 10);
        assert_eq!(gapped, contiguous);
    }

    #[test]
    fn comprehensive() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        driver.write_config(ENABLE_ADDR, 1).unwrap();
        driver.write_config(CIC_STAGES_ADDR, 4).unwrap();
        let input = sine(2000, 100_000.0, 5000.0);
        let mut busy_seen = false;
        let mut cic_seen = false;
        let mut fir_seen = false;
        let mut halfband_seen = false;
        for &sample in &input {
            driver.push(sample).unwrap();
            let outputs = driver.outputs();
            busy_seen |= outputs.busy;
            cic_seen |= outputs.cic_stage_status != 0;
            fir_seen |= outputs.fir_tap_status != 0;
            halfband_seen |= outputs.halfband_tap_status != 0;
        }
        driver.drain().unwrap();
        assert!(busy_seen && cic_seen && fir_seen && halfband_seen);
        let output = driver.take_samples();
        assert_eq!(output.len(), 2000 / DECIMATION_FACTOR);
        assert!(!driver.outputs().error);
        assert_eq!(driver.decimator().cic().stages(), 4);
        let status = driver.read_status().unwrap();
        assert_eq!(status, 0);
        let summary = driver.summary();
        assert_eq!(summary.decimation_ratio, Some(2000.0 / 31.0));
    }

    #[test]
    fn coefficient_write_during_convolution() {
        let input = sine(2000, 200_000.0, 10000.0);
        let mut driver = enabled_driver();
        let mut reference = enabled_driver();
        let mut n = 0;
        // run until the FIR is in the middle of its third convolution
        while driver.samples.len() < 2 || driver.outputs().fir_tap_status < 10 {
            driver.push(input[n]).unwrap();
            reference.push(input[n]).unwrap();
            n += 1;
        }
        let write_cycle = driver.decimator().stats().cycles;
        driver
            .write_config(FIR_COEFFICIENTS_ADDR + 40, 0x7fff)
            .unwrap();
        reference.tick();
        assert_eq!(reference.decimator().stats().cycles, write_cycle + 1);
        // the register reads back the new value right away
        assert_eq!(driver.read_config(FIR_COEFFICIENTS_ADDR + 40).unwrap(), 0x7fff);
        reference.read_config(STATUS_ADDR).unwrap();
        for &sample in &input[n..] {
            driver.push(sample).unwrap();
            reference.push(sample).unwrap();
        }
        driver.drain().unwrap();
        reference.drain().unwrap();
        let output = driver.take_samples();
        let expected = reference.take_samples();
        assert_eq!(output.len(), expected.len());
        // the convolution in flight finished with the old coefficients
        assert_eq!(output[..3], expected[..3]);
        assert_ne!(output[3..], expected[3..]);
    }

    #[test]
    fn apply_config() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        let config = Config {
            enable: Some(true),
            cic_stages: Some(3),
            fir_coefficients: Some(vec![1 << 15]),
            halfband_coefficients: None,
            writes: vec![decimator_json::CsrWrite {
                address: HALFBAND_COEFFICIENTS_ADDR,
                data: 0,
            }],
        };
        driver.apply_config(&config).unwrap();
        assert_eq!(driver.read_config(CIC_STAGES_ADDR).unwrap(), 3);
        assert_eq!(driver.read_config(FIR_COEFFICIENTS_ADDR).unwrap(), 1 << 15);
        assert_eq!(driver.read_config(FIR_COEFFICIENTS_ADDR + 1).unwrap(), 0);
        assert!(driver.decimator().is_enabled());

        let too_long = Config {
            fir_coefficients: Some(vec![0; FIR_TAPS + 1]),
            ..Config::default()
        };
        assert!(driver.apply_config(&too_long).is_err());
        let invalid = Config {
            cic_stages: Some(0),
            ..Config::default()
        };
        assert!(driver.apply_config(&invalid).is_err());
    }

    #[test]
    fn apply_config_ignores_earlier_errors() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        driver.write_config(0xff, 0).unwrap();
        assert_eq!(driver.decimator().errors().error_type(), ErrorType::InvalidAddress);
        let config = Config {
            cic_stages: Some(4),
            ..Config::default()
        };
        driver.apply_config(&config).unwrap();
        assert_eq!(driver.read_config(CIC_STAGES_ADDR).unwrap(), 4);

        // a later rejection is reported even though another error is latched
        let invalid = Config {
            enable: Some(true),
            writes: vec![decimator_json::CsrWrite {
                address: ENABLE_ADDR,
                data: 2,
            }],
            ..Config::default()
        };
        let err = driver.apply_config(&invalid).unwrap_err();
        assert!(err.to_string().contains(&ErrorType::InvalidConfig.to_string()));
        assert_eq!(driver.decimator().errors().error_type(), ErrorType::InvalidAddress);
    }

    #[test]
    fn disabled_pipeline_discards() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        let output = driver.process(&[1000; 256]).unwrap();
        assert!(output.is_empty());
        let summary = driver.summary();
        assert_eq!(summary.discarded_samples, 256);
        assert_eq!(summary.decimation_ratio, None);
    }

    #[test]
    fn ready_timeout() {
        let mut driver = Driver::new(Decimator::new().unwrap());
        driver.set_timeout(0);
        driver.set_enable(true);
        driver.tick();
        for _ in 0..16 {
            driver.push(1).unwrap();
        }
        // the comb cascade is running
        assert!(driver.push(1).is_err());
    }
}
