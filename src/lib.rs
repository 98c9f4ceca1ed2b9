//! adc-decimator is a cycle-level model of a multi-stage decimating filter
//! for ADC sample streams. A CIC decimator, a halfband filter and a FIR
//! filter reduce the sample rate by 64. The stages are connected with a
//! valid/ready handshake, and the decimator is configured and monitored
//! through a register interface.
//!
//! The model is contained in [`pipeline::Decimator`]. The [`driver`] module
//! drives the decimator pins from software, and the [`app`] module contains a
//! command line application that decimates sample files.

#![warn(missing_docs)]

pub mod app;
pub mod args;
pub mod cic;
pub mod coeffs;
pub mod constants;
pub mod csr;
pub mod design;
pub mod driver;
pub mod error;
pub mod fir;
pub mod fixed;
pub mod halfband;
pub mod macc;
pub mod pipeline;
pub mod stage;
pub mod status;
