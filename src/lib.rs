//! Composite USB HID keyboard + mouse over a PIO software USB engine.
//!
//! This library holds everything that does not touch hardware, so it
//! builds and tests on the host:
//!
//! - [`descriptor`] - byte-exact device, configuration, HID report and
//!   string descriptors
//! - [`engine`] - the interface the software USB device engine provides
//! - [`service`] - device service lifecycle (init, publish, service)
//! - [`injector`] - periodic keyboard report injection
//! - [`heartbeat`] - liveness LED toggle
//! - [`schedule`] - task-to-core plan and its timing contract
//!
//! Usage: `cargo test --lib`, or `cargo test` for the integration tests.
//!
//! The firmware binary (`src/main.rs`, `embedded` feature) wires these
//! into Embassy executors on both RP2040 cores.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod heartbeat;
pub mod hid;
pub mod injector;
pub mod schedule;
pub mod service;

pub use error::{EngineInitError, Error};
