//! Hardware-facing drivers for the Multiservo controller
//!
//! This crate provides the concrete pieces around the channel logic in
//! `multiservo-core`:
//!
//! - I2C transport adapter (`embedded-hal` bus -> register writes)
//! - Controller-level handle driving all outputs through a shared bus
//!
//! Anything implementing the `embedded-hal` 1.0 blocking I2C trait
//! works as the bus: chip HALs on MCUs, `linux-embedded-hal` on
//! single-board computers.

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod controller;

pub use bus::I2cRegisterBus;
pub use controller::Multiservo;
