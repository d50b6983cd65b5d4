//! Bus-agnostic core logic for the Multiservo servo controller
//!
//! This crate contains all driver logic that does not depend on a
//! specific bus implementation:
//!
//! - Transport abstraction trait (16-bit register writes)
//! - Servo channel state machine (attach / write / detach lifecycle)
//! - Pulse-width and angle conversion math
//! - Driver error taxonomy
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod traits;

pub use channel::ServoChannel;
pub use config::ServoConfig;
pub use error::Error;
pub use traits::{RegisterBus, TransportError};
