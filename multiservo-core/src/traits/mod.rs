//! Hardware abstraction traits
//!
//! These traits define the interface between the channel logic and
//! bus-specific transport implementations.

pub mod transport;

pub use transport::{RegisterBus, TransportError};
