//! Bus transport abstraction
//!
//! The channel logic needs exactly one capability from the bus: write a
//! 16-bit value to a register on an addressed device. Implementations
//! live in `multiservo-drivers` (or in application code for custom
//! buses and test doubles).

/// Faults reported by a register-write transport
///
/// These are the kinds the channel retry loop can observe. Validation
/// failures never reach the transport and are not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Payload exceeded what the device or bus driver could accept
    DataTooLong,
    /// Device did not acknowledge its address
    NackOnAddress,
    /// Device acknowledged the address but rejected a data byte
    NackOnData,
    /// Any other bus fault (arbitration loss, electrical noise, ...)
    Bus,
}

/// Register-write capability of the controller bus
pub trait RegisterBus {
    /// Write a 16-bit value to `register` on the device at `address`.
    ///
    /// The value is transmitted exactly as given; the caller is
    /// responsible for any byte-order adjustment the device expects.
    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u16,
    ) -> Result<(), TransportError>;
}
