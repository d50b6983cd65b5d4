//! I2C transport adapter
//!
//! Maps the register-write capability consumed by the channel logic
//! onto any bus implementing the `embedded-hal` blocking I2C trait,
//! classifying bus faults into the driver's transport error kinds.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use multiservo_core::traits::{RegisterBus, TransportError};

/// [`RegisterBus`] implementation over an `embedded-hal` I2C bus
pub struct I2cRegisterBus<I2C> {
    i2c: I2C,
}

impl<I2C> I2cRegisterBus<I2C> {
    /// Wrap an I2C bus
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the wrapped bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for I2cRegisterBus<I2C> {
    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u16,
    ) -> Result<(), TransportError> {
        // SMBus-style word write: the 16-bit value goes out low byte
        // first. Callers pre-swap values the controller wants high
        // byte first.
        let value = value.to_le_bytes();
        self.i2c
            .write(address, &[register, value[0], value[1]])
            .map_err(|err| classify(err.kind()))
    }
}

/// Sort a bus fault into the driver's closed transport error set
fn classify(kind: ErrorKind) -> TransportError {
    match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => TransportError::NackOnAddress,
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => TransportError::NackOnData,
        // Some bus drivers cannot attribute the NACK to a phase;
        // count those with the address NACKs, the more common fault.
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown) => TransportError::NackOnAddress,
        ErrorKind::Overrun => TransportError::DataTooLong,
        _ => TransportError::Bus,
    }
}
