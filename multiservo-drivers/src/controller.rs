//! Controller-level driver
//!
//! [`Multiservo`] is the ready-made handle for one controller board:
//! it owns the I2C bus adapter plus one channel per output pin and
//! dispatches per-pin commands. Standalone [`ServoChannel`]s remain
//! available for callers that manage the bus themselves.

use embedded_hal::i2c::I2c;
use multiservo_core::channel::ServoChannel;
use multiservo_core::config::{ServoConfig, PIN_MAX};
use multiservo_core::error::Error;

use crate::bus::I2cRegisterBus;

/// All servo outputs of one controller board behind a shared bus
pub struct Multiservo<I2C> {
    bus: I2cRegisterBus<I2C>,
    channels: [ServoChannel; PIN_MAX as usize],
}

impl<I2C: I2c> Multiservo<I2C> {
    /// Create a driver with default options on every channel
    pub fn new(i2c: I2C) -> Self {
        Self::with_config(i2c, ServoConfig::default())
    }

    /// Create a driver seeding every channel with the given options
    pub fn with_config(i2c: I2C, config: ServoConfig) -> Self {
        Self {
            bus: I2cRegisterBus::new(i2c),
            channels: core::array::from_fn(|_| ServoChannel::new(config)),
        }
    }

    /// Bind a pin using the configured default calibration bounds
    pub fn attach(&mut self, pin: u8) -> Result<(), Error> {
        let (channel, bus) = self.parts(pin)?;
        channel.attach(bus, pin)
    }

    /// Bind a pin with explicit calibration bounds
    pub fn attach_with_bounds(
        &mut self,
        pin: u8,
        min_pulse_us: u16,
        max_pulse_us: u16,
    ) -> Result<(), Error> {
        let (channel, bus) = self.parts(pin)?;
        channel.attach_with_bounds(bus, pin, min_pulse_us, max_pulse_us)
    }

    /// Command a position (angle in degrees, or raw pulse width)
    pub fn write(&mut self, pin: u8, value: i32) -> Result<(), Error> {
        let (channel, bus) = self.parts(pin)?;
        channel.write(bus, value)
    }

    /// Command a raw pulse width in microseconds
    pub fn write_microseconds(&mut self, pin: u8, pulse_us: u16) -> Result<(), Error> {
        let (channel, bus) = self.parts(pin)?;
        channel.write_microseconds(bus, pulse_us)
    }

    /// Last commanded position of a pin as an angle in degrees
    pub fn read(&self, pin: u8) -> Result<i32, Error> {
        self.channels
            .get(usize::from(pin))
            .map(ServoChannel::read)
            .ok_or(Error::BadPin)
    }

    /// Park the servo on `pin` and release it
    pub fn detach(&mut self, pin: u8) -> Result<(), Error> {
        let (channel, bus) = self.parts(pin)?;
        channel.detach(bus)
    }

    /// Park every attached output.
    ///
    /// Keeps going past bus faults so one bad output does not leave
    /// the rest powered; the first fault is reported after all pins
    /// were tried.
    pub fn detach_all(&mut self) -> Result<(), Error> {
        let mut result = Ok(());
        for channel in self.channels.iter_mut() {
            if let Err(err) = channel.detach(&mut self.bus) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Inspect the state of one channel
    pub fn channel(&self, pin: u8) -> Option<&ServoChannel> {
        self.channels.get(usize::from(pin))
    }

    /// Give the wrapped bus back
    pub fn release(self) -> I2C {
        self.bus.release()
    }

    fn parts(&mut self, pin: u8) -> Result<(&mut ServoChannel, &mut I2cRegisterBus<I2C>), Error> {
        match self.channels.get_mut(usize::from(pin)) {
            Some(channel) => Ok((channel, &mut self.bus)),
            None => Err(Error::BadPin),
        }
    }
}
