//! Configuration type definitions
//!
//! Protocol constants of the controller plus the construction-time
//! options recognized per channel. There is no persistence layer:
//! calibration lives for the lifetime of the channel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default I2C address of the PWM controller
pub const DEFAULT_ADDRESS: u8 = 0x47;

/// Default lower calibration bound in microseconds
pub const PULSE_MIN_DEFAULT: u16 = 490;

/// Default upper calibration bound in microseconds
pub const PULSE_MAX_DEFAULT: u16 = 2400;

/// Hard upper bound for any configured pulse width in microseconds
pub const PULSE_MAX_ABSOLUTE: u16 = 19_000;

/// Upper end of the commanded angle range in degrees (lower end is 0)
pub const ANGLE_MAX: i32 = 180;

/// Default per-write retry budget for bus transactions
pub const ATTEMPTS_DEFAULT: u8 = 4;

/// Pin value marking a channel as unattached
pub const PIN_INVALID: u8 = 0xFF;

/// Number of servo outputs on the controller; valid pins are below this
pub const PIN_MAX: u8 = 18;

/// Per-channel construction options
///
/// The bounds given here are what `attach` falls back to when the
/// caller does not provide an explicit calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoConfig {
    /// I2C address of the controller this channel talks to
    pub address: u8,
    /// Retry budget for each register write; treated as at least one
    pub attempts: u8,
    /// Default lower calibration bound (µs)
    pub min_pulse_us: u16,
    /// Default upper calibration bound (µs)
    pub max_pulse_us: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            attempts: ATTEMPTS_DEFAULT,
            min_pulse_us: PULSE_MIN_DEFAULT,
            max_pulse_us: PULSE_MAX_DEFAULT,
        }
    }
}

impl ServoConfig {
    /// Options for a controller strapped to a non-default address
    pub fn with_address(address: u8) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }
}
