//! Driver error taxonomy
//!
//! One closed set shared by every channel operation. Validation
//! failures (`BadPin`, `BadPulse`) are detected before any bus access
//! and never retried; transport failures are retried up to the
//! configured budget and then surfaced verbatim. Nothing in the driver
//! panics: every failure is a returned value so control loops can
//! retry safely.

use crate::traits::TransportError;

/// Errors returned by servo channel operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Payload exceeded what the device or bus driver could accept
    DataTooLong,
    /// Controller did not acknowledge its address
    NackOnAddress,
    /// Controller acknowledged its address but rejected a data byte
    NackOnData,
    /// Generic bus fault
    Transport,
    /// Pin index out of range, or operation on a detached channel
    BadPin,
    /// Calibration bound outside the accepted pulse range
    BadPulse,
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::DataTooLong => Error::DataTooLong,
            TransportError::NackOnAddress => Error::NackOnAddress,
            TransportError::NackOnData => Error::NackOnData,
            TransportError::Bus => Error::Transport,
        }
    }
}
