//! Servo channel state machine
//!
//! One [`ServoChannel`] tracks the attachment lifecycle and calibration
//! of a single output pin on the controller. Commands are clamped into
//! the calibrated pulse range, deduplicated against the last commanded
//! pulse, and pushed to the bus with a bounded retry budget. The
//! channel holds no bus handle of its own: every mutating operation
//! borrows the transport, so any number of channels can share one bus
//! without extra locking.

use crate::codec;
use crate::config::{ServoConfig, PIN_INVALID, PIN_MAX, PULSE_MAX_ABSOLUTE};
use crate::error::Error;
use crate::traits::RegisterBus;

/// State of one servo output on the controller
///
/// Created detached; `attach` binds a pin and calibration, `detach`
/// parks the servo and releases the pin again. The cycle can repeat.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoChannel {
    config: ServoConfig,
    /// Output pin, `PIN_INVALID` while detached
    pin: u8,
    /// Active lower calibration bound (µs)
    min_pulse_us: u16,
    /// Active upper calibration bound (µs)
    max_pulse_us: u16,
    /// Last pulse width accepted for transmission (µs)
    last_pulse_us: u16,
}

impl Default for ServoChannel {
    fn default() -> Self {
        Self::new(ServoConfig::default())
    }
}

impl ServoChannel {
    /// Create a detached channel with the given options
    pub fn new(config: ServoConfig) -> Self {
        Self {
            config,
            pin: PIN_INVALID,
            min_pulse_us: config.min_pulse_us,
            max_pulse_us: config.max_pulse_us,
            last_pulse_us: 0,
        }
    }

    /// Get the construction options
    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Channel is currently bound to a pin
    pub fn attached(&self) -> bool {
        self.pin != PIN_INVALID
    }

    /// Pin this channel is bound to, if any
    pub fn pin(&self) -> Option<u8> {
        (self.pin != PIN_INVALID).then_some(self.pin)
    }

    /// Active lower calibration bound in microseconds
    pub fn min_pulse_us(&self) -> u16 {
        self.min_pulse_us
    }

    /// Active upper calibration bound in microseconds
    pub fn max_pulse_us(&self) -> u16 {
        self.max_pulse_us
    }

    /// Last pulse width accepted for transmission in microseconds
    pub fn last_pulse_us(&self) -> u16 {
        self.last_pulse_us
    }

    /// Bind a pin using the calibration bounds from the construction
    /// options.
    pub fn attach<B: RegisterBus>(&mut self, bus: &mut B, pin: u8) -> Result<(), Error> {
        let (min, max) = (self.config.min_pulse_us, self.config.max_pulse_us);
        self.attach_with_bounds(bus, pin, min, max)
    }

    /// Bind a pin with explicit calibration bounds.
    ///
    /// A rejected attach releases whatever pin was held before the
    /// error is returned; a bus fault while parking does not change
    /// the verdict.
    pub fn attach_with_bounds<B: RegisterBus>(
        &mut self,
        bus: &mut B,
        pin: u8,
        min_pulse_us: u16,
        max_pulse_us: u16,
    ) -> Result<(), Error> {
        if pin >= PIN_MAX {
            let _ = self.detach(bus);
            return Err(Error::BadPin);
        }
        if min_pulse_us >= PULSE_MAX_ABSOLUTE
            || max_pulse_us >= PULSE_MAX_ABSOLUTE
            || min_pulse_us > max_pulse_us
        {
            let _ = self.detach(bus);
            return Err(Error::BadPulse);
        }

        self.pin = pin;
        self.min_pulse_us = min_pulse_us;
        self.max_pulse_us = max_pulse_us;
        Ok(())
    }

    /// Command a position.
    ///
    /// Values below the lower calibration bound are interpreted as an
    /// angle in degrees; anything else is taken as a raw pulse width
    /// in microseconds. Real pulse widths start near 500 µs while
    /// angles stop at 180, so the two ranges do not overlap with sane
    /// calibration. Known limitation, kept for compatibility with
    /// existing deployments: a lower bound configured below 180 makes
    /// this discriminator misread raw pulses as angles.
    pub fn write<B: RegisterBus>(&mut self, bus: &mut B, value: i32) -> Result<(), Error> {
        let pulse_us = if value < i32::from(self.min_pulse_us) {
            codec::angle_to_pulse(value, self.min_pulse_us, self.max_pulse_us)
        } else {
            // Raw pulse width; the clamp in `write_microseconds`
            // bounds it from above.
            value.min(i32::from(u16::MAX)) as u16
        };
        self.write_microseconds(bus, pulse_us)
    }

    /// Command a raw pulse width in microseconds.
    ///
    /// The pulse is clamped into the calibrated range. Writing the
    /// value the controller already holds is a no-op that produces no
    /// bus traffic.
    pub fn write_microseconds<B: RegisterBus>(
        &mut self,
        bus: &mut B,
        pulse_us: u16,
    ) -> Result<(), Error> {
        if !self.attached() {
            return Err(Error::BadPin);
        }

        // attach guarantees min <= max
        let pulse_us = pulse_us.clamp(self.min_pulse_us, self.max_pulse_us);
        if pulse_us == self.last_pulse_us {
            return Ok(());
        }

        self.last_pulse_us = pulse_us;
        self.push_pulse(bus, pulse_us)
    }

    /// Last commanded position as an angle in degrees.
    ///
    /// Works while detached too, reporting the stale last value; a
    /// channel that never wrote reads the zero pulse back through the
    /// calibration.
    pub fn read(&self) -> i32 {
        codec::pulse_to_angle(self.last_pulse_us, self.min_pulse_us, self.max_pulse_us)
    }

    /// Park the servo and release the pin.
    ///
    /// The controller is told to stop driving the output (zero pulse,
    /// deliberately below any calibrated bound) and only then is the
    /// channel marked detached. On a bus fault the channel stays
    /// attached so the caller can detach again.
    pub fn detach<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), Error> {
        if !self.attached() {
            return Ok(());
        }

        self.push_pulse(bus, 0)?;
        self.pin = PIN_INVALID;
        Ok(())
    }

    /// Encode and transmit one pulse value, retrying on transport
    /// faults.
    fn push_pulse<B: RegisterBus>(&self, bus: &mut B, pulse_us: u16) -> Result<(), Error> {
        let encoded = codec::encode_for_wire(pulse_us);

        // A zero budget would mean never transmitting; always try once.
        let mut remaining = self.config.attempts.max(1);
        loop {
            match bus.write_register(self.config.address, self.pin, encoded) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    remaining -= 1;
                    if remaining == 0 {
                        return Err(err.into());
                    }
                    // Faults here are mostly transient electrical
                    // noise; retry immediately, no backoff.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ATTEMPTS_DEFAULT;
    use crate::traits::TransportError;
    use heapless::Vec;

    /// Bus stub recording every write attempt, failing on demand
    struct MockBus {
        writes: Vec<(u8, u8, u16), 16>,
        /// Fail this many calls before succeeding
        failures: usize,
        error: TransportError,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                failures: 0,
                error: TransportError::Bus,
            }
        }

        fn failing(error: TransportError, failures: usize) -> Self {
            Self {
                writes: Vec::new(),
                failures,
                error,
            }
        }
    }

    impl RegisterBus for MockBus {
        fn write_register(
            &mut self,
            address: u8,
            register: u8,
            value: u16,
        ) -> Result<(), TransportError> {
            self.writes.push((address, register, value)).unwrap();
            if self.failures > 0 {
                self.failures -= 1;
                return Err(self.error);
            }
            Ok(())
        }
    }

    fn attached_channel(bus: &mut MockBus) -> ServoChannel {
        let mut channel = ServoChannel::default();
        channel.attach_with_bounds(bus, 6, 490, 2400).unwrap();
        channel
    }

    #[test]
    fn test_new_channel_is_detached() {
        let channel = ServoChannel::default();

        assert!(!channel.attached());
        assert_eq!(channel.pin(), None);
        assert_eq!(channel.last_pulse_us(), 0);
    }

    #[test]
    fn test_attach_stores_pin_and_bounds() {
        let mut bus = MockBus::new();
        let channel = attached_channel(&mut bus);

        assert!(channel.attached());
        assert_eq!(channel.pin(), Some(6));
        assert_eq!(channel.min_pulse_us(), 490);
        assert_eq!(channel.max_pulse_us(), 2400);
        // Binding a pin is pure bookkeeping, nothing on the wire.
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_attach_uses_config_bounds() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::new(ServoConfig {
            min_pulse_us: 600,
            max_pulse_us: 2300,
            ..ServoConfig::default()
        });

        channel.attach(&mut bus, 3).unwrap();

        assert_eq!(channel.min_pulse_us(), 600);
        assert_eq!(channel.max_pulse_us(), 2300);
    }

    #[test]
    fn test_attach_rejects_pin_out_of_range() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::default();

        assert_eq!(channel.attach(&mut bus, 20), Err(Error::BadPin));
        assert_eq!(channel.attach(&mut bus, PIN_MAX), Err(Error::BadPin));
        assert!(!channel.attached());
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_attach_rejects_out_of_range_bounds() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::default();

        assert_eq!(
            channel.attach_with_bounds(&mut bus, 6, PULSE_MAX_ABSOLUTE, 2400),
            Err(Error::BadPulse)
        );
        assert_eq!(
            channel.attach_with_bounds(&mut bus, 6, 490, PULSE_MAX_ABSOLUTE),
            Err(Error::BadPulse)
        );
        assert!(!channel.attached());
    }

    #[test]
    fn test_attach_rejects_inverted_bounds() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::default();

        assert_eq!(
            channel.attach_with_bounds(&mut bus, 6, 2400, 490),
            Err(Error::BadPulse)
        );
        assert!(!channel.attached());
    }

    #[test]
    fn test_rejected_reattach_parks_the_old_pin() {
        let mut bus = MockBus::new();
        let mut channel = attached_channel(&mut bus);

        assert_eq!(channel.attach(&mut bus, 20), Err(Error::BadPin));

        // The failed attach released pin 6, parking it on the way out.
        assert!(!channel.attached());
        assert_eq!(bus.writes.as_slice(), &[(0x47, 6, 0)]);
    }

    #[test]
    fn test_write_angle_end_to_end() {
        let mut bus = MockBus::new();
        let mut channel = attached_channel(&mut bus);

        channel.write(&mut bus, 90).unwrap();

        // 490 + 90 * (2400 - 490) / 180 = 1445 = 0x05A5, byte-swapped
        // on the wire.
        assert_eq!(bus.writes.as_slice(), &[(0x47, 6, 0xA505)]);
        assert_eq!(channel.last_pulse_us(), 1445);
        assert_eq!(channel.read(), 90);
    }

    #[test]
    fn test_write_discriminates_angle_from_pulse() {
        let mut bus = MockBus::new();
        let mut channel = attached_channel(&mut bus);

        // 180 is below the lower bound: angle, maps to the upper bound.
        channel.write(&mut bus, 180).unwrap();
        assert_eq!(channel.last_pulse_us(), 2400);

        // 489 is still below the bound: clamped angle, stays there.
        channel.write(&mut bus, 489).unwrap();
        assert_eq!(channel.last_pulse_us(), 2400);

        // 490 and up are raw pulse widths.
        channel.write(&mut bus, 490).unwrap();
        assert_eq!(channel.last_pulse_us(), 490);
        channel.write(&mut bus, 2000).unwrap();
        assert_eq!(channel.last_pulse_us(), 2000);
    }

    #[test]
    fn test_write_when_detached() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::default();

        assert_eq!(channel.write(&mut bus, 90), Err(Error::BadPin));
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_write_microseconds_clamps_to_calibration() {
        let mut bus = MockBus::new();
        let mut channel = attached_channel(&mut bus);

        channel.write_microseconds(&mut bus, 100).unwrap();
        assert_eq!(channel.last_pulse_us(), 490);

        channel.write_microseconds(&mut bus, 10_000).unwrap();
        assert_eq!(channel.last_pulse_us(), 2400);
    }

    #[test]
    fn test_write_microseconds_suppresses_duplicate_writes() {
        let mut bus = MockBus::new();
        let mut channel = attached_channel(&mut bus);

        channel.write_microseconds(&mut bus, 1445).unwrap();
        channel.write_microseconds(&mut bus, 1445).unwrap();

        assert_eq!(bus.writes.len(), 1);

        // Values clamping onto the held pulse are duplicates too.
        channel.write_microseconds(&mut bus, 100).unwrap();
        assert_eq!(bus.writes.len(), 2);
        channel.write_microseconds(&mut bus, 50).unwrap();
        assert_eq!(bus.writes.len(), 2);
    }

    #[test]
    fn test_retry_exhaustion_returns_last_error() {
        let mut bus = MockBus::failing(TransportError::NackOnData, usize::MAX);
        let mut channel = attached_channel(&mut bus);

        let result = channel.write_microseconds(&mut bus, 1445);

        assert_eq!(result, Err(Error::NackOnData));
        assert_eq!(bus.writes.len(), usize::from(ATTEMPTS_DEFAULT));
    }

    #[test]
    fn test_retry_stops_on_first_success() {
        let mut bus = MockBus::failing(TransportError::Bus, 2);
        let mut channel = attached_channel(&mut bus);

        channel.write_microseconds(&mut bus, 1445).unwrap();

        assert_eq!(bus.writes.len(), 3);
    }

    #[test]
    fn test_zero_attempt_budget_still_tries_once() {
        let mut bus = MockBus::failing(TransportError::Bus, usize::MAX);
        let mut channel = ServoChannel::new(ServoConfig {
            attempts: 0,
            ..ServoConfig::default()
        });
        channel.attach_with_bounds(&mut bus, 6, 490, 2400).unwrap();

        assert_eq!(
            channel.write_microseconds(&mut bus, 1445),
            Err(Error::Transport)
        );
        assert_eq!(bus.writes.len(), 1);
    }

    #[test]
    fn test_detach_parks_servo_and_releases_pin() {
        let mut bus = MockBus::new();
        let mut channel = attached_channel(&mut bus);
        channel.write(&mut bus, 90).unwrap();

        channel.detach(&mut bus).unwrap();

        assert!(!channel.attached());
        assert_eq!(bus.writes.last(), Some(&(0x47, 6, 0)));
        // Subsequent writes are refused until the next attach.
        assert_eq!(channel.write(&mut bus, 45), Err(Error::BadPin));
        // The stale position is still readable.
        assert_eq!(channel.read(), 90);
    }

    #[test]
    fn test_detach_when_detached_is_a_noop() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::default();

        channel.detach(&mut bus).unwrap();

        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_failed_detach_keeps_channel_attached() {
        let mut bus = MockBus::failing(TransportError::Bus, usize::from(ATTEMPTS_DEFAULT));
        let mut channel = attached_channel(&mut bus);

        assert_eq!(channel.detach(&mut bus), Err(Error::Transport));
        assert!(channel.attached());

        // The fault cleared; detaching again succeeds.
        channel.detach(&mut bus).unwrap();
        assert!(!channel.attached());
    }

    #[test]
    fn test_custom_address_used_on_wire() {
        let mut bus = MockBus::new();
        let mut channel = ServoChannel::new(ServoConfig::with_address(0x48));
        channel.attach(&mut bus, 2).unwrap();

        channel.write(&mut bus, 90).unwrap();

        assert_eq!(bus.writes.len(), 1);
        assert_eq!(bus.writes[0].0, 0x48);
    }
}
