//! Liveness indicator: a fixed-period on/off LED toggle.

use embedded_hal::digital::OutputPin;

/// Drives one output pin as a heartbeat.
pub struct Heartbeat<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> Heartbeat<P> {
    /// Starts with the indicator off.
    pub fn new(pin: P) -> Self {
        Self { pin, lit: false }
    }

    /// Flip the indicator. Returns the new level.
    ///
    /// Pin errors are ignored; on RP2040 GPIO writes cannot fail.
    pub fn toggle(&mut self) -> bool {
        self.lit = !self.lit;
        let _ = if self.lit {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        self.lit
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
