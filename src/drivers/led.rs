//! Single-colour indicator LED with solid and blink modes.
//!
//! The main loop calls [`Led::animate`] every cycle; the LED flips level
//! once the current phase (on or off) has lasted its configured duration.
//!
//! ## Dual-target design
//!
//! Generic over any `embedded_hal` output pin: `PinDriver` on ESP-IDF,
//! an in-memory pin on host/test.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use log::warn;

/// What an LED is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Solid(bool),
    Blink { on_ms: u32, off_ms: u32 },
}

pub struct Led<P> {
    id: u8,
    pin: P,
    on: bool,
    blink_on_ms: u32,
    blink_off_ms: u32,
    last_change: Instant,
}

impl<P: OutputPin> Led<P> {
    /// Wrap `pin`, driving it low.
    pub fn new(id: u8, pin: P) -> Self {
        let mut led = Self {
            id,
            pin,
            on: false,
            blink_on_ms: 0,
            blink_off_ms: 0,
            last_change: Instant::from_ticks(0),
        };
        led.write(false);
        led
    }

    /// Solid on / off. Cancels any blink.
    pub fn set(&mut self, on: bool, now: Instant) {
        self.blink_on_ms = 0;
        self.blink_off_ms = 0;
        self.drive(on, now);
    }

    /// Flip the level of a solid LED.
    pub fn invert(&mut self, now: Instant) {
        self.set(!self.on, now);
    }

    /// Symmetric blink.
    pub fn blink(&mut self, period_ms: u32, now: Instant) {
        self.blink_on_off(period_ms, period_ms, now);
    }

    /// Blink with distinct on / off durations.
    ///
    /// A zero duration degenerates into a solid level (on if `on_ms` is
    /// non-zero). The current level is kept; it flips at the next
    /// [`animate`](Self::animate) past the phase boundary.
    pub fn blink_on_off(&mut self, on_ms: u32, off_ms: u32, now: Instant) {
        if on_ms == 0 || off_ms == 0 {
            self.set(on_ms != 0, now);
            return;
        }
        self.blink_on_ms = on_ms;
        self.blink_off_ms = off_ms;
        self.animate(now);
    }

    /// Switch to `pattern` unless already running it.
    pub fn apply(&mut self, pattern: LedPattern, now: Instant) {
        if self.pattern() == pattern {
            return;
        }
        match pattern {
            LedPattern::Solid(on) => self.set(on, now),
            LedPattern::Blink { on_ms, off_ms } => self.blink_on_off(on_ms, off_ms, now),
        }
    }

    pub fn animate(&mut self, now: Instant) {
        if !self.is_blinking() {
            return;
        }
        let phase_ms = if self.on { self.blink_on_ms } else { self.blink_off_ms };
        if now.saturating_duration_since(self.last_change) >= Duration::from_millis(u64::from(phase_ms)) {
            self.drive(!self.on, now);
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_on_ms != 0 && self.blink_off_ms != 0
    }

    pub fn pattern(&self) -> LedPattern {
        if self.is_blinking() {
            LedPattern::Blink {
                on_ms: self.blink_on_ms,
                off_ms: self.blink_off_ms,
            }
        } else {
            LedPattern::Solid(self.on)
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    fn drive(&mut self, on: bool, now: Instant) {
        self.on = on;
        self.last_change = now;
        self.write(on);
    }

    fn write(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if let Err(e) = result {
            warn!("Led{}: pin write failed: {:?}", self.id, e);
        }
    }
}
