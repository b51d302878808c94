//! System configuration parameters
//!
//! All tunable timing parameters for the control core, plus the persisted
//! [`LockSettings`] subset that can change at runtime (auto-lock policy).

use serde::{Deserialize, Serialize};

/// Which device personality the firmware runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Bolt lock with two-phase (initiated → completed) actuation.
    Lock,
    /// Open/close sensor, no actuation delay.
    OpenCloseSensor,
}

/// Core application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub device_kind: DeviceKind,

    // --- Buttons ---
    /// Hold duration after which the long-press activation window opens (T1).
    pub long_press_start_ms: u32,
    /// Hold duration after which a release emits a long press (T2).
    pub long_press_complete_ms: u32,
    /// Settling time of the per-button debounce timer.
    pub button_debounce_ms: u32,

    // --- LEDs ---
    /// Symmetric blink period of every LED during the activation window.
    pub long_press_blink_ms: u32,

    // --- Device action ---
    /// Simulated bolt travel time.
    pub actuator_movement_ms: u32,
    pub auto_lock_enabled: bool,
    pub auto_lock_duration_secs: u32,

    // --- Task loop ---
    /// Upper bound the task loop waits for a first event each cycle.
    pub event_wait_quantum_ms: u32,
    /// Poll connectivity every N loop cycles.
    pub connectivity_poll_every: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_kind: DeviceKind::Lock,

            long_press_start_ms: 3000,
            long_press_complete_ms: 6000,
            button_debounce_ms: 50,

            long_press_blink_ms: 500,

            actuator_movement_ms: 2000,
            auto_lock_enabled: false,
            auto_lock_duration_secs: 0,

            event_wait_quantum_ms: 10,
            connectivity_poll_every: 1,
        }
    }
}

impl AppConfig {
    /// Defaults for the open/close sensor personality.
    pub fn open_close_sensor() -> Self {
        Self {
            device_kind: DeviceKind::OpenCloseSensor,
            connectivity_poll_every: 100,
            ..Self::default()
        }
    }

    /// Reject configurations the state machines cannot honour.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        use crate::error::Error;

        if self.long_press_start_ms >= self.long_press_complete_ms {
            return Err(Error::Config(
                "long_press_start_ms must be < long_press_complete_ms",
            ));
        }
        if self.event_wait_quantum_ms == 0 {
            return Err(Error::Config("event_wait_quantum_ms must be > 0"));
        }
        if self.actuator_movement_ms == 0 {
            return Err(Error::Config("actuator_movement_ms must be > 0"));
        }
        if self.long_press_blink_ms == 0 {
            return Err(Error::Config("long_press_blink_ms must be > 0"));
        }
        if self.connectivity_poll_every == 0 {
            return Err(Error::Config("connectivity_poll_every must be > 0"));
        }
        Ok(())
    }

    /// Overlay settings loaded from persistent storage.
    pub fn apply_settings(&mut self, settings: LockSettings) {
        self.auto_lock_enabled = settings.auto_lock_enabled;
        self.auto_lock_duration_secs = settings.auto_lock_duration_secs;
    }
}

/// Auto-lock policy as persisted in NVS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockSettings {
    pub auto_lock_enabled: bool,
    pub auto_lock_duration_secs: u32,
}
